use crate::aggregate::{monthly_series, AggOp};
use crate::error::Result;
use crate::format::{round_metric, MetricKind};
use crate::types::{MetricTable, Month};
use serde::Serialize;

/// Latest monthly value and its change against the month before, or an
/// explicit marker when there is no previous month to compare with.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum TrendResult {
    Change {
        latest: f64,
        previous: f64,
        change_percent: f64,
    },
    InsufficientData,
}

impl TrendResult {
    pub fn latest(&self) -> Option<f64> {
        match self {
            TrendResult::Change { latest, .. } => Some(*latest),
            TrendResult::InsufficientData => None,
        }
    }

    pub fn change_percent(&self) -> Option<f64> {
        match self {
            TrendResult::Change { change_percent, .. } => Some(*change_percent),
            TrendResult::InsufficientData => None,
        }
    }

    /// `+4.3% vs last month`, or `No data` when there is no history.
    pub fn label(&self) -> String {
        match self.change_percent() {
            Some(change) => format!(
                "{:+.1}% vs last month",
                round_metric(change, MetricKind::Percentage)
            ),
            None => "No data".to_string(),
        }
    }
}

/// `(latest - previous) / |previous| * 100`, with a zero previous value
/// defined as no change.
pub fn percent_change(previous: f64, latest: f64) -> f64 {
    if previous == 0.0 {
        0.0
    } else {
        (latest - previous) / previous.abs() * 100.0
    }
}

/// Trend over an already aggregated monthly series (ascending by month).
pub fn series_trend(series: &[(Month, f64)]) -> TrendResult {
    match series {
        [.., (_, previous), (_, latest)] => TrendResult::Change {
            latest: *latest,
            previous: *previous,
            change_percent: percent_change(*previous, *latest),
        },
        _ => TrendResult::InsufficientData,
    }
}

/// Month-over-month change of `measure`.
///
/// Rows are first averaged per month, even for measures that are summed for
/// display, and the last two months are compared.
pub fn month_over_month(table: &MetricTable, measure: &str) -> Result<TrendResult> {
    table.schema().require_measure(measure)?;
    if table.len() < 2 {
        return Ok(TrendResult::InsufficientData);
    }
    let series = monthly_series(table, measure, AggOp::Mean)?;
    Ok(series_trend(&series))
}
