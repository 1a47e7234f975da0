// Display precision per metric kind, plus the thousands-separated string
// helpers used by the terminal output.
use num_format::{Locale, ToFormattedString};
use serde::Serialize;
use std::convert::Infallible;
use std::str::FromStr;

/// How a metric should be rounded for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum MetricKind {
    Percentage,
    Decimal,
    Whole,
    Index,
    Currency,
    Hours,
    /// Anything unrecognized; rounds to 2 decimals.
    Other,
}

impl MetricKind {
    pub fn decimals(self) -> usize {
        match self {
            MetricKind::Percentage | MetricKind::Hours => 1,
            MetricKind::Decimal => 3,
            MetricKind::Whole | MetricKind::Currency => 0,
            MetricKind::Index | MetricKind::Other => 2,
        }
    }
}

impl FromStr for MetricKind {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s.trim().to_ascii_lowercase().as_str() {
            "percentage" => MetricKind::Percentage,
            "decimal" => MetricKind::Decimal,
            "whole" => MetricKind::Whole,
            "index" => MetricKind::Index,
            "currency" => MetricKind::Currency,
            "hours" => MetricKind::Hours,
            _ => MetricKind::Other,
        })
    }
}

/// Round `value` to the precision of `kind`.
///
/// Rounding works on the exact binary value and breaks exact ties to the
/// even digit, so `12.25` becomes `12.2` and `4.35` (stored just below)
/// becomes `4.3`. NaN and infinities pass through unchanged.
pub fn round_metric(value: f64, kind: MetricKind) -> f64 {
    round_half_even(value, kind.decimals())
}

fn round_half_even(value: f64, decimals: usize) -> f64 {
    if !value.is_finite() {
        return value;
    }
    // Fixed-precision formatting is correctly rounded with ties to even.
    format!("{:.*}", decimals, value).parse().unwrap_or(value)
}

/// Rounded value rendered with the unit conventions of its kind,
/// e.g. `12.4%`, `$1,235`, `1,250.5 hrs`.
pub fn format_metric(value: f64, kind: MetricKind) -> String {
    let v = round_metric(value, kind);
    match kind {
        MetricKind::Percentage => format!("{}%", format_number(v, 1)),
        MetricKind::Currency => {
            let s = format_number(v.abs(), 0);
            if v < 0.0 {
                format!("-${}", s)
            } else {
                format!("${}", s)
            }
        }
        MetricKind::Hours => format!("{} hrs", format_number(v, 1)),
        other => format_number(v, other.decimals()),
    }
}

/// `n` with `decimals` fixed places and en-locale grouping, e.g.
/// `1,234,567.89`. Non-finite values render as `NaN`, `inf` or `-inf`.
pub fn format_number(n: f64, decimals: usize) -> String {
    if !n.is_finite() {
        return n.to_string();
    }
    let fixed = format!("{:.*}", decimals, n.abs());
    let (digits, frac) = match fixed.split_once('.') {
        Some((digits, frac)) => (digits, Some(frac)),
        None => (fixed.as_str(), None),
    };
    // Past u128 the digits stay ungrouped.
    let mut out = digits
        .parse::<u128>()
        .map(|d| d.to_formatted_string(&Locale::en))
        .unwrap_or_else(|_| digits.to_string());
    if let Some(frac) = frac {
        out.push('.');
        out.push_str(frac);
    }
    // No sign on values that print as zero.
    if n.is_sign_negative() && fixed.bytes().any(|b| b != b'0' && b != b'.') {
        out.insert(0, '-');
    }
    out
}

pub fn format_int<T>(n: T) -> String
where
    T: ToFormattedString,
{
    n.to_formatted_string(&Locale::en)
}
