// Dashboard pages as pure functions of (page, datasets, selection).
//
// Each page is rebuilt from scratch on every call: filter the tables it
// needs, aggregate, compute trends, round. No page keeps state between calls.
use crate::aggregate::{
    aggregate, coverage, flag_count, flag_share, group_and_aggregate, group_flag_counts,
    monthly_flag_counts, monthly_series, AggOp, SortOrder,
};
use crate::error::{KpiError, Result};
use crate::filter::{filter, FilterSelection};
use crate::format::{round_metric, MetricKind};
use crate::schema::columns::*;
use crate::schema::Dataset;
use crate::source::Datasets;
use crate::trend::{month_over_month, series_trend, TrendResult};
use crate::types::{MetricTable, Month};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

const AT_RISK: &str = "Yes";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum Page {
    #[default]
    Main,
    CostEfficiency,
    ExecutionResilience,
    WorkforceProductivity,
}

impl Page {
    pub const ALL: [Page; 4] = [
        Page::Main,
        Page::CostEfficiency,
        Page::ExecutionResilience,
        Page::WorkforceProductivity,
    ];

    pub fn slug(self) -> &'static str {
        match self {
            Page::Main => "main",
            Page::CostEfficiency => "cost-efficiency",
            Page::ExecutionResilience => "execution-resilience",
            Page::WorkforceProductivity => "workforce-productivity",
        }
    }

    pub fn title(self) -> &'static str {
        match self {
            Page::Main => "COO Operational Dashboard",
            Page::CostEfficiency => "Cost & Efficiency - Deep Dive",
            Page::ExecutionResilience => "Execution & Resilience - Deep Dive",
            Page::WorkforceProductivity => "Workforce & Productivity - Deep Dive",
        }
    }

    /// Datasets whose filtered rows back this page (also what gets exported).
    pub fn datasets(self) -> &'static [Dataset] {
        match self {
            Page::Main => &[
                Dataset::ProcessRework,
                Dataset::AutomationRoi,
                Dataset::DigitalIndex,
                Dataset::FtrRate,
                Dataset::Adherence,
                Dataset::Resilience,
                Dataset::Escalation,
                Dataset::Capacity,
                Dataset::WorkModels,
                Dataset::ModelAccuracy,
            ],
            Page::CostEfficiency => &[
                Dataset::ProcessRework,
                Dataset::AutomationRoi,
                Dataset::DigitalIndex,
                Dataset::WorkModels,
                Dataset::RoleVsReality,
            ],
            Page::ExecutionResilience => &[
                Dataset::FtrRate,
                Dataset::Resilience,
                Dataset::Adherence,
                Dataset::Escalation,
            ],
            Page::WorkforceProductivity => &[
                Dataset::Capacity,
                Dataset::WorkModels,
                Dataset::ModelAccuracy,
                Dataset::Collaboration,
            ],
        }
    }
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for Page {
    type Err = KpiError;

    fn from_str(s: &str) -> Result<Self> {
        let s = s.trim().to_ascii_lowercase().replace('_', "-");
        Page::ALL
            .iter()
            .copied()
            .find(|p| p.slug() == s)
            .ok_or_else(|| KpiError::Config(format!("unknown page `{}`", s)))
    }
}

/// A headline value with its month-over-month trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KpiCard {
    pub label: String,
    pub value: f64,
    pub kind: MetricKind,
    pub trend: TrendResult,
}

impl KpiCard {
    fn new(label: &str, value: f64, kind: MetricKind, trend: TrendResult) -> Self {
        KpiCard {
            label: label.to_string(),
            value: round_metric(value, kind),
            kind,
            trend,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BreakdownRow {
    pub group: String,
    pub value: f64,
}

/// A grouped breakdown, already sorted and truncated (bar-chart input).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Breakdown {
    pub title: String,
    pub kind: MetricKind,
    pub rows: Vec<BreakdownRow>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeriesPoint {
    pub month: Month,
    pub value: f64,
}

/// Per-month values, ascending (sparkline / trend-chart input).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Series {
    pub title: String,
    pub kind: MetricKind,
    pub points: Vec<SeriesPoint>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Section {
    pub title: String,
    pub cards: Vec<KpiCard>,
    pub breakdowns: Vec<Breakdown>,
    pub series: Vec<Series>,
}

impl Section {
    fn new(title: &str) -> Self {
        Section {
            title: title.to_string(),
            ..Section::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageReport {
    pub page: Page,
    pub title: String,
    pub sections: Vec<Section>,
}

/// Build the report for `page` from the current selection.
pub fn render_page(page: Page, datasets: &Datasets, selection: &FilterSelection) -> Result<PageReport> {
    let ctx = Ctx { datasets, selection };
    let sections = match page {
        Page::Main => main_page(&ctx)?,
        Page::CostEfficiency => cost_efficiency(&ctx)?,
        Page::ExecutionResilience => execution_resilience(&ctx)?,
        Page::WorkforceProductivity => workforce_productivity(&ctx)?,
    };
    Ok(PageReport {
        page,
        title: page.title().to_string(),
        sections,
    })
}

struct Ctx<'a> {
    datasets: &'a Datasets,
    selection: &'a FilterSelection,
}

impl Ctx<'_> {
    fn filtered(&self, dataset: Dataset) -> Result<MetricTable> {
        Ok(filter(self.datasets.table(dataset)?, self.selection))
    }
}

fn mean_card(label: &str, table: &MetricTable, measure: &str, kind: MetricKind) -> Result<KpiCard> {
    Ok(KpiCard::new(
        label,
        aggregate(table, measure, AggOp::Mean)?,
        kind,
        month_over_month(table, measure)?,
    ))
}

fn series(title: &str, table: &MetricTable, measure: &str, op: AggOp, kind: MetricKind) -> Result<Series> {
    Ok(Series {
        title: title.to_string(),
        kind,
        points: monthly_series(table, measure, op)?
            .into_iter()
            .map(|(month, value)| SeriesPoint { month, value })
            .collect(),
    })
}

fn breakdown(
    title: &str,
    table: &MetricTable,
    group_columns: &[&str],
    measure: &str,
    op: AggOp,
    kind: MetricKind,
    top_n: Option<usize>,
) -> Result<Breakdown> {
    let rows = group_and_aggregate(table, group_columns, measure, op, SortOrder::Descending, top_n)?
        .into_iter()
        .map(|(key, value)| BreakdownRow {
            group: key.to_string(),
            value: round_metric(value, kind),
        })
        .collect();
    Ok(Breakdown {
        title: title.to_string(),
        kind,
        rows,
    })
}

fn main_page(ctx: &Ctx) -> Result<Vec<Section>> {
    use MetricKind::*;

    let rework = ctx.filtered(Dataset::ProcessRework)?;
    let auto = ctx.filtered(Dataset::AutomationRoi)?;
    let digital = ctx.filtered(Dataset::DigitalIndex)?;
    let auto_total = ctx.datasets.table(Dataset::AutomationRoi)?.len();

    let mut cost = Section::new("Cost & Efficiency");
    cost.cards.push(mean_card("Rework Cost %", &rework, REWORK_COST_PCT, Percentage)?);
    cost.cards.push(mean_card("Automation ROI", &auto, ROI_PCT_6M, Whole)?);
    cost.cards.push(KpiCard::new(
        "Automation Coverage",
        coverage(auto.len(), auto_total),
        Percentage,
        TrendResult::InsufficientData,
    ));
    cost.cards.push(mean_card("Friction Index", &digital, FRICTION_INDEX, Index)?);
    cost.series.push(series("Rework Cost %", &rework, REWORK_COST_PCT, AggOp::Mean, Percentage)?);
    cost.series.push(series("Automation ROI", &auto, ROI_PCT_6M, AggOp::Mean, Whole)?);
    cost.series.push(series("Friction Index", &digital, FRICTION_INDEX, AggOp::Mean, Index)?);

    let ftr = ctx.filtered(Dataset::FtrRate)?;
    let adherence = ctx.filtered(Dataset::Adherence)?;
    let resilience = ctx.filtered(Dataset::Resilience)?;
    let escalation = ctx.filtered(Dataset::Escalation)?;

    let mut exec = Section::new("Execution & Resilience");
    exec.cards.push(mean_card("First Time Right", &ftr, FTR_RATE_PCT, Percentage)?);
    exec.cards.push(mean_card("Process Adherence", &adherence, ADHERENCE_RATE_PCT, Percentage)?);
    exec.cards.push(mean_card("Resilience Score", &resilience, RESILIENCE_SCORE, Index)?);
    exec.cards.push(KpiCard::new(
        "Escalations",
        aggregate(&escalation, STEP_EXCEPTION_COUNT, AggOp::Sum)?,
        Whole,
        month_over_month(&escalation, STEP_EXCEPTION_COUNT)?,
    ));
    exec.series.push(series("First Time Right", &ftr, FTR_RATE_PCT, AggOp::Mean, Percentage)?);
    exec.series.push(series(
        "Process Adherence",
        &adherence,
        ADHERENCE_RATE_PCT,
        AggOp::Mean,
        Percentage,
    )?);
    exec.series.push(series("Resilience Score", &resilience, RESILIENCE_SCORE, AggOp::Mean, Index)?);
    exec.series.push(series("Escalations", &escalation, STEP_EXCEPTION_COUNT, AggOp::Sum, Whole)?);

    let work = ctx.filtered(Dataset::WorkModels)?;
    let capacity = ctx.filtered(Dataset::Capacity)?;
    let model = ctx.filtered(Dataset::ModelAccuracy)?;

    let at_risk_by_month = monthly_flag_counts(&capacity, BURNOUT_RISK_FLAG, AT_RISK)?;
    let mut workforce = Section::new("Workforce & Productivity");
    workforce.cards.push(mean_card("Output per FTE", &work, OUTPUT_PER_HOUR, Decimal)?);
    workforce.cards.push(mean_card(
        "Capacity Utilization",
        &capacity,
        CAPACITY_UTILIZATION_PCT,
        Percentage,
    )?);
    workforce.cards.push(KpiCard::new(
        "Burnout Risk",
        flag_count(&capacity, BURNOUT_RISK_FLAG, AT_RISK)? as f64,
        Whole,
        TrendResult::InsufficientData,
    ));
    workforce.cards.push(mean_card(
        "Model Accuracy",
        &model,
        FORECAST_ACCURACY_PCT,
        Percentage,
    )?);
    workforce.series.push(series("Output per FTE", &work, OUTPUT_PER_HOUR, AggOp::Mean, Decimal)?);
    workforce.series.push(series(
        "Capacity Utilization",
        &capacity,
        CAPACITY_UTILIZATION_PCT,
        AggOp::Mean,
        Percentage,
    )?);
    workforce.series.push(Series {
        title: "Burnout Risk".to_string(),
        kind: Whole,
        points: at_risk_by_month
            .into_iter()
            .map(|(month, n)| SeriesPoint { month, value: n as f64 })
            .collect(),
    });
    workforce.series.push(series(
        "Model Accuracy",
        &model,
        FORECAST_ACCURACY_PCT,
        AggOp::Mean,
        Percentage,
    )?);

    Ok(vec![cost, exec, workforce])
}

fn cost_efficiency(ctx: &Ctx) -> Result<Vec<Section>> {
    use MetricKind::*;

    let rework = ctx.filtered(Dataset::ProcessRework)?;
    let auto = ctx.filtered(Dataset::AutomationRoi)?;
    let digital = ctx.filtered(Dataset::DigitalIndex)?;
    let role = ctx.filtered(Dataset::RoleVsReality)?;
    let work = ctx.filtered(Dataset::WorkModels)?;

    let mut rework_section = Section::new("Process Rework Cost");
    rework_section.cards.push(mean_card("Rework Cost %", &rework, REWORK_COST_PCT, Percentage)?);
    rework_section.cards.push(KpiCard::new(
        "Total Rework $",
        aggregate(&rework, REWORK_COST_DOLLARS, AggOp::Sum)?,
        Currency,
        month_over_month(&rework, REWORK_COST_DOLLARS)?,
    ));
    rework_section.breakdowns.push(breakdown(
        "Rework Cost by Process",
        &rework,
        &[PROCESS_NAME],
        REWORK_COST_DOLLARS,
        AggOp::Sum,
        Currency,
        Some(6),
    )?);
    if rework.schema().has_dimension(DEPARTMENT) {
        rework_section.breakdowns.push(breakdown(
            "Rework Cost by Department",
            &rework,
            &[DEPARTMENT],
            REWORK_COST_DOLLARS,
            AggOp::Sum,
            Currency,
            None,
        )?);
    }

    let mut auto_section = Section::new("Automation ROI");
    auto_section.cards.push(mean_card("Automation ROI", &auto, ROI_PCT_6M, Whole)?);
    if auto.schema().has_measure(TIME_SAVINGS_HOURS) {
        auto_section.cards.push(KpiCard::new(
            "Time Savings",
            aggregate(&auto, TIME_SAVINGS_HOURS, AggOp::Sum)?,
            Hours,
            month_over_month(&auto, TIME_SAVINGS_HOURS)?,
        ));
        auto_section
            .series
            .push(series("Time Savings", &auto, TIME_SAVINGS_HOURS, AggOp::Sum, Hours)?);
    }
    auto_section.series.push(series("Automation ROI", &auto, ROI_PCT_6M, AggOp::Mean, Whole)?);
    let roi_by = if auto.schema().has_dimension(TASK_TYPE) { TASK_TYPE } else { PROCESS_NAME };
    auto_section.breakdowns.push(breakdown(
        "ROI by Task",
        &auto,
        &[roi_by],
        ROI_PCT_6M,
        AggOp::Mean,
        Whole,
        Some(6),
    )?);

    let mut friction_section = Section::new("Digital Friction");
    friction_section.cards.push(mean_card("Friction Index", &digital, FRICTION_INDEX, Index)?);
    let schema = digital.schema();
    if schema.has_dimension(DEPARTMENT) && schema.has_dimension(PROCESS) {
        friction_section.breakdowns.push(breakdown(
            "Friction by Department & Process",
            &digital,
            &[DEPARTMENT, PROCESS],
            FRICTION_INDEX,
            AggOp::Mean,
            Index,
            Some(8),
        )?);
    } else if schema.has_dimension(DEPARTMENT) {
        friction_section.breakdowns.push(breakdown(
            "Friction by Department",
            &digital,
            &[DEPARTMENT],
            FRICTION_INDEX,
            AggOp::Mean,
            Index,
            None,
        )?);
    }
    friction_section
        .series
        .push(series("Friction Index", &digital, FRICTION_INDEX, AggOp::Mean, Index)?);

    let mut work_section = Section::new("Work Models & Role Reality");
    work_section.breakdowns.push(breakdown(
        "Output by Work Model",
        &work,
        &[WORK_MODEL],
        OUTPUT_PER_HOUR,
        AggOp::Mean,
        Decimal,
        None,
    )?);
    work_section.cards.push(mean_card(
        "Low-Value Work %",
        &role,
        LOW_VALUE_WORK_PCT,
        Percentage,
    )?);
    work_section.series.push(series(
        "Low-Value Work %",
        &role,
        LOW_VALUE_WORK_PCT,
        AggOp::Mean,
        Percentage,
    )?);
    work_section.breakdowns.push(breakdown(
        "Opportunity Cost by Role",
        &role,
        &[ROLE],
        OPPORTUNITY_COST,
        AggOp::Sum,
        Currency,
        Some(6),
    )?);

    Ok(vec![rework_section, auto_section, friction_section, work_section])
}

fn execution_resilience(ctx: &Ctx) -> Result<Vec<Section>> {
    use MetricKind::*;

    let ftr = ctx.filtered(Dataset::FtrRate)?;
    let resilience = ctx.filtered(Dataset::Resilience)?;
    let adherence = ctx.filtered(Dataset::Adherence)?;
    let escalation = ctx.filtered(Dataset::Escalation)?;

    let mut ftr_section = Section::new("First Time Right");
    ftr_section.cards.push(mean_card("FTR Rate", &ftr, FTR_RATE_PCT, Percentage)?);
    ftr_section.series.push(series("FTR Trend", &ftr, FTR_RATE_PCT, AggOp::Mean, Percentage)?);
    if ftr.schema().has_dimension(DEPARTMENT) {
        ftr_section.breakdowns.push(breakdown(
            "FTR by Department",
            &ftr,
            &[DEPARTMENT],
            FTR_RATE_PCT,
            AggOp::Mean,
            Percentage,
            None,
        )?);
    }

    let mut res_section = Section::new("Operational Resilience");
    res_section.cards.push(mean_card("Resilience Score", &resilience, RESILIENCE_SCORE, Index)?);
    res_section.breakdowns.push(if resilience.schema().has_dimension(DEPARTMENT) {
        breakdown(
            "Risk by Task & Department",
            &resilience,
            &[CRITICAL_TASK, DEPARTMENT],
            RISK_PCT,
            AggOp::Mean,
            Percentage,
            Some(8),
        )?
    } else {
        breakdown(
            "Risk by Task",
            &resilience,
            &[CRITICAL_TASK],
            RISK_PCT,
            AggOp::Mean,
            Percentage,
            Some(6),
        )?
    });
    res_section.series.push(series(
        "Resilience Trend",
        &resilience,
        RESILIENCE_SCORE,
        AggOp::Mean,
        Index,
    )?);

    let mut adh_section = Section::new("Process Adherence");
    adh_section.cards.push(mean_card(
        "Adherence Rate",
        &adherence,
        ADHERENCE_RATE_PCT,
        Percentage,
    )?);
    if adherence.schema().has_dimension(DEPARTMENT) {
        adh_section.breakdowns.push(breakdown(
            "Adherence by Department",
            &adherence,
            &[DEPARTMENT],
            ADHERENCE_RATE_PCT,
            AggOp::Mean,
            Percentage,
            None,
        )?);
    }
    if adherence.schema().has_dimension(PROCESS_STEP) {
        adh_section.breakdowns.push(breakdown(
            "Adherence by Process Step",
            &adherence,
            &[PROCESS_STEP],
            ADHERENCE_RATE_PCT,
            AggOp::Mean,
            Percentage,
            None,
        )?);
    }
    adh_section.series.push(series(
        "Adherence Trend",
        &adherence,
        ADHERENCE_RATE_PCT,
        AggOp::Mean,
        Percentage,
    )?);

    let mut esc_section = Section::new("Escalations & Exceptions");
    esc_section.cards.push(KpiCard::new(
        "Total Escalations",
        aggregate(&escalation, STEP_EXCEPTION_COUNT, AggOp::Sum)?,
        Whole,
        month_over_month(&escalation, STEP_EXCEPTION_COUNT)?,
    ));
    esc_section.breakdowns.push(breakdown(
        "Escalations by Process",
        &escalation,
        &[PROCESS],
        STEP_EXCEPTION_COUNT,
        AggOp::Sum,
        Whole,
        Some(6),
    )?);
    if escalation.schema().has_dimension(DEPARTMENT) {
        esc_section.breakdowns.push(breakdown(
            "Escalations by Department",
            &escalation,
            &[DEPARTMENT],
            STEP_EXCEPTION_COUNT,
            AggOp::Sum,
            Whole,
            None,
        )?);
    }

    Ok(vec![ftr_section, res_section, adh_section, esc_section])
}

fn workforce_productivity(ctx: &Ctx) -> Result<Vec<Section>> {
    use MetricKind::*;

    let capacity = ctx.filtered(Dataset::Capacity)?;
    let work = ctx.filtered(Dataset::WorkModels)?;
    let model = ctx.filtered(Dataset::ModelAccuracy)?;
    let collab = ctx.filtered(Dataset::Collaboration)?;
    let has_department = |t: &MetricTable| t.schema().has_dimension(DEPARTMENT);

    let mut output = Section::new("Output & Productivity per FTE");
    output.cards.push(mean_card("Output/FTE", &work, OUTPUT_PER_HOUR, Decimal)?);
    if has_department(&work) {
        output.breakdowns.push(breakdown(
            "Output by Department",
            &work,
            &[DEPARTMENT],
            OUTPUT_PER_HOUR,
            AggOp::Mean,
            Decimal,
            None,
        )?);
    }
    output.series.push(series("Output Trend", &work, OUTPUT_PER_HOUR, AggOp::Mean, Decimal)?);

    let mut cap = Section::new("Capacity Utilization & Workload");
    cap.cards.push(mean_card(
        "Capacity %",
        &capacity,
        CAPACITY_UTILIZATION_PCT,
        Percentage,
    )?);
    if has_department(&capacity) {
        cap.breakdowns.push(breakdown(
            "Utilization by Department",
            &capacity,
            &[DEPARTMENT],
            CAPACITY_UTILIZATION_PCT,
            AggOp::Mean,
            Percentage,
            None,
        )?);
    }
    cap.series.push(series(
        "Capacity Trend",
        &capacity,
        CAPACITY_UTILIZATION_PCT,
        AggOp::Mean,
        Percentage,
    )?);

    let mut accuracy = Section::new("Capacity Model Accuracy");
    accuracy.cards.push(mean_card(
        "Model Accuracy",
        &model,
        FORECAST_ACCURACY_PCT,
        Percentage,
    )?);
    if has_department(&model) {
        accuracy.breakdowns.push(breakdown(
            "Accuracy by Department",
            &model,
            &[DEPARTMENT],
            FORECAST_ACCURACY_PCT,
            AggOp::Mean,
            Percentage,
            None,
        )?);
    }
    accuracy.series.push(if model.schema().has_measure(STAFFING_VARIANCE_PCT) {
        series(
            "Staffing Variance",
            &model,
            STAFFING_VARIANCE_PCT,
            AggOp::Mean,
            Percentage,
        )?
    } else {
        series(
            "Accuracy Trend",
            &model,
            FORECAST_ACCURACY_PCT,
            AggOp::Mean,
            Percentage,
        )?
    });

    let mut health = Section::new("Employee Health & At-Risk Employees");
    // Months with rows but no flags count as 0, so the trend compares
    // adjacent months of the selection.
    let flagged: BTreeMap<Month, usize> =
        monthly_flag_counts(&capacity, BURNOUT_RISK_FLAG, AT_RISK)?.into_iter().collect();
    let at_risk_points: Vec<(Month, f64)> = capacity
        .months()
        .into_iter()
        .map(|m| (m, flagged.get(&m).copied().unwrap_or(0) as f64))
        .collect();
    health.cards.push(KpiCard::new(
        "At-Risk Employees",
        flag_count(&capacity, BURNOUT_RISK_FLAG, AT_RISK)? as f64,
        Whole,
        series_trend(&at_risk_points),
    ));
    health.cards.push(KpiCard::new(
        "At-Risk %",
        flag_share(&capacity, BURNOUT_RISK_FLAG, AT_RISK)?,
        Percentage,
        TrendResult::InsufficientData,
    ));
    if has_department(&capacity) {
        health.breakdowns.push(Breakdown {
            title: "At-Risk by Department".to_string(),
            kind: Whole,
            rows: group_flag_counts(&capacity, DEPARTMENT, BURNOUT_RISK_FLAG, AT_RISK)?
                .into_iter()
                .map(|(key, n)| BreakdownRow {
                    group: key.to_string(),
                    value: n as f64,
                })
                .collect(),
        });
    }
    health.cards.push(mean_card(
        "Collaboration Hours",
        &collab,
        COLLABORATION_HOURS,
        Hours,
    )?);
    health.series.push(series(
        "Collaboration Hours Trend",
        &collab,
        COLLABORATION_HOURS,
        AggOp::Mean,
        Hours,
    )?);

    Ok(vec![output, cap, accuracy, health])
}
