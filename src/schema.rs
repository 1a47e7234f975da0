// Dataset catalogue and per-dataset schema descriptors.
//
// Filtering and aggregation consult the schema instead of probing rows, so a
// dataset that genuinely lacks a column (e.g. Collaboration has no
// Department) is handled explicitly rather than by accident.
use crate::error::{KpiError, Result};
use serde::Serialize;
use std::fmt;
use std::str::FromStr;

pub mod columns {
    pub const MONTH: &str = "Month";
    pub const DEPARTMENT: &str = "Department";
    pub const ROLE: &str = "Role";
    pub const PROCESS: &str = "Process";
    pub const PROCESS_NAME: &str = "Process_Name";
    pub const PROCESS_STEP: &str = "Process_Step";
    pub const CRITICAL_TASK: &str = "Critical_Task";
    pub const WORK_MODEL: &str = "Work_Model";
    pub const TASK_TYPE: &str = "Task_Type";
    pub const BURNOUT_RISK_FLAG: &str = "Burnout_Risk_Flag";

    pub const LOW_VALUE_WORK_PCT: &str = "Low_Value_Work_Percentage";
    pub const OPPORTUNITY_COST: &str = "Opportunity_Cost_Dollars";
    pub const ROI_PCT_6M: &str = "ROI_Percentage_6M";
    pub const TIME_SAVINGS_HOURS: &str = "Time_Savings_Hours";
    pub const FRICTION_INDEX: &str = "Friction_Index_Score";
    pub const REWORK_COST_PCT: &str = "Rework_Cost_Percentage";
    pub const REWORK_COST_DOLLARS: &str = "Rework_Cost_Dollars";
    pub const FTR_RATE_PCT: &str = "FTR_Rate_Percentage";
    pub const ADHERENCE_RATE_PCT: &str = "Adherence_Rate_Percentage";
    pub const RESILIENCE_SCORE: &str = "Resilience_Score";
    pub const RISK_PCT: &str = "Risk_Percentage";
    pub const STEP_EXCEPTION_COUNT: &str = "Step_Exception_Count";
    pub const CAPACITY_UTILIZATION_PCT: &str = "Capacity_Utilization_Percentage";
    pub const FORECAST_ACCURACY_PCT: &str = "Forecast_Accuracy_Percentage";
    pub const STAFFING_VARIANCE_PCT: &str = "Staffing_Variance_Percentage";
    pub const OUTPUT_PER_HOUR: &str = "Output_Per_Hour";
    pub const COLLABORATION_HOURS: &str = "Collaboration_Tools_Time_Hours";
}

use columns::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColumnRole {
    Dimension,
    Measure,
}

/// A column a dataset may carry. Optional columns may be absent from a
/// source file without the dataset being rejected.
#[derive(Debug, Clone, Copy)]
pub struct ColumnDef {
    pub name: &'static str,
    pub role: ColumnRole,
    pub required: bool,
}

const fn dim(name: &'static str) -> ColumnDef {
    ColumnDef { name, role: ColumnRole::Dimension, required: true }
}

const fn opt_dim(name: &'static str) -> ColumnDef {
    ColumnDef { name, role: ColumnRole::Dimension, required: false }
}

const fn measure(name: &'static str) -> ColumnDef {
    ColumnDef { name, role: ColumnRole::Measure, required: true }
}

const fn opt_measure(name: &'static str) -> ColumnDef {
    ColumnDef { name, role: ColumnRole::Measure, required: false }
}

const ROLE_VS_REALITY_COLUMNS: &[ColumnDef] = &[
    opt_dim(DEPARTMENT),
    dim(ROLE),
    measure(LOW_VALUE_WORK_PCT),
    measure(OPPORTUNITY_COST),
];
const AUTOMATION_ROI_COLUMNS: &[ColumnDef] = &[
    opt_dim(DEPARTMENT),
    dim(PROCESS_NAME),
    opt_dim(TASK_TYPE),
    measure(ROI_PCT_6M),
    opt_measure(TIME_SAVINGS_HOURS),
];
const DIGITAL_INDEX_COLUMNS: &[ColumnDef] = &[
    opt_dim(DEPARTMENT),
    opt_dim(PROCESS),
    measure(FRICTION_INDEX),
];
const PROCESS_REWORK_COLUMNS: &[ColumnDef] = &[
    opt_dim(DEPARTMENT),
    dim(PROCESS_NAME),
    measure(REWORK_COST_PCT),
    measure(REWORK_COST_DOLLARS),
];
const FTR_RATE_COLUMNS: &[ColumnDef] = &[opt_dim(DEPARTMENT), measure(FTR_RATE_PCT)];
const ADHERENCE_COLUMNS: &[ColumnDef] = &[
    opt_dim(DEPARTMENT),
    opt_dim(PROCESS_STEP),
    measure(ADHERENCE_RATE_PCT),
];
const RESILIENCE_COLUMNS: &[ColumnDef] = &[
    opt_dim(DEPARTMENT),
    dim(CRITICAL_TASK),
    measure(RESILIENCE_SCORE),
    measure(RISK_PCT),
];
const ESCALATION_COLUMNS: &[ColumnDef] = &[
    opt_dim(DEPARTMENT),
    dim(PROCESS),
    measure(STEP_EXCEPTION_COUNT),
];
const CAPACITY_COLUMNS: &[ColumnDef] = &[
    opt_dim(DEPARTMENT),
    dim(BURNOUT_RISK_FLAG),
    measure(CAPACITY_UTILIZATION_PCT),
];
const MODEL_ACCURACY_COLUMNS: &[ColumnDef] = &[
    opt_dim(DEPARTMENT),
    measure(FORECAST_ACCURACY_PCT),
    opt_measure(STAFFING_VARIANCE_PCT),
];
const WORK_MODELS_COLUMNS: &[ColumnDef] = &[
    opt_dim(DEPARTMENT),
    dim(WORK_MODEL),
    measure(OUTPUT_PER_HOUR),
];
const COLLABORATION_COLUMNS: &[ColumnDef] = &[measure(COLLABORATION_HOURS)];

/// The set of dimension and measure columns a table actually has.
/// `Month` is implicit and always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Schema {
    name: String,
    dimensions: Vec<String>,
    measures: Vec<String>,
}

impl Schema {
    pub fn new(name: &str, dimensions: &[&str], measures: &[&str]) -> Self {
        Schema {
            name: name.to_string(),
            dimensions: dimensions.iter().map(|s| s.to_string()).collect(),
            measures: measures.iter().map(|s| s.to_string()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dimensions(&self) -> &[String] {
        &self.dimensions
    }

    pub fn measures(&self) -> &[String] {
        &self.measures
    }

    pub fn has_dimension(&self, column: &str) -> bool {
        self.dimensions.iter().any(|c| c == column)
    }

    pub fn has_measure(&self, column: &str) -> bool {
        self.measures.iter().any(|c| c == column)
    }

    /// Dimensions first, then measures, in declaration order. `Month` excluded.
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.dimensions
            .iter()
            .chain(self.measures.iter())
            .map(String::as_str)
    }

    pub fn require_measure(&self, column: &str) -> Result<()> {
        if self.has_measure(column) {
            Ok(())
        } else {
            Err(KpiError::missing_column(&self.name, column))
        }
    }

    pub fn require_dimension(&self, column: &str) -> Result<()> {
        if self.has_dimension(column) {
            Ok(())
        } else {
            Err(KpiError::missing_column(&self.name, column))
        }
    }
}

/// The twelve logical KPI datasets the dashboard reads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Dataset {
    RoleVsReality,
    AutomationRoi,
    DigitalIndex,
    ProcessRework,
    FtrRate,
    Adherence,
    Resilience,
    Escalation,
    Capacity,
    ModelAccuracy,
    WorkModels,
    Collaboration,
}

impl Dataset {
    pub const ALL: [Dataset; 12] = [
        Dataset::RoleVsReality,
        Dataset::AutomationRoi,
        Dataset::DigitalIndex,
        Dataset::ProcessRework,
        Dataset::FtrRate,
        Dataset::Adherence,
        Dataset::Resilience,
        Dataset::Escalation,
        Dataset::Capacity,
        Dataset::ModelAccuracy,
        Dataset::WorkModels,
        Dataset::Collaboration,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Dataset::RoleVsReality => "Role_vs_Reality",
            Dataset::AutomationRoi => "Automation_ROI",
            Dataset::DigitalIndex => "Digital_Index",
            Dataset::ProcessRework => "Process_Rework",
            Dataset::FtrRate => "FTR_Rate",
            Dataset::Adherence => "Adherence",
            Dataset::Resilience => "Resilience",
            Dataset::Escalation => "Escalation",
            Dataset::Capacity => "Capacity",
            Dataset::ModelAccuracy => "Model_Accuracy",
            Dataset::WorkModels => "Work_Models",
            Dataset::Collaboration => "Collaboration",
        }
    }

    pub fn file_name(self) -> String {
        format!("{}.csv", self.name())
    }

    pub fn column_defs(self) -> &'static [ColumnDef] {
        match self {
            Dataset::RoleVsReality => ROLE_VS_REALITY_COLUMNS,
            Dataset::AutomationRoi => AUTOMATION_ROI_COLUMNS,
            Dataset::DigitalIndex => DIGITAL_INDEX_COLUMNS,
            Dataset::ProcessRework => PROCESS_REWORK_COLUMNS,
            Dataset::FtrRate => FTR_RATE_COLUMNS,
            Dataset::Adherence => ADHERENCE_COLUMNS,
            Dataset::Resilience => RESILIENCE_COLUMNS,
            Dataset::Escalation => ESCALATION_COLUMNS,
            Dataset::Capacity => CAPACITY_COLUMNS,
            Dataset::ModelAccuracy => MODEL_ACCURACY_COLUMNS,
            Dataset::WorkModels => WORK_MODELS_COLUMNS,
            Dataset::Collaboration => COLLABORATION_COLUMNS,
        }
    }

    /// Full schema with every declared column, optional ones included.
    pub fn schema(self) -> Schema {
        self.schema_with(|_| true)
    }

    /// Schema limited to the declared columns for which `present` holds.
    pub fn schema_with(self, present: impl Fn(&ColumnDef) -> bool) -> Schema {
        let defs: Vec<&ColumnDef> = self.column_defs().iter().filter(|d| present(d)).collect();
        let pick = |role: ColumnRole| -> Vec<&str> {
            defs.iter().filter(|d| d.role == role).map(|d| d.name).collect()
        };
        Schema::new(
            self.name(),
            &pick(ColumnRole::Dimension),
            &pick(ColumnRole::Measure),
        )
    }
}

impl fmt::Display for Dataset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Dataset {
    type Err = KpiError;

    fn from_str(s: &str) -> Result<Self> {
        Dataset::ALL
            .iter()
            .copied()
            .find(|d| d.name().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| KpiError::UnknownDataset(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collaboration_has_no_department() {
        let schema = Dataset::Collaboration.schema();
        assert!(!schema.has_dimension(DEPARTMENT));
        assert!(schema.has_measure(COLLABORATION_HOURS));
    }

    #[test]
    fn schema_with_drops_absent_optional_columns() {
        let schema = Dataset::AutomationRoi.schema_with(|d| d.name != TASK_TYPE);
        assert!(!schema.has_dimension(TASK_TYPE));
        assert!(schema.has_dimension(PROCESS_NAME));
    }

    #[test]
    fn require_measure_names_dataset_and_column() {
        let err = Dataset::FtrRate.schema().require_measure("Nope").unwrap_err();
        assert_eq!(
            err.to_string(),
            "FTR_Rate: required column `Nope` is missing"
        );
    }

    #[test]
    fn every_dataset_declares_a_measure() {
        for d in Dataset::ALL {
            let defs = d.column_defs();
            assert!(defs.iter().any(|c| c.role == ColumnRole::Measure && c.required), "{}", d);
            assert_eq!(d.schema().columns().count(), defs.len());
        }
    }

    #[test]
    fn dataset_names_round_trip() {
        for d in Dataset::ALL {
            assert_eq!(d.name().parse::<Dataset>().unwrap(), d);
        }
        assert!("Payroll".parse::<Dataset>().is_err());
    }
}
