// Synthetic KPI tables with the same schemas as the workbook exports, used
// when no source files are available.
use crate::error::Result;
use crate::schema::columns::*;
use crate::schema::{ColumnRole, Dataset};
use crate::source::DataSource;
use crate::types::{Field, MetricRecord, MetricTable, Month};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub const DEPARTMENTS: [&str; 5] = ["Finance", "Operations", "HR", "IT", "Customer Service"];

/// Rows generated per department per month for datasets that carry a
/// secondary dimension (process, role, task...).
const ROWS_PER_DEPARTMENT: usize = 3;

#[derive(Debug, Clone)]
pub struct MockSource {
    seed: u64,
    anchor: Month,
    months: u32,
}

impl MockSource {
    /// `months` consecutive months ending at `anchor`.
    pub fn new(seed: u64, anchor: Month, months: u32) -> Self {
        MockSource {
            seed,
            anchor,
            months: months.max(1),
        }
    }

    pub fn months(&self) -> Vec<Month> {
        (0..self.months).rev().map(|n| self.anchor.back(n)).collect()
    }

    fn rng_for(&self, dataset: Dataset) -> StdRng {
        // Independent stream per dataset so adding a column to one dataset
        // does not reshuffle the others.
        let salt = Dataset::ALL.iter().position(|d| *d == dataset).unwrap_or(0) as u64;
        StdRng::seed_from_u64(self.seed.wrapping_mul(31).wrapping_add(salt))
    }
}

impl DataSource for MockSource {
    fn name(&self) -> &str {
        "mock"
    }

    fn load(&self, dataset: Dataset) -> Result<MetricTable> {
        let mut rng = self.rng_for(dataset);
        let defs = dataset.column_defs();
        let has_secondary = defs
            .iter()
            .any(|d| d.role == ColumnRole::Dimension && d.name != DEPARTMENT);
        let per_department = if has_secondary { ROWS_PER_DEPARTMENT } else { 1 };

        let mut table = MetricTable::new(dataset.schema());
        for month in self.months() {
            for department in DEPARTMENTS {
                for _ in 0..per_department {
                    let mut row = MetricRecord::new(month);
                    for def in defs {
                        let value = match (def.role, def.name) {
                            (ColumnRole::Dimension, DEPARTMENT) => Field::Text(department.to_string()),
                            (ColumnRole::Dimension, BURNOUT_RISK_FLAG) => {
                                let flagged = rng.gen_bool(0.2);
                                Field::Text(if flagged { "Yes" } else { "No" }.to_string())
                            }
                            (ColumnRole::Dimension, name) => {
                                let choices = vocabulary(name);
                                Field::Text(choices[rng.gen_range(0..choices.len())].to_string())
                            }
                            (ColumnRole::Measure, name) => Field::Number(sample_measure(&mut rng, name)),
                        };
                        row.set(def.name, value);
                    }
                    table.push(row);
                }
            }
        }
        Ok(table)
    }
}

fn vocabulary(column: &str) -> &'static [&'static str] {
    match column {
        ROLE => &["Analyst", "Coordinator", "Manager", "Specialist", "Associate"],
        PROCESS | PROCESS_NAME => &[
            "Invoice Processing",
            "Onboarding",
            "Order Fulfilment",
            "Claims Handling",
            "Month-End Close",
            "Vendor Management",
        ],
        PROCESS_STEP => &["Intake", "Validation", "Approval", "Execution", "Review"],
        CRITICAL_TASK => &["Payroll Run", "System Backup", "Customer Escalation", "Compliance Filing"],
        WORK_MODEL => &["Remote", "Hybrid", "On-site"],
        TASK_TYPE => &["Data Entry", "Reconciliation", "Reporting", "Scheduling"],
        _ => &["Other"],
    }
}

fn sample_measure(rng: &mut StdRng, column: &str) -> f64 {
    let (lo, hi) = match column {
        LOW_VALUE_WORK_PCT => (10.0, 40.0),
        OPPORTUNITY_COST => (5_000.0, 60_000.0),
        ROI_PCT_6M => (40.0, 250.0),
        TIME_SAVINGS_HOURS => (20.0, 400.0),
        FRICTION_INDEX => (2.0, 9.0),
        REWORK_COST_PCT => (2.0, 15.0),
        REWORK_COST_DOLLARS => (1_000.0, 50_000.0),
        FTR_RATE_PCT => (75.0, 99.0),
        ADHERENCE_RATE_PCT => (70.0, 99.0),
        RESILIENCE_SCORE => (4.0, 9.5),
        RISK_PCT => (5.0, 60.0),
        STEP_EXCEPTION_COUNT => return rng.gen_range(0..25) as f64,
        CAPACITY_UTILIZATION_PCT => (60.0, 130.0),
        FORECAST_ACCURACY_PCT => (70.0, 98.0),
        STAFFING_VARIANCE_PCT => (-15.0, 15.0),
        OUTPUT_PER_HOUR => (0.8, 3.5),
        COLLABORATION_HOURS => (5.0, 25.0),
        _ => (0.0, 100.0),
    };
    (rng.gen_range(lo..hi) * 100.0_f64).round() / 100.0
}
