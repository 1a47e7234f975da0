// Data-source seam: where the twelve KPI tables come from.
//
// The aggregation code never knows whether a table was read from disk or
// generated; it only sees a `Datasets` snapshot.
use crate::error::{KpiError, Result};
use crate::filter::FilterSelection;
use crate::schema::columns::DEPARTMENT;
use crate::schema::Dataset;
use crate::types::MetricTable;
use std::collections::{BTreeMap, BTreeSet};
use tracing::{info, warn};

/// Anything that can produce a table for a logical dataset.
pub trait DataSource {
    fn name(&self) -> &str;
    fn load(&self, dataset: Dataset) -> Result<MetricTable>;
}

/// One loaded table per dataset. Read-only once built.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Datasets {
    tables: BTreeMap<Dataset, MetricTable>,
}

impl Datasets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, dataset: Dataset, table: MetricTable) {
        self.tables.insert(dataset, table);
    }

    pub fn table(&self, dataset: Dataset) -> Result<&MetricTable> {
        self.tables
            .get(&dataset)
            .ok_or_else(|| KpiError::NotLoaded(dataset.name().to_string()))
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    /// Every month of the reference dataset and every department seen in the
    /// role and capacity datasets; what the dashboard selects by default.
    pub fn default_selection(&self) -> FilterSelection {
        let months = self
            .tables
            .get(&Dataset::RoleVsReality)
            .map(MetricTable::months)
            .unwrap_or_default();
        let departments: BTreeSet<String> = [Dataset::RoleVsReality, Dataset::Capacity]
            .iter()
            .filter_map(|d| self.tables.get(d))
            .flat_map(|t| t.distinct_text(DEPARTMENT))
            .collect();
        FilterSelection::new(months, departments)
    }
}

/// Load every dataset from `primary`, substituting `fallback` for any
/// dataset the primary source cannot supply.
pub fn load_datasets(primary: &dyn DataSource, fallback: Option<&dyn DataSource>) -> Result<Datasets> {
    let mut out = Datasets::new();
    for dataset in Dataset::ALL {
        let table = match (primary.load(dataset), fallback) {
            (Ok(table), _) => table,
            (Err(e), Some(fb)) => {
                warn!(
                    "{}: {} unavailable ({}); using {} data",
                    primary.name(),
                    dataset,
                    e,
                    fb.name()
                );
                fb.load(dataset)?
            }
            (Err(e), None) => return Err(e),
        };
        out.insert(dataset, table);
    }
    info!("loaded {} datasets", out.len());
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{MetricRecord, Month};

    struct Failing;

    impl DataSource for Failing {
        fn name(&self) -> &str {
            "failing"
        }
        fn load(&self, dataset: Dataset) -> Result<MetricTable> {
            Err(KpiError::NotLoaded(dataset.name().to_string()))
        }
    }

    struct OneRow;

    impl DataSource for OneRow {
        fn name(&self) -> &str {
            "one-row"
        }
        fn load(&self, dataset: Dataset) -> Result<MetricTable> {
            let mut row = MetricRecord::new(Month::new(2025, 1).unwrap());
            if dataset.schema().has_dimension(DEPARTMENT) {
                row = row.with_text(DEPARTMENT, "Finance");
            }
            Ok(MetricTable::from_rows(dataset.schema(), vec![row]))
        }
    }

    #[test]
    fn falls_back_per_dataset() {
        let data = load_datasets(&Failing, Some(&OneRow)).unwrap();
        assert_eq!(data.len(), Dataset::ALL.len());
        assert_eq!(data.table(Dataset::Capacity).unwrap().len(), 1);
    }

    #[test]
    fn without_fallback_the_error_surfaces() {
        assert!(matches!(
            load_datasets(&Failing, None),
            Err(KpiError::NotLoaded(_))
        ));
    }

    #[test]
    fn default_selection_covers_reference_months_and_departments() {
        let data = load_datasets(&OneRow, None).unwrap();
        let sel = data.default_selection();
        assert_eq!(sel.months.len(), 1);
        assert!(sel.departments.contains("Finance"));
    }

    #[test]
    fn missing_table_is_reported() {
        let data = Datasets::new();
        assert!(data.table(Dataset::Escalation).is_err());
    }
}
