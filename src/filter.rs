use crate::schema::columns::DEPARTMENT;
use crate::types::{MetricTable, Month};
use std::collections::BTreeSet;

/// The months and departments picked for one computation pass.
///
/// An empty department set means "no department filter". An empty month set
/// selects nothing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FilterSelection {
    pub months: BTreeSet<Month>,
    pub departments: BTreeSet<String>,
}

impl FilterSelection {
    pub fn new<M, D>(months: M, departments: D) -> Self
    where
        M: IntoIterator<Item = Month>,
        D: IntoIterator<Item = String>,
    {
        FilterSelection {
            months: months.into_iter().collect(),
            departments: departments.into_iter().collect(),
        }
    }
}

/// Keep rows whose month is selected and, when the table has a Department
/// column and departments were picked, whose department is selected too.
///
/// Tables without a Department column pass through the department filter
/// untouched.
pub fn filter(table: &MetricTable, selection: &FilterSelection) -> MetricTable {
    let by_department =
        !selection.departments.is_empty() && table.schema().has_dimension(DEPARTMENT);
    let rows = table
        .rows()
        .iter()
        .filter(|r| selection.months.contains(&r.month))
        .filter(|r| {
            !by_department
                || r.text(DEPARTMENT)
                    .is_some_and(|d| selection.departments.contains(d))
        })
        .cloned()
        .collect();
    MetricTable::from_rows(table.schema().clone(), rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::types::MetricRecord;
    use pretty_assertions::assert_eq;

    fn m(month: u32) -> Month {
        Month::new(2025, month).unwrap()
    }

    fn table() -> MetricTable {
        let schema = Schema::new("Test", &[DEPARTMENT], &["V"]);
        MetricTable::from_rows(
            schema,
            vec![
                MetricRecord::new(m(1)).with_text(DEPARTMENT, "Finance").with_number("V", 1.0),
                MetricRecord::new(m(1)).with_text(DEPARTMENT, "HR").with_number("V", 2.0),
                MetricRecord::new(m(2)).with_text(DEPARTMENT, "Finance").with_number("V", 3.0),
                MetricRecord::new(m(3)).with_text(DEPARTMENT, "IT").with_number("V", 4.0),
            ],
        )
    }

    #[test]
    fn keeps_selected_months_and_departments() {
        let sel = FilterSelection::new([m(1), m(2)], ["Finance".to_string()]);
        let out = filter(&table(), &sel);
        let values: Vec<f64> = out.rows().iter().filter_map(|r| r.number("V")).collect();
        assert_eq!(values, vec![1.0, 3.0]);
    }

    #[test]
    fn empty_departments_means_no_department_filter() {
        let sel = FilterSelection::new([m(1)], Vec::<String>::new());
        assert_eq!(filter(&table(), &sel).len(), 2);
    }

    #[test]
    fn department_filter_is_noop_without_department_column() {
        let schema = Schema::new("NoDept", &[], &["V"]);
        let t = MetricTable::from_rows(
            schema,
            vec![
                MetricRecord::new(m(1)).with_number("V", 1.0),
                MetricRecord::new(m(2)).with_number("V", 2.0),
            ],
        );
        let sel = FilterSelection::new([m(1), m(2)], ["Finance".to_string()]);
        assert_eq!(filter(&t, &sel).len(), 2);
    }

    #[test]
    fn empty_month_selection_yields_empty_table() {
        let sel = FilterSelection::default();
        let out = filter(&table(), &sel);
        assert!(out.is_empty());
        assert_eq!(out.schema(), table().schema());
    }

    #[test]
    fn filtering_twice_changes_nothing() {
        let sel = FilterSelection::new([m(1), m(3)], ["Finance".to_string(), "IT".to_string()]);
        let once = filter(&table(), &sel);
        let twice = filter(&once, &sel);
        assert_eq!(once, twice);
    }
}
