// Scalar summaries and grouped breakdowns over an (already filtered) table.
//
// Every function here is total on empty input: means and sums of nothing are
// 0, breakdowns of nothing are empty. The only error is asking for a column
// the table's schema does not declare.
use crate::error::{KpiError, Result};
use crate::types::{MetricTable, Month};
use serde::{Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AggOp {
    Mean,
    Sum,
    Count,
}

impl AggOp {
    pub fn apply(self, values: &[f64]) -> f64 {
        match self {
            AggOp::Mean if values.is_empty() => 0.0,
            AggOp::Mean => values.iter().sum::<f64>() / values.len() as f64,
            AggOp::Sum => values.iter().sum(),
            AggOp::Count => values.len() as f64,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Descending,
    Ascending,
}

/// Key of one group in a breakdown: a single dimension value, or a pair for
/// combined breakdowns such as Department × Process.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Single(String),
    Pair(String, String),
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Single(a) => f.write_str(a),
            GroupKey::Pair(a, b) => write!(f, "{} - {}", a, b),
        }
    }
}

impl Serialize for GroupKey {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Values of `measure` across all rows that carry it.
pub fn measure_values(table: &MetricTable, measure: &str) -> Result<Vec<f64>> {
    table.schema().require_measure(measure)?;
    Ok(table.rows().iter().filter_map(|r| r.number(measure)).collect())
}

/// Mean, sum or count of `measure`. An empty table gives 0.
pub fn aggregate(table: &MetricTable, measure: &str, op: AggOp) -> Result<f64> {
    Ok(op.apply(&measure_values(table, measure)?))
}

/// Group rows by one or two dimension columns and aggregate `measure` per
/// group.
///
/// Only combinations that occur in the table become groups; rows missing any
/// group column are left out. The result is sorted by value with ties kept in
/// first-seen order, then truncated to `top_n` if given.
pub fn group_and_aggregate(
    table: &MetricTable,
    group_columns: &[&str],
    measure: &str,
    op: AggOp,
    order: SortOrder,
    top_n: Option<usize>,
) -> Result<Vec<(GroupKey, f64)>> {
    if group_columns.is_empty() || group_columns.len() > 2 {
        return Err(KpiError::InvalidGrouping(group_columns.len()));
    }
    for col in group_columns {
        table.schema().require_dimension(col)?;
    }
    table.schema().require_measure(measure)?;

    // Insertion-ordered accumulation so ties resolve by first appearance.
    let mut index: HashMap<GroupKey, usize> = HashMap::new();
    let mut groups: Vec<(GroupKey, Vec<f64>)> = Vec::new();
    for r in table.rows() {
        let key = match group_columns {
            [a] => r.text(a).map(|a| GroupKey::Single(a.to_string())),
            [a, b] => r
                .text(a)
                .zip(r.text(b))
                .map(|(a, b)| GroupKey::Pair(a.to_string(), b.to_string())),
            _ => None,
        };
        let Some(key) = key else { continue };
        let slot = *index.entry(key.clone()).or_insert_with(|| {
            groups.push((key, Vec::new()));
            groups.len() - 1
        });
        if let Some(v) = r.number(measure) {
            groups[slot].1.push(v);
        }
    }

    let mut out: Vec<(GroupKey, f64)> = groups
        .into_iter()
        .map(|(key, values)| (key, op.apply(&values)))
        .collect();
    sort_by_value(&mut out, order);
    if let Some(n) = top_n {
        out.truncate(n);
    }
    Ok(out)
}

fn sort_by_value<K>(rows: &mut [(K, f64)], order: SortOrder) {
    // `sort_by` is stable, which is what keeps tie order deterministic.
    rows.sort_by(|a, b| {
        let ord = a.1.partial_cmp(&b.1).unwrap_or(Ordering::Equal);
        match order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        }
    });
}

/// Per-month aggregate of `measure`, ascending by month.
pub fn monthly_series(table: &MetricTable, measure: &str, op: AggOp) -> Result<Vec<(Month, f64)>> {
    table.schema().require_measure(measure)?;
    let mut by_month: BTreeMap<Month, Vec<f64>> = BTreeMap::new();
    for r in table.rows() {
        if let Some(v) = r.number(measure) {
            by_month.entry(r.month).or_default().push(v);
        }
    }
    Ok(by_month
        .into_iter()
        .map(|(m, values)| (m, op.apply(&values)))
        .collect())
}

/// Share of the full dataset that survived filtering, as a percentage.
///
/// The denominator is clamped to 1, so an empty full table yields
/// `subset_rows * 100` rather than an error.
pub fn coverage(subset_rows: usize, total_rows: usize) -> f64 {
    subset_rows as f64 / total_rows.max(1) as f64 * 100.0
}

/// Number of rows whose `column` equals the fixed `sentinel` label
/// (e.g. `Burnout_Risk_Flag == "Yes"`).
pub fn flag_count(table: &MetricTable, column: &str, sentinel: &str) -> Result<usize> {
    table.schema().require_dimension(column)?;
    Ok(table
        .rows()
        .iter()
        .filter(|r| r.text(column) == Some(sentinel))
        .count())
}

/// Flagged rows as a percentage of all rows; 0 for an empty table.
pub fn flag_share(table: &MetricTable, column: &str, sentinel: &str) -> Result<f64> {
    let flagged = flag_count(table, column, sentinel)?;
    if table.is_empty() {
        return Ok(0.0);
    }
    Ok(flagged as f64 / table.len() as f64 * 100.0)
}

/// Flag counts per month, for months with at least one flagged row.
pub fn monthly_flag_counts(
    table: &MetricTable,
    column: &str,
    sentinel: &str,
) -> Result<Vec<(Month, usize)>> {
    table.schema().require_dimension(column)?;
    let mut by_month: BTreeMap<Month, usize> = BTreeMap::new();
    for r in table.rows().iter().filter(|r| r.text(column) == Some(sentinel)) {
        *by_month.entry(r.month).or_default() += 1;
    }
    Ok(by_month.into_iter().collect())
}

/// Flag counts per value of `group_column`, in first-seen order. Groups with
/// no flagged rows are reported with 0.
pub fn group_flag_counts(
    table: &MetricTable,
    group_column: &str,
    column: &str,
    sentinel: &str,
) -> Result<Vec<(GroupKey, usize)>> {
    table.schema().require_dimension(group_column)?;
    table.schema().require_dimension(column)?;
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut out: Vec<(GroupKey, usize)> = Vec::new();
    for r in table.rows() {
        let Some(group) = r.text(group_column) else { continue };
        let slot = *index.entry(group).or_insert_with(|| {
            out.push((GroupKey::Single(group.to_string()), 0));
            out.len() - 1
        });
        if r.text(column) == Some(sentinel) {
            out[slot].1 += 1;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::types::MetricRecord;
    use pretty_assertions::assert_eq;
    use std::collections::BTreeSet;

    fn m(month: u32) -> Month {
        Month::new(2025, month).unwrap()
    }

    fn row(month: u32, dept: &str, process: &str, v: f64) -> MetricRecord {
        MetricRecord::new(m(month))
            .with_text("Department", dept)
            .with_text("Process", process)
            .with_number("Cost", v)
    }

    fn table(rows: Vec<MetricRecord>) -> MetricTable {
        MetricTable::from_rows(Schema::new("Test", &["Department", "Process"], &["Cost"]), rows)
    }

    fn keys(rows: &[(GroupKey, f64)]) -> Vec<String> {
        rows.iter().map(|(k, _)| k.to_string()).collect()
    }

    #[test]
    fn empty_table_defaults_to_zero() {
        let t = table(vec![]);
        assert_eq!(aggregate(&t, "Cost", AggOp::Mean).unwrap(), 0.0);
        assert_eq!(aggregate(&t, "Cost", AggOp::Sum).unwrap(), 0.0);
        assert_eq!(aggregate(&t, "Cost", AggOp::Count).unwrap(), 0.0);
        assert_eq!(AggOp::Mean.apply(&[1.0, 2.0, 6.0]), 3.0);
        let grouped =
            group_and_aggregate(&t, &["Department"], "Cost", AggOp::Sum, SortOrder::Descending, None)
                .unwrap();
        assert!(grouped.is_empty());
    }

    #[test]
    fn scalar_ops_skip_rows_without_the_measure() {
        let mut t = table(vec![row(1, "A", "p", 2.0), row(1, "B", "p", 4.0)]);
        t.push(MetricRecord::new(m(1)).with_text("Department", "C"));
        assert_eq!(aggregate(&t, "Cost", AggOp::Mean).unwrap(), 3.0);
        assert_eq!(aggregate(&t, "Cost", AggOp::Sum).unwrap(), 6.0);
        assert_eq!(aggregate(&t, "Cost", AggOp::Count).unwrap(), 2.0);
    }

    #[test]
    fn undeclared_measure_is_an_error() {
        let t = table(vec![row(1, "A", "p", 2.0)]);
        let err = aggregate(&t, "Revenue", AggOp::Sum).unwrap_err();
        assert!(matches!(err, KpiError::MissingColumn { ref column, .. } if column == "Revenue"));
    }

    #[test]
    fn groups_partition_the_distinct_values() {
        let t = table(vec![
            row(1, "Finance", "p", 1.0),
            row(1, "HR", "p", 2.0),
            row(2, "Finance", "q", 3.0),
            row(2, "IT", "q", 4.0),
        ]);
        let grouped =
            group_and_aggregate(&t, &["Department"], "Cost", AggOp::Sum, SortOrder::Descending, None)
                .unwrap();
        let got: BTreeSet<String> = keys(&grouped).into_iter().collect();
        let expected: BTreeSet<String> = t.distinct_text("Department").into_iter().collect();
        assert_eq!(got, expected);
        assert_eq!(keys(&grouped), vec!["Finance", "IT", "HR"]);
    }

    #[test]
    fn pair_grouping_uses_present_combinations_only() {
        let t = table(vec![
            row(1, "Finance", "Billing", 5.0),
            row(1, "HR", "Hiring", 7.0),
            row(2, "Finance", "Billing", 9.0),
        ]);
        let grouped = group_and_aggregate(
            &t,
            &["Department", "Process"],
            "Cost",
            AggOp::Mean,
            SortOrder::Descending,
            None,
        )
        .unwrap();
        assert_eq!(
            grouped,
            vec![
                (GroupKey::Pair("Finance".into(), "Billing".into()), 7.0),
                (GroupKey::Pair("HR".into(), "Hiring".into()), 7.0),
            ]
        );
        assert_eq!(grouped[0].0.to_string(), "Finance - Billing");
    }

    #[test]
    fn top_n_keeps_first_seen_order_among_ties() {
        let t = table(vec![
            row(1, "E", "p", 1.0),
            row(1, "D", "p", 5.0),
            row(1, "C", "p", 5.0),
            row(1, "B", "p", 5.0),
            row(1, "A", "p", 5.0),
        ]);
        for _ in 0..3 {
            let grouped = group_and_aggregate(
                &t,
                &["Department"],
                "Cost",
                AggOp::Sum,
                SortOrder::Descending,
                Some(3),
            )
            .unwrap();
            assert_eq!(keys(&grouped), vec!["D", "C", "B"]);
        }
    }

    #[test]
    fn ascending_order_is_supported() {
        let t = table(vec![row(1, "A", "p", 3.0), row(1, "B", "p", 1.0)]);
        let grouped =
            group_and_aggregate(&t, &["Department"], "Cost", AggOp::Sum, SortOrder::Ascending, None)
                .unwrap();
        assert_eq!(keys(&grouped), vec!["B", "A"]);
    }

    #[test]
    fn grouping_rejects_bad_column_counts() {
        let t = table(vec![]);
        let err = group_and_aggregate(&t, &[], "Cost", AggOp::Sum, SortOrder::Descending, None)
            .unwrap_err();
        assert!(matches!(err, KpiError::InvalidGrouping(0)));
    }

    #[test]
    fn coverage_clamps_zero_denominator() {
        assert_eq!(coverage(5, 0), 500.0);
        assert_eq!(coverage(5, 10), 50.0);
        assert_eq!(coverage(0, 0), 0.0);
    }

    #[test]
    fn flag_helpers_match_the_sentinel_exactly() {
        let schema = Schema::new("Cap", &["Department", "Burnout_Risk_Flag"], &["Util"]);
        let flag = |month, dept: &str, f: &str| {
            MetricRecord::new(m(month))
                .with_text("Department", dept)
                .with_text("Burnout_Risk_Flag", f)
        };
        let t = MetricTable::from_rows(
            schema,
            vec![
                flag(1, "Ops", "Yes"),
                flag(1, "HR", "No"),
                flag(2, "Ops", "yes"),
                flag(3, "HR", "Yes"),
            ],
        );
        assert_eq!(flag_count(&t, "Burnout_Risk_Flag", "Yes").unwrap(), 2);
        assert_eq!(flag_share(&t, "Burnout_Risk_Flag", "Yes").unwrap(), 50.0);
        assert_eq!(
            monthly_flag_counts(&t, "Burnout_Risk_Flag", "Yes").unwrap(),
            vec![(m(1), 1), (m(3), 1)]
        );
        assert_eq!(
            group_flag_counts(&t, "Department", "Burnout_Risk_Flag", "Yes").unwrap(),
            vec![
                (GroupKey::Single("Ops".into()), 1),
                (GroupKey::Single("HR".into()), 1),
            ]
        );
    }

    #[test]
    fn monthly_series_is_sorted_by_month() {
        let t = table(vec![row(3, "A", "p", 3.0), row(1, "A", "p", 1.0), row(1, "B", "p", 5.0)]);
        assert_eq!(
            monthly_series(&t, "Cost", AggOp::Mean).unwrap(),
            vec![(m(1), 3.0), (m(3), 3.0)]
        );
    }
}
