use crate::error::Result;
use crate::format::format_metric;
use crate::pages::{Breakdown, PageReport, Section, Series};
use crate::schema::columns::MONTH;
use crate::types::MetricTable;
use serde::Serialize;
use std::path::Path;
use tabled::{settings::Style, Table, Tabled};

#[derive(Debug, Clone, Tabled)]
struct CardRow {
    #[tabled(rename = "Metric")]
    metric: String,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "Trend")]
    trend: String,
}

#[derive(Debug, Clone, Tabled)]
struct GroupRow {
    #[tabled(rename = "Group")]
    group: String,
    #[tabled(rename = "Value")]
    value: String,
}

#[derive(Debug, Clone, Tabled)]
struct PointRow {
    #[tabled(rename = "Month")]
    month: String,
    #[tabled(rename = "Value")]
    value: String,
}

/// Write the first `limit` rows of a table as CSV: `Month` followed by the
/// schema's columns. Absent cells are left blank.
pub fn export_rows(path: &Path, table: &MetricTable, limit: usize) -> Result<usize> {
    let mut wtr = csv::Writer::from_path(path)?;
    let columns: Vec<&str> = table.schema().columns().collect();
    let mut header = vec![MONTH];
    header.extend(columns.iter().copied());
    wtr.write_record(&header)?;
    let rows = table.head(limit);
    for r in rows {
        let mut record = vec![r.month.to_string()];
        record.extend(
            columns
                .iter()
                .map(|c| r.get(c).map(ToString::to_string).unwrap_or_default()),
        );
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(rows.len())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Render a whole page as markdown tables.
pub fn render_text(report: &PageReport) -> String {
    let mut out = format!("# {}\n\n", report.title);
    for section in &report.sections {
        out.push_str(&render_section(section));
    }
    out
}

pub fn print_page(report: &PageReport) {
    print!("{}", render_text(report));
}

fn render_section(section: &Section) -> String {
    let mut out = format!("## {}\n\n", section.title);
    let cards: Vec<CardRow> = section
        .cards
        .iter()
        .map(|c| CardRow {
            metric: c.label.clone(),
            value: format_metric(c.value, c.kind),
            trend: c.trend.label(),
        })
        .collect();
    out.push_str(&markdown(cards));
    for b in &section.breakdowns {
        out.push_str(&render_breakdown(b));
    }
    for s in &section.series {
        out.push_str(&render_series(s));
    }
    out
}

fn render_breakdown(b: &Breakdown) -> String {
    let rows: Vec<GroupRow> = b
        .rows
        .iter()
        .map(|r| GroupRow {
            group: r.group.clone(),
            value: format_metric(r.value, b.kind),
        })
        .collect();
    format!("### {}\n\n{}", b.title, markdown(rows))
}

fn render_series(s: &Series) -> String {
    let rows: Vec<PointRow> = s
        .points
        .iter()
        .map(|p| PointRow {
            month: p.month.to_string(),
            value: format_metric(p.value, s.kind),
        })
        .collect();
    format!("### {} (monthly)\n\n{}", s.title, markdown(rows))
}

fn markdown<T: Tabled>(rows: Vec<T>) -> String {
    if rows.is_empty() {
        return "(no rows)\n\n".to_string();
    }
    let table_str = Table::new(rows).with(Style::markdown()).to_string();
    format!("{}\n\n", table_str)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::format::MetricKind;
    use crate::pages::{BreakdownRow, KpiCard, Page};
    use crate::schema::Schema;
    use crate::trend::TrendResult;
    use crate::types::{MetricRecord, Month};
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn export_writes_header_and_limited_rows() {
        let schema = Schema::new("T", &["Department"], &["Cost"]);
        let jan = Month::new(2025, 1).unwrap();
        let rows = (0..5)
            .map(|i| {
                let r = MetricRecord::new(jan).with_number("Cost", i as f64 * 1.5);
                if i % 2 == 0 { r.with_text("Department", "Ops") } else { r }
            })
            .collect();
        let table = MetricTable::from_rows(schema, rows);

        let dir = tempdir().unwrap();
        let path = dir.path().join("out.csv");
        assert_eq!(export_rows(&path, &table, 3).unwrap(), 3);
        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "Month,Department,Cost\n2025-01,Ops,0\n2025-01,,1.5\n2025-01,Ops,3\n");
    }

    #[test]
    fn page_text_shows_trend_labels_and_empty_tables() {
        let report = PageReport {
            page: Page::Main,
            title: "Dash".into(),
            sections: vec![Section {
                title: "Cost".into(),
                cards: vec![KpiCard {
                    label: "Rework".into(),
                    value: 4.3,
                    kind: MetricKind::Percentage,
                    trend: TrendResult::InsufficientData,
                }],
                breakdowns: vec![Breakdown {
                    title: "By Dept".into(),
                    kind: MetricKind::Currency,
                    rows: vec![BreakdownRow { group: "Ops".into(), value: 1234.0 }],
                }],
                series: vec![Series {
                    title: "Rework".into(),
                    kind: MetricKind::Percentage,
                    points: vec![],
                }],
            }],
        };
        let text = render_text(&report);
        assert!(text.starts_with("# Dash\n"));
        assert!(text.contains("4.3%"));
        assert!(text.contains("No data"));
        assert!(text.contains("$1,234"));
        assert!(text.contains("(no rows)"));
    }

    #[test]
    fn writes_json_report() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("page.json");
        write_json(&path, &TrendResult::InsufficientData).unwrap();
        let value: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(value["status"], "insufficient_data");
    }
}
