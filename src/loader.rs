use crate::error::{KpiError, Result};
use crate::schema::columns::MONTH;
use crate::schema::{ColumnRole, Dataset};
use crate::source::DataSource;
use crate::types::{Field, MetricRecord, MetricTable, Month};
use crate::util::{parse_f64_safe, parse_text};
use csv::ReaderBuilder;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub bad_months: usize,
    pub bad_cells: usize,
    pub bad_rows: usize,
}

/// Reads `<dir>/<Dataset>.csv` files exported from the KPI workbook.
#[derive(Debug, Clone)]
pub struct CsvSource {
    dir: PathBuf,
}

impl CsvSource {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        CsvSource { dir: dir.into() }
    }
}

impl DataSource for CsvSource {
    fn name(&self) -> &str {
        "csv"
    }

    fn load(&self, dataset: Dataset) -> Result<MetricTable> {
        let path = self.dir.join(dataset.file_name());
        let (table, report) = load_csv(&path, dataset)?;
        debug!(
            "{}: {} of {} rows loaded ({} bad rows, {} bad months, {} bad cells)",
            dataset,
            report.loaded_rows,
            report.total_rows,
            report.bad_rows,
            report.bad_months,
            report.bad_cells
        );
        if report.bad_rows > 0 || report.bad_months > 0 || report.bad_cells > 0 {
            warn!(
                "{}: skipped {} unreadable rows, {} rows with an unreadable Month and {} unreadable cells",
                path.display(),
                report.bad_rows,
                report.bad_months,
                report.bad_cells
            );
        }
        Ok(table)
    }
}

/// Load and clean one dataset file.
///
/// - `Month` and every required column of the dataset must be in the header.
/// - Optional columns missing from the header are dropped from the schema.
/// - Rows the CSV reader rejects, or whose Month cannot be read, are skipped
///   and counted. Non-UTF-8 bytes are replaced rather than failing the file.
/// - Blank or unparsable cells are left absent rather than defaulted.
pub fn load_csv(path: &Path, dataset: Dataset) -> Result<(MetricTable, LoadReport)> {
    let mut rdr = ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers: Vec<String> = rdr
        .byte_headers()?
        .iter()
        .map(|h| String::from_utf8_lossy(h).trim().to_string())
        .collect();
    let position = |name: &str| headers.iter().position(|h| h == name);

    let month_idx = position(MONTH).ok_or_else(|| KpiError::missing_column(dataset.name(), MONTH))?;
    let mut columns: Vec<(usize, &'static str, ColumnRole)> = Vec::new();
    for def in dataset.column_defs() {
        match position(def.name) {
            Some(idx) => columns.push((idx, def.name, def.role)),
            None if def.required => {
                return Err(KpiError::missing_column(dataset.name(), def.name));
            }
            None => debug!("{}: optional column {} not present", dataset, def.name),
        }
    }
    let schema = dataset.schema_with(|d| columns.iter().any(|(_, name, _)| *name == d.name));

    let mut report = LoadReport::default();
    let mut table = MetricTable::new(schema);
    for result in rdr.byte_records() {
        report.total_rows += 1;
        let record = match result {
            Ok(record) => record,
            Err(e) if e.is_io_error() => return Err(e.into()),
            Err(e) => {
                debug!("{}: skipping row {}: {}", dataset, report.total_rows, e);
                report.bad_rows += 1;
                continue;
            }
        };
        let text = |idx: usize| record.get(idx).map(String::from_utf8_lossy);
        let month = match text(month_idx).as_deref().map(str::parse::<Month>) {
            Some(Ok(m)) => m,
            _ => {
                report.bad_months += 1;
                continue;
            }
        };
        let mut row = MetricRecord::new(month);
        for (idx, name, role) in &columns {
            let cell = text(*idx);
            let cell = cell.as_deref();
            match role {
                ColumnRole::Dimension => {
                    if let Some(text) = parse_text(cell) {
                        row.set(name, Field::Text(text));
                    }
                }
                ColumnRole::Measure => match parse_f64_safe(cell) {
                    Some(v) => row.set(name, Field::Number(v)),
                    None if parse_text(cell).is_some() => report.bad_cells += 1,
                    None => {}
                },
            }
        }
        table.push(row);
    }
    report.loaded_rows = table.len();
    Ok((table, report))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::columns::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn loads_and_cleans_rows() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("FTR_Rate.csv"),
            "Month,Department,FTR_Rate_Percentage,Extra\n\
             2025-01-01,Finance,91.5,x\n\
             2025-02,  HR  ,\"1,002.5\",y\n\
             not a month,IT,80,z\n\
             2025-03,,oops,w\n",
        )
        .unwrap();

        let (table, report) = load_csv(&dir.path().join("FTR_Rate.csv"), Dataset::FtrRate).unwrap();
        assert_eq!(
            report,
            LoadReport { total_rows: 4, loaded_rows: 3, bad_months: 1, bad_cells: 1, bad_rows: 0 }
        );
        let rows = table.rows();
        assert_eq!(rows[0].number(FTR_RATE_PCT), Some(91.5));
        assert_eq!(rows[1].text(DEPARTMENT), Some("HR"));
        assert_eq!(rows[1].number(FTR_RATE_PCT), Some(1002.5));
        assert_eq!(rows[2].text(DEPARTMENT), None);
        assert_eq!(rows[2].number(FTR_RATE_PCT), None);
        assert_eq!(rows[2].month, Month::new(2025, 3).unwrap());
    }

    #[test]
    fn latin1_row_does_not_fail_the_file() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("FTR_Rate.csv"),
            b"Month,Department,FTR_Rate_Percentage\n\
              2025-01,Finance,90\n\
              2025-02,Caf\xe9,85\n\
              2025-03,HR,80\n",
        )
        .unwrap();

        let (table, report) = load_csv(&dir.path().join("FTR_Rate.csv"), Dataset::FtrRate).unwrap();
        assert_eq!(report.loaded_rows, 3);
        assert_eq!(report.bad_rows, 0);
        let rows = table.rows();
        assert_eq!(rows[1].text(DEPARTMENT), Some("Caf\u{FFFD}"));
        assert_eq!(rows[1].number(FTR_RATE_PCT), Some(85.0));
        assert_eq!(rows[2].text(DEPARTMENT), Some("HR"));

        let loaded = CsvSource::new(dir.path()).load(Dataset::FtrRate).unwrap();
        assert_eq!(loaded.len(), 3);
    }

    #[test]
    fn missing_required_column_is_an_error() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("Escalation.csv"), "Month,Department,Process\n").unwrap();
        let err = CsvSource::new(dir.path()).load(Dataset::Escalation).unwrap_err();
        assert!(
            matches!(err, KpiError::MissingColumn { ref column, .. } if column == STEP_EXCEPTION_COUNT)
        );
    }

    #[test]
    fn absent_optional_columns_shrink_the_schema() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("Automation_ROI.csv"),
            "Month,Process_Name,ROI_Percentage_6M\n2025-01,Invoicing,120\n",
        )
        .unwrap();
        let table = CsvSource::new(dir.path()).load(Dataset::AutomationRoi).unwrap();
        let schema = table.schema();
        assert!(!schema.has_dimension(DEPARTMENT));
        assert!(!schema.has_dimension(TASK_TYPE));
        assert!(!schema.has_measure(TIME_SAVINGS_HOURS));
        assert!(schema.has_measure(ROI_PCT_6M));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let dir = tempdir().unwrap();
        assert!(CsvSource::new(dir.path()).load(Dataset::Capacity).is_err());
    }
}
