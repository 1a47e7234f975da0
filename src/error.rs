use thiserror::Error;

/// Errors surfaced by loading, aggregation and export.
///
/// Empty tables and short histories are not errors: aggregation falls back to
/// zero and trends report `TrendResult::InsufficientData` instead.
#[derive(Error, Debug)]
pub enum KpiError {
    #[error("{dataset}: required column `{column}` is missing")]
    MissingColumn { dataset: String, column: String },
    #[error("invalid month `{0}` (expected YYYY-MM or YYYY-MM-DD)")]
    InvalidMonth(String),
    #[error("unknown dataset `{0}`")]
    UnknownDataset(String),
    #[error("dataset `{0}` has not been loaded")]
    NotLoaded(String),
    #[error("group by expects one or two columns, got {0}")]
    InvalidGrouping(usize),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("csv error: {0}")]
    Csv(#[from] csv::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, KpiError>;

impl KpiError {
    pub fn missing_column(dataset: impl Into<String>, column: impl Into<String>) -> Self {
        KpiError::MissingColumn {
            dataset: dataset.into(),
            column: column.into(),
        }
    }
}
