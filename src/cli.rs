//! Command-line arguments

use clap::Parser;
use kpi_report::pages::Page;
use kpi_report::types::Month;
use std::path::PathBuf;

/// Operational KPI report
///
/// Aggregates the dashboard datasets for one page and prints KPI cards,
/// breakdowns and monthly series as markdown tables.
#[derive(Parser, Debug)]
#[command(name = "kpi-report")]
#[command(version)]
#[command(about = "Operational KPI dashboard in the terminal", long_about = None)]
pub struct Cli {
    /// TOML settings file
    #[arg(short, long, env = "KPI_REPORT_CONFIG")]
    pub config: Option<PathBuf>,

    /// Directory holding <Dataset>.csv exports
    #[arg(short, long, env = "KPI_REPORT_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Use generated data only, even if a data directory is configured
    #[arg(long)]
    pub mock: bool,

    /// Seed for generated data
    #[arg(long)]
    pub seed: Option<u64>,

    /// Page to render
    #[arg(short, long, default_value = "main")]
    pub page: Page,

    /// Month to include (YYYY-MM); repeat for several. Default: all months
    #[arg(short, long = "month")]
    pub months: Vec<Month>,

    /// Department to include; repeat for several. Default: all departments
    #[arg(long = "department")]
    pub departments: Vec<String>,

    /// Write the page's filtered datasets as CSV samples into this directory
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Rows per dataset in CSV samples
    #[arg(long)]
    pub export_limit: Option<usize>,

    /// Also write the page report as JSON
    #[arg(long)]
    pub json: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_repeated_filters() {
        let cli = Cli::try_parse_from([
            "kpi-report",
            "--page",
            "workforce-productivity",
            "-m",
            "2025-01",
            "--month",
            "2025-02",
            "--department",
            "HR",
            "--mock",
        ])
        .unwrap();
        assert_eq!(cli.page, Page::WorkforceProductivity);
        assert_eq!(cli.months.len(), 2);
        assert_eq!(cli.departments, vec!["HR".to_string()]);
        assert!(cli.mock);
    }

    #[test]
    fn rejects_bad_month() {
        assert!(Cli::try_parse_from(["kpi-report", "--month", "Jan"]).is_err());
    }

    #[test]
    fn defaults_to_main_page() {
        let cli = Cli::try_parse_from(["kpi-report"]).unwrap();
        assert_eq!(cli.page, Page::Main);
        assert!(cli.months.is_empty());
    }
}
