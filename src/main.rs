// Entry point and high-level CLI flow.
//
// - Settings come from an optional TOML file, overridden by flags.
// - Datasets are loaded once (CSV directory, falling back to generated data
//   per dataset) and cached for the rest of the run.
// - The selected page is rendered for the selected months/departments and
//   printed as markdown; CSV samples and a JSON report are optional.
mod cli;

use clap::Parser;
use cli::Cli;
use kpi_report::config::Config;
use kpi_report::filter::{filter, FilterSelection};
use kpi_report::format::format_int;
use kpi_report::loader::CsvSource;
use kpi_report::mock::MockSource;
use kpi_report::pages::{render_page, Page};
use kpi_report::source::{load_datasets, Datasets};
use kpi_report::{cache, output, Result};
use std::fs;
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

fn init_tracing(verbose: bool) {
    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Merge the settings file (if any) with command-line overrides.
fn resolve_config(cli: &Cli) -> Result<Config> {
    let mut config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(dir) = &cli.data_dir {
        config.data_dir = Some(dir.clone());
    }
    if let Some(seed) = cli.seed {
        config.mock_seed = seed;
    }
    if let Some(limit) = cli.export_limit {
        config.export_limit = limit.max(1);
    }
    Ok(config)
}

/// Start from "everything selected" and narrow to whatever was passed.
fn resolve_selection(cli: &Cli, data: &Datasets) -> FilterSelection {
    let mut selection = data.default_selection();
    if !cli.months.is_empty() {
        selection.months = cli.months.iter().copied().collect();
    }
    if !cli.departments.is_empty() {
        selection.departments = cli.departments.iter().cloned().collect();
    }
    selection
}

fn export_page(
    dir: &Path,
    page: Page,
    data: &Datasets,
    selection: &FilterSelection,
    limit: usize,
) -> Result<()> {
    fs::create_dir_all(dir)?;
    for dataset in page.datasets() {
        let table = filter(data.table(*dataset)?, selection);
        let path = dir.join(format!("{}.csv", dataset.name().to_lowercase()));
        let written = output::export_rows(&path, &table, limit)?;
        println!(
            "(Exported {} of {} rows to {})",
            format_int(written),
            format_int(table.len()),
            path.display()
        );
    }
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    let config = resolve_config(&cli)?;
    let mock = MockSource::new(config.mock_seed, config.mock_anchor, config.mock_months);

    let data = cache::global().get_or_load(|| match (&config.data_dir, cli.mock) {
        (Some(dir), false) => {
            info!("loading datasets from {}", dir.display());
            load_datasets(&CsvSource::new(dir), Some(&mock))
        }
        _ => {
            info!("using generated data (seed {})", config.mock_seed);
            load_datasets(&mock, None)
        }
    })?;

    let selection = resolve_selection(&cli, &data);
    println!(
        "(Filtered: {} months, {} departments)\n",
        format_int(selection.months.len()),
        if selection.departments.is_empty() {
            "all".to_string()
        } else {
            format_int(selection.departments.len())
        }
    );

    let report = render_page(cli.page, &data, &selection)?;
    output::print_page(&report);

    if let Some(dir) = &cli.export_dir {
        export_page(dir, cli.page, &data, &selection, config.export_limit)?;
    }
    if let Some(path) = &cli.json {
        output::write_json(path, &report)?;
        println!("(Page report written to {})", path.display());
    }
    Ok(())
}

fn main() {
    let cli = Cli::parse();
    init_tracing(cli.verbose);
    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
