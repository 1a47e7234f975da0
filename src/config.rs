// Optional TOML settings file. Command-line flags override whatever is set
// here; anything unset falls back to `Config::default()`.
use crate::error::{KpiError, Result};
use crate::types::Month;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_EXPORT_LIMIT: usize = 100;
pub const DEFAULT_MOCK_SEED: u64 = 42;
pub const DEFAULT_MOCK_MONTHS: u32 = 6;

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Directory holding `<Dataset>.csv` exports.
    pub data_dir: Option<PathBuf>,
    pub mock_seed: u64,
    /// Last month of generated mock data.
    pub mock_anchor: Month,
    pub mock_months: u32,
    /// Rows per dataset written by `--export-dir`.
    pub export_limit: usize,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            data_dir: None,
            mock_seed: DEFAULT_MOCK_SEED,
            mock_anchor: Month::new(2025, 6).unwrap_or_default(),
            mock_months: DEFAULT_MOCK_MONTHS,
            export_limit: DEFAULT_EXPORT_LIMIT,
        }
    }
}

impl Config {
    pub fn parse(contents: &str) -> Result<Config> {
        let config: Config = toml::from_str(contents).map_err(|e| KpiError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Config> {
        let contents = fs::read_to_string(path)?;
        let config = Self::parse(&contents)?;
        debug!("loaded config from {}", path.display());
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.mock_months == 0 {
            return Err(KpiError::Config("mock_months must be at least 1".into()));
        }
        if self.export_limit == 0 {
            return Err(KpiError::Config("export_limit must be at least 1".into()));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_file_gives_defaults() {
        assert_eq!(Config::parse("").unwrap(), Config::default());
    }

    #[test]
    fn parses_all_fields() {
        let config = Config::parse(
            r#"
            data_dir = "kpi_exports"
            mock_seed = 7
            mock_anchor = "2024-12"
            mock_months = 12
            export_limit = 25
            "#,
        )
        .unwrap();
        assert_eq!(config.data_dir, Some(PathBuf::from("kpi_exports")));
        assert_eq!(config.mock_seed, 7);
        assert_eq!(config.mock_anchor, Month::new(2024, 12).unwrap());
        assert_eq!(config.mock_months, 12);
        assert_eq!(config.export_limit, 25);
    }

    #[test]
    fn rejects_unknown_keys_and_bad_values() {
        assert!(matches!(Config::parse("colour = \"blue\""), Err(KpiError::Config(_))));
        assert!(matches!(Config::parse("mock_months = 0"), Err(KpiError::Config(_))));
        assert!(Config::parse("mock_anchor = \"someday\"").is_err());
    }
}
