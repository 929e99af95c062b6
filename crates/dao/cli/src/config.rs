//! CLI configuration

use crate::error::{CliError, CliResult};
use dao_types::{DaoConfig, MemberId};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// CLI configuration, read from TOML
///
/// ```toml
/// admin = "deployer"
///
/// [dao]
/// name = "grants"
/// stakeholder_threshold = 100000000
/// min_vote_period_secs = 300
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CliConfig {
    /// Identity granted the admin tier at initialization
    pub admin: String,

    /// Engine configuration
    pub dao: DaoConfig,
}

impl Default for CliConfig {
    fn default() -> Self {
        Self {
            admin: "deployer".to_string(),
            dao: DaoConfig::default(),
        }
    }
}

impl CliConfig {
    /// Load configuration from file; a missing file yields the defaults
    pub fn load(path: Option<&str>) -> CliResult<Self> {
        let config_path = match path {
            Some(p) => PathBuf::from(p),
            None => Self::default_config_path()?,
        };

        let config = if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            Self::parse(&contents)?
        } else {
            CliConfig::default()
        };

        config
            .dao
            .validate()
            .map_err(|e| CliError::Config(e.to_string()))?;
        if config.admin.trim().is_empty() {
            return Err(CliError::Config("admin identity must not be empty".into()));
        }
        Ok(config)
    }

    pub fn parse(contents: &str) -> CliResult<Self> {
        toml::from_str(contents).map_err(|e| CliError::Config(e.to_string()))
    }

    pub fn admin(&self) -> MemberId {
        MemberId::new(self.admin.trim())
    }

    pub fn to_toml(&self) -> CliResult<String> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Get the default configuration file path
    fn default_config_path() -> CliResult<PathBuf> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| CliError::Config("Cannot find config directory".into()))?;
        Ok(config_dir.join("dao").join("config.toml"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use dao_types::Amount;

    #[test]
    fn test_default_config() {
        let config = CliConfig::default();
        assert_eq!(config.admin, "deployer");
        assert_eq!(config.dao.min_vote_period_secs, 300);
    }

    #[test]
    fn test_load_missing_config() {
        // Should return default config when file doesn't exist
        let config = CliConfig::load(Some("/nonexistent/path/config.toml")).unwrap();
        assert_eq!(config.admin, "deployer");
    }

    #[test]
    fn test_parse_partial() {
        let config = CliConfig::parse(
            r#"
            admin = "founder"

            [dao]
            stakeholder_threshold = 500
            "#,
        )
        .unwrap();

        assert_eq!(config.admin(), MemberId::new("founder"));
        assert_eq!(config.dao.stakeholder_threshold, Amount::new(500));
        assert_eq!(config.dao.min_vote_period_secs, 300);
    }

    #[test]
    fn test_toml_roundtrip() {
        let config = CliConfig::default();
        let text = config.to_toml().unwrap();
        let parsed = CliConfig::parse(&text).unwrap();
        assert_eq!(parsed.dao.name, config.dao.name);
        assert_eq!(parsed.dao.stakeholder_threshold, config.dao.stakeholder_threshold);
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            CliConfig::parse("admin = "),
            Err(CliError::Config(_))
        ));
    }
}
