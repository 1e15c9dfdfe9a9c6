//! Configuration Management
//!
//! Optional defaults for awscensus, read from the user's config directory.
//! Command line options always win over values found here.

use serde::Deserialize;
use std::path::PathBuf;

/// User configuration
#[derive(Debug, Clone, Deserialize, Default, PartialEq, Eq)]
pub struct Config {
    /// Credential profile used when neither keys nor --profile are given
    #[serde(default)]
    pub profile: Option<String>,
    /// Only count resources in these regions
    #[serde(default)]
    pub regions: Vec<String>,
    /// Log level used when --log-level is not given
    #[serde(default)]
    pub log_level: Option<String>,
}

impl Config {
    /// Get the config file path
    pub fn config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("awscensus").join("config.json"))
    }

    /// Load configuration from disk
    pub fn load() -> Self {
        let Some(path) = Self::config_path() else {
            return Self::default();
        };

        if !path.exists() {
            return Self::default();
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => Self::parse(&content),
            Err(_) => Self::default(),
        }
    }

    /// Parse configuration, falling back to defaults on malformed input
    pub fn parse(content: &str) -> Self {
        serde_json::from_str(content).unwrap_or_default()
    }

    /// Get effective profile (CLI > config)
    pub fn effective_profile(&self, cli: Option<&str>) -> Option<String> {
        cli.map(|p| p.to_string()).or_else(|| self.profile.clone())
    }

    /// Get effective region allowlist (CLI > config)
    pub fn effective_regions(&self, cli: &[String]) -> Vec<String> {
        if cli.is_empty() {
            self.regions.clone()
        } else {
            cli.to_vec()
        }
    }
}
