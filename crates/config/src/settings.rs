// User settings
// Loaded from ~/.config/shipcheck/settings.json

use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::DEFAULT_MAX_FILE_SIZE_MB;

/// Overrides the settings directory (mainly for tests and CI).
pub const ENV_CONFIG_DIR: &str = "SHIPCHECK_CONFIG_DIR";
/// Overrides `carriers.file`.
pub const ENV_CARRIERS: &str = "SHIPCHECK_CARRIERS";
/// Overrides `input.maxFileSizeMb`.
pub const ENV_MAX_FILE_SIZE_MB: &str = "SHIPCHECK_MAX_FILE_SIZE_MB";

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("cannot read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid settings in {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("{var}={value:?} is not valid: {message}")]
    InvalidEnv {
        var: &'static str,
        value: String,
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct Settings {
    // Carriers
    /// Approved carrier list. Defaults to `approved_carriers.json` next to
    /// the settings file.
    #[serde(rename = "carriers.file")]
    pub carriers_file: Option<PathBuf>,

    // Check
    #[serde(rename = "check.policyFile")]
    pub policy_file: Option<PathBuf>,

    // Input
    #[serde(rename = "input.maxFileSizeMb")]
    pub max_file_size_mb: u64,

    // Alerts
    #[serde(rename = "alert.threshold")]
    pub alert_threshold: Option<usize>,

    // Logging
    /// `tracing` filter used when `SHIPCHECK_LOG` is unset.
    #[serde(rename = "log.filter")]
    pub log_filter: Option<String>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            carriers_file: None,
            policy_file: None,
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            alert_threshold: None,
            log_filter: None,
        }
    }
}

impl Settings {
    /// Settings directory: `$SHIPCHECK_CONFIG_DIR`, else `<config_dir>/shipcheck`.
    pub fn config_dir() -> PathBuf {
        if let Some(dir) = std::env::var_os(ENV_CONFIG_DIR).filter(|d| !d.is_empty()) {
            return PathBuf::from(dir);
        }
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("shipcheck")
    }

    /// Get the settings file path
    pub fn config_path() -> PathBuf {
        Self::config_dir().join("settings.json")
    }

    /// Where the approved carrier list lives when `carriers.file` is unset.
    pub fn default_carriers_path() -> PathBuf {
        Self::config_dir().join("approved_carriers.json")
    }

    /// Load settings from the default location, apply environment
    /// overrides, and fall back to defaults when the file is missing.
    pub fn load() -> Result<Self, SettingsError> {
        let path = Self::config_path();
        let settings = if path.exists() {
            Self::load_from(&path)?
        } else {
            tracing::debug!(path = %path.display(), "no settings file, using defaults");
            Self::default()
        };
        settings.with_env(|key| std::env::var(key).ok())
    }

    /// Parse a settings file. Lines starting with `//` are comments.
    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        let contents = fs::read_to_string(path).map_err(|source| SettingsError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        let cleaned: String = contents
            .lines()
            .filter(|line| !line.trim().starts_with("//"))
            .collect::<Vec<_>>()
            .join("\n");

        serde_json::from_str(&cleaned).map_err(|e| SettingsError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })
    }

    /// Apply `SHIPCHECK_*` overrides, reading variables through `lookup`.
    pub fn with_env<F>(mut self, lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup(ENV_CARRIERS).filter(|v| !v.trim().is_empty()) {
            self.carriers_file = Some(PathBuf::from(path));
        }

        if let Some(value) = lookup(ENV_MAX_FILE_SIZE_MB) {
            self.max_file_size_mb =
                value
                    .trim()
                    .parse::<u64>()
                    .map_err(|e| SettingsError::InvalidEnv {
                        var: ENV_MAX_FILE_SIZE_MB,
                        value: value.clone(),
                        message: e.to_string(),
                    })?;
        }

        Ok(self)
    }

    /// Effective carrier list path.
    pub fn carriers_path(&self) -> PathBuf {
        self.carriers_file
            .clone()
            .unwrap_or_else(Self::default_carriers_path)
    }
}
