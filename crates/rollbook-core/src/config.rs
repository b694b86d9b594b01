//! Configuration for catalog locations and matching behaviour.
//!
//! Configuration can be loaded from:
//! - TOML files (default: ~/.config/rollbook/rollbook.toml)
//! - Environment variables (ROLLBOOK_* prefixed)
//!
//! # Example
//!
//! ```rust,no_run
//! use rollbook_core::config::RollbookConfig;
//!
//! // Load from default path or fall back to env vars
//! let config = RollbookConfig::load().expect("Failed to load config");
//!
//! // Or explicitly from a file
//! let config = RollbookConfig::from_file(std::path::Path::new("rollbook.toml")).expect("Failed to load");
//! ```
//!
//! # TOML layout
//!
//! ```toml
//! [catalog]
//! system_catalog_path = "/usr/share/rollbook/catalog.json"
//! overlay_path = "/home/me/.config/rollbook/overlay.json"
//!
//! [matching]
//! threshold = 0.5
//! position_name_weight = 1.0
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

use crate::defaults;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("Invalid value for {key}: {value}")]
    InvalidValue { key: String, value: String },

    #[error("Validation error: {0}")]
    Validation(String),
}

pub type ConfigResult<T> = Result<T, ConfigError>;

impl From<ConfigError> for crate::Error {
    fn from(e: ConfigError) -> Self {
        crate::Error::Config(e.to_string())
    }
}

/// Where the catalogs live.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogConfig {
    /// JSON file holding the fixed system catalog.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub system_catalog_path: Option<PathBuf>,
    /// JSON file holding the user overlay.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overlay_path: Option<PathBuf>,
}

impl CatalogConfig {
    /// Overlay path, falling back to `overlay.json` next to the config file.
    pub fn overlay_path_or_default(&self) -> PathBuf {
        self.overlay_path.clone().unwrap_or_else(|| {
            let mut path = RollbookConfig::config_dir();
            path.push(defaults::OVERLAY_FILE_NAME);
            path
        })
    }
}

/// Threshold and key weights for the entity matchers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MatchingConfig {
    /// Maximum accepted distance; candidates beyond it are rejected.
    pub threshold: f32,
    pub position_name_weight: f32,
    pub position_slug_weight: f32,
    pub position_path_weight: f32,
    pub technique_name_weight: f32,
    pub technique_alias_weight: f32,
    pub technique_path_weight: f32,
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: defaults::MATCH_THRESHOLD,
            position_name_weight: defaults::POSITION_NAME_WEIGHT,
            position_slug_weight: defaults::POSITION_SLUG_WEIGHT,
            position_path_weight: defaults::POSITION_PATH_WEIGHT,
            technique_name_weight: defaults::TECHNIQUE_NAME_WEIGHT,
            technique_alias_weight: defaults::TECHNIQUE_ALIAS_WEIGHT,
            technique_path_weight: defaults::TECHNIQUE_PATH_WEIGHT,
        }
    }
}

impl MatchingConfig {
    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        // Distance 1.0 would surface as a score-0 match.
        if !(self.threshold > 0.0 && self.threshold < 1.0) {
            return Err(ConfigError::Validation(format!(
                "matching.threshold must be in (0, 1), got: {}",
                self.threshold
            )));
        }

        let weights = [
            ("position_name_weight", self.position_name_weight),
            ("position_slug_weight", self.position_slug_weight),
            ("position_path_weight", self.position_path_weight),
            ("technique_name_weight", self.technique_name_weight),
            ("technique_alias_weight", self.technique_alias_weight),
            ("technique_path_weight", self.technique_path_weight),
        ];
        for (key, weight) in weights {
            if !(weight > 0.0 && weight.is_finite()) {
                return Err(ConfigError::Validation(format!(
                    "matching.{} must be positive, got: {}",
                    key, weight
                )));
            }
        }

        Ok(())
    }
}

/// Main rollbook configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RollbookConfig {
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub matching: MatchingConfig,
}

impl RollbookConfig {
    /// Directory holding the config file and, by default, the overlay.
    ///
    /// Returns: ~/.config/rollbook
    pub fn config_dir() -> PathBuf {
        let mut path = dirs::config_dir().unwrap_or_else(|| PathBuf::from(".config"));
        path.push(defaults::CONFIG_DIR_NAME);
        path
    }

    /// Get the default config file path.
    ///
    /// Returns: ~/.config/rollbook/rollbook.toml
    pub fn default_config_path() -> PathBuf {
        let mut path = Self::config_dir();
        path.push(defaults::CONFIG_FILE_NAME);
        path
    }

    /// Load configuration from the default path, falling back to environment variables.
    pub fn load() -> ConfigResult<Self> {
        let path = Self::default_config_path();

        if path.exists() {
            info!("Loading rollbook config from: {}", path.display());
            Self::from_file(&path)
        } else {
            debug!(
                "Config file not found at {}, using environment variables",
                path.display()
            );
            Self::from_env()
        }
    }

    /// Load configuration from a TOML file.
    pub fn from_file(path: &Path) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration from TOML text.
    pub fn from_toml_str(content: &str) -> ConfigResult<Self> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from environment variables.
    ///
    /// - `ROLLBOOK_SYSTEM_CATALOG`: system catalog JSON path
    /// - `ROLLBOOK_OVERLAY_PATH`: overlay JSON path
    /// - `ROLLBOOK_MATCH_THRESHOLD`: maximum accepted distance
    pub fn from_env() -> ConfigResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> ConfigResult<Self> {
        let mut config = Self::default();

        if let Some(path) = lookup("ROLLBOOK_SYSTEM_CATALOG").filter(|v| !v.is_empty()) {
            config.catalog.system_catalog_path = Some(PathBuf::from(path));
        }
        if let Some(path) = lookup("ROLLBOOK_OVERLAY_PATH").filter(|v| !v.is_empty()) {
            config.catalog.overlay_path = Some(PathBuf::from(path));
        }
        if let Some(raw) = lookup("ROLLBOOK_MATCH_THRESHOLD") {
            config.matching.threshold =
                raw.trim()
                    .parse()
                    .map_err(|_| ConfigError::InvalidValue {
                        key: "ROLLBOOK_MATCH_THRESHOLD".to_string(),
                        value: raw.clone(),
                    })?;
        }

        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> ConfigResult<()> {
        self.matching.validate()
    }
}
