use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// Default content authority for the weather provider.
pub const DEFAULT_AUTHORITY: &str = "com.example.weatherforecast";

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    /// Add an error
    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Add a warning
    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a message summarizing all errors
    pub fn error_summary(&self) -> String {
        if self.errors.is_empty() {
            return String::new();
        }
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Directory holding the weather database
    pub data_dir: PathBuf,

    /// Provider settings
    #[serde(default)]
    pub provider: ProviderConfig,

    /// Logging settings
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// How item URIs are scoped to their row identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum ScopingMode {
    /// Item URIs always filter on the row identifier.
    #[default]
    Strict,
    /// Item URIs only filter on the row identifier when a selection was
    /// supplied, and item deletes are rejected.
    Legacy,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProviderConfig {
    /// Content authority the provider answers for
    #[serde(default = "default_authority")]
    pub authority: String,

    /// Database file name inside `data_dir`
    #[serde(default = "default_database_file")]
    pub database_file: String,

    /// Row-identifier scoping for item URIs
    #[serde(default)]
    pub scoping: ScopingMode,
}

fn default_authority() -> String {
    DEFAULT_AUTHORITY.to_string()
}

fn default_database_file() -> String {
    "weather.db".to_string()
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            authority: default_authority(),
            database_file: default_database_file(),
            scoping: ScopingMode::default(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Fallback `tracing` filter when `RUST_LOG` is unset
    #[serde(default = "default_log_filter")]
    pub filter: String,
}

fn default_log_filter() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            filter: default_log_filter(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("forecast");

        Self {
            data_dir,
            provider: ProviderConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from the default location, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if it doesn't exist
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            let config = Self::default();
            config.save_to(path)?;
            return Ok(config);
        }

        let contents = std::fs::read_to_string(path).context("Failed to read config file")?;

        let config: Config =
            toml::from_str(&contents).map_err(|e| ConfigError::ParseError(e.to_string()))?;

        Ok(config)
    }

    /// Validate, logging warnings and failing on errors
    pub fn ensure_valid(&self) -> Result<ValidationResult> {
        let validation = self.validate();

        if !validation.is_valid() {
            return Err(ConfigError::Invalid(validation.error_summary()).into());
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok(validation)
    }

    /// Validate the configuration
    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        let authority = &self.provider.authority;
        if authority.is_empty() {
            result.add_error("provider.authority", "Authority must not be empty");
        } else if authority.contains('/') || authority.chars().any(char::is_whitespace) {
            result.add_error(
                "provider.authority",
                format!("Authority must not contain '/' or whitespace: {}", authority),
            );
        }

        let file = &self.provider.database_file;
        if file.is_empty() {
            result.add_error("provider.database_file", "Database file name must not be empty");
        } else if file.contains('/') || file.contains('\\') {
            result.add_error(
                "provider.database_file",
                "Database file must be a plain file name, not a path",
            );
        }

        if self.provider.scoping == ScopingMode::Legacy {
            result.add_warning(
                "provider.scoping",
                "Legacy scoping: item URIs ignore their id without a selection and item deletes fail",
            );
        }

        if self.data_dir.exists() && !self.data_dir.is_dir() {
            result.add_error(
                "data_dir",
                format!("Path is not a directory: {}", self.data_dir.display()),
            );
        }

        result
    }

    /// Full path of the weather database
    pub fn database_path(&self) -> PathBuf {
        self.data_dir.join(&self.provider.database_file)
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(path, contents).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the path to the configuration file
    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("forecast");

        Ok(config_dir.join("config.toml"))
    }
}
