//! TOML-based configuration for gaarf.
//!
//! Supports a config file (gaarf.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [schema]
//! path = "${GAARF_HOME}/schema/v14.json"
//!
//! [macros]
//! start_date = ":YYYYMMDD-7"
//! end_date = ":YYYYMMDD-1"
//! min_clicks = 10
//!
//! [template]
//! metrics = "metrics.clicks,metrics.impressions"
//!
//! [retry]
//! strategy = "exponential"
//! base_delay_ms = 500
//! max_attempts = 5
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use crate::macros::MacroMap;
use crate::retry::{DelayStrategy, RetryOptions, DEFAULT_BASE_DELAY_MS};
use crate::template::TemplateParams;

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "GAARF_CONFIG";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Schema descriptor location.
    pub schema: SchemaSettings,

    /// Default macro values; command-line macros override these.
    pub macros: MacroMap,

    /// Default template parameters; command-line params override these.
    pub template: TemplateParams,

    /// Retry policy for schema loading and remote calls.
    pub retry: RetrySettings,
}

/// Schema descriptor settings.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct SchemaSettings {
    /// Path to the JSON schema descriptor (supports ${ENV_VAR} expansion).
    pub path: Option<String>,
}

impl SchemaSettings {
    /// The schema path with environment variables expanded.
    pub fn resolved_path(&self) -> Result<Option<PathBuf>, SettingsError> {
        self.path
            .as_deref()
            .map(|p| expand_env_vars(p).map(PathBuf::from))
            .transpose()
    }
}

/// Retry settings.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RetrySettings {
    /// Delay strategy: "none", "constant", "linear" or "exponential".
    pub strategy: String,

    /// Base delay in milliseconds.
    pub base_delay_ms: u64,

    /// Give up after this many attempts (unbounded when unset).
    pub max_attempts: Option<u32>,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            strategy: "none".to_string(),
            base_delay_ms: DEFAULT_BASE_DELAY_MS,
            max_attempts: None,
        }
    }
}

impl RetrySettings {
    /// Get the delay strategy.
    pub fn delay_strategy(&self) -> Result<DelayStrategy, SettingsError> {
        self.strategy
            .parse()
            .map_err(|e: crate::retry::UnknownDelayStrategy| SettingsError::InvalidConfig(e.to_string()))
    }

    /// Convert to options for [`crate::retry::with_retry`].
    pub fn to_options(&self) -> Result<RetryOptions, SettingsError> {
        if self.max_attempts == Some(0) {
            return Err(SettingsError::InvalidConfig(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        Ok(RetryOptions {
            base_delay_ms: self.base_delay_ms,
            delay_strategy: self.delay_strategy()?,
            max_attempts: self.max_attempts,
        })
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default config file locations.
    ///
    /// Searches in order:
    /// 1. Environment variable `GAARF_CONFIG`
    /// 2. `./gaarf.toml`
    /// 3. `~/.config/gaarf/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return Self::from_file(&path);
        }

        let local_config = PathBuf::from("gaarf.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("gaarf").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        Ok(Settings::default())
    }

    /// Config macros overlaid with `overrides` (overrides win).
    pub fn merged_macros(&self, overrides: MacroMap) -> MacroMap {
        let mut macros = self.macros.clone();
        macros.extend(overrides);
        macros
    }

    /// Config template params overlaid with `overrides` (overrides win).
    pub fn merged_template_params(&self, overrides: TemplateParams) -> TemplateParams {
        let mut params = self.template.clone();
        params.extend(overrides);
        params
    }
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax. A `$` not followed by a name is kept.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        let var_name: String = if chars.next_if_eq(&'{').is_some() {
            let name = std::iter::from_fn(|| chars.next_if(|&ch| ch != '}')).collect();
            chars.next_if_eq(&'}');
            name
        } else {
            std::iter::from_fn(|| chars.next_if(|&ch| ch.is_alphanumeric() || ch == '_')).collect()
        };

        if var_name.is_empty() {
            result.push('$');
            continue;
        }
        let value = env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
