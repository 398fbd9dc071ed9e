//! Configuration module for gaarf.
//!
//! Handles the config file, environment variable expansion and defaults.

mod settings;

pub use settings::{
    expand_env_vars, RetrySettings, SchemaSettings, Settings, SettingsError, CONFIG_ENV_VAR,
};
