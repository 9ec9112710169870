//! Configuration management for the model loader

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::path::Path;

/// Default location of the configuration file
pub const DEFAULT_CONFIG_PATH: &str = "config/config.toml";

/// Main application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Model and runtime configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ModelConfig {
    /// Serialized ONNX model file
    #[serde(default = "default_model_path")]
    pub path: String,
    /// Number of intra-op threads per session (default: 1)
    #[serde(default = "default_intra_threads")]
    pub intra_threads: usize,
    /// Graph optimization level, 0 (disabled) to 3 (all)
    #[serde(default = "default_optimization_level")]
    pub optimization_level: u8,
}

fn default_model_path() -> String {
    "models/policy.onnx".to_string()
}

fn default_intra_threads() -> usize {
    1
}

fn default_optimization_level() -> u8 {
    3
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            path: default_model_path(),
            intra_threads: default_intra_threads(),
            optimization_level: default_optimization_level(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (json, pretty)
    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl AppConfig {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        Self::load_from_path(DEFAULT_CONFIG_PATH)
    }

    /// Load from `path` when given. Otherwise load the default file if it
    /// exists, falling back to built-in defaults.
    ///
    /// An explicit path that does not exist is an error.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load_from_path(path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => Self::load(),
            None => Ok(Self::default()),
        }
    }

    /// Load configuration from a specific path.
    ///
    /// Values can be overridden from the environment, e.g.
    /// `POLICY_LOADER__MODEL__PATH=/tmp/q.onnx`.
    pub fn load_from_path<P: AsRef<Path>>(path: P) -> Result<Self> {
        let config = Config::builder()
            .add_source(File::from(path.as_ref()))
            .add_source(Environment::with_prefix("POLICY_LOADER").separator("__"))
            .build()
            .context("Failed to build configuration")?;

        config
            .try_deserialize()
            .context("Failed to deserialize configuration")
    }
}
