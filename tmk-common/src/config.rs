//! Configuration loading for the Test Monkey backend
//!
//! Each value resolves with the priority order:
//! 1. Command-line flag (highest priority)
//! 2. Environment variable (`TMK_*`)
//! 3. TOML config file
//! 4. Compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub const DEFAULT_PORT: u16 = 5731;
pub const DEFAULT_DATABASE_PATH: &str = "testmonkey.db";
pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
/// Summarization sweep interval: once every 24 hours.
pub const DEFAULT_SUMMARIZE_INTERVAL_SECS: u64 = 86_400;

/// Raw values as they appear in the TOML config file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TomlConfig {
    pub port: Option<u16>,
    pub database_path: Option<String>,
    pub anthropic_api_key: Option<String>,
    pub model: Option<String>,
    pub summarize_interval_secs: Option<u64>,
}

impl TomlConfig {
    /// Load and parse a TOML config file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!("Cannot read config file {}: {}", path.display(), e))
        })?;
        toml::from_str(&content)
            .map_err(|e| Error::Config(format!("Invalid TOML in {}: {}", path.display(), e)))
    }
}

/// Values the binary may pass down from its command line.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
    pub config_file: Option<PathBuf>,
    pub port: Option<u16>,
    pub database_path: Option<String>,
}

/// Fully resolved service configuration.
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    pub port: u16,
    pub database_path: String,
    pub anthropic_api_key: Option<String>,
    pub model: String,
    pub summarize_interval_secs: u64,
}

impl ServiceConfig {
    /// Resolve configuration from CLI > ENV > TOML > defaults.
    pub fn resolve(cli: &CliOverrides) -> Result<Self> {
        let toml_config = match &cli.config_file {
            Some(path) => TomlConfig::load(path)?,
            None => TomlConfig::default(),
        };
        Ok(Self::from_sources(cli, &toml_config))
    }

    /// Combine the three sources; separated from `resolve` so tests can
    /// supply a parsed TOML config directly.
    pub fn from_sources(cli: &CliOverrides, toml_config: &TomlConfig) -> Self {
        let port = cli
            .port
            .or_else(|| env_parse("TMK_PORT"))
            .or(toml_config.port)
            .unwrap_or(DEFAULT_PORT);

        let database_path = cli
            .database_path
            .clone()
            .or_else(|| env_string("TMK_DATABASE_PATH"))
            .or_else(|| toml_config.database_path.clone())
            .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string());

        let env_key = env_string("TMK_ANTHROPIC_API_KEY");
        if env_key.is_some() && toml_config.anthropic_api_key.is_some() {
            warn!("Anthropic API key found in both environment and TOML config; using environment");
        }
        let anthropic_api_key = env_key
            .or_else(|| toml_config.anthropic_api_key.clone())
            .filter(|key| !key.trim().is_empty());

        let model = env_string("TMK_MODEL")
            .or_else(|| toml_config.model.clone())
            .unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let summarize_interval_secs = env_parse("TMK_SUMMARIZE_INTERVAL_SECS")
            .or(toml_config.summarize_interval_secs)
            .unwrap_or(DEFAULT_SUMMARIZE_INTERVAL_SECS);

        Self {
            port,
            database_path,
            anthropic_api_key,
            model,
            summarize_interval_secs,
        }
    }

    /// Return the Anthropic API key or a configuration error telling the
    /// operator where to put one.
    pub fn require_anthropic_api_key(&self) -> Result<&str> {
        match self.anthropic_api_key.as_deref() {
            Some(key) => {
                info!("Anthropic API key configured");
                Ok(key)
            }
            None => Err(Error::Config(
                "Anthropic API key not configured. Please configure using one of:\n\
                 1. Environment: TMK_ANTHROPIC_API_KEY=your-key-here\n\
                 2. TOML config: anthropic_api_key = \"your-key\""
                    .to_string(),
            )),
        }
    }
}

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Option<T> {
    std::env::var(name).ok().and_then(|v| v.parse().ok())
}
