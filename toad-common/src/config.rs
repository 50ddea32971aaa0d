//! Configuration loading and config file resolution
//!
//! Resolution priority for the config file:
//! 1. Command-line argument (highest priority)
//! 2. `TOAD_CONFIG` environment variable
//! 3. `<config_dir>/toad/config.toml`
//! 4. Compiled defaults (fallback)
//!
//! A missing or unreadable config file is not fatal: a warning is logged and
//! the compiled defaults are used.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tracing::{debug, info, warn};

/// Environment variable naming an explicit config file
pub const CONFIG_ENV_VAR: &str = "TOAD_CONFIG";

/// Extension of raw per-slice files written by the scanner
pub const DEFAULT_RAW_EXTENSION: &str = "dcm";

/// Name prefix of per-echo sub-directories
pub const DEFAULT_ECHO_MARKER: &str = "echo_";

/// Rules used to classify an acquisition directory tree
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanConfig {
    /// File extension (without dot) identifying a raw slice file
    pub raw_extension: String,
    /// Directory name prefix identifying one echo of a multi-echo run
    pub echo_marker: String,
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            raw_extension: DEFAULT_RAW_EXTENSION.to_string(),
            echo_marker: DEFAULT_ECHO_MARKER.to_string(),
        }
    }
}

impl ScanConfig {
    /// Normalize and validate the scan rules
    ///
    /// A leading dot on the extension is stripped (`.dcm` → `dcm`).
    pub fn validated(mut self) -> Result<Self> {
        self.raw_extension = self.raw_extension.trim().trim_start_matches('.').to_string();
        self.echo_marker = self.echo_marker.trim().to_string();

        if self.raw_extension.is_empty() {
            return Err(Error::Config("scan.raw_extension must not be empty".to_string()));
        }
        if self.echo_marker.is_empty() {
            return Err(Error::Config("scan.echo_marker must not be empty".to_string()));
        }
        if self.echo_marker.contains(['/', '\\']) {
            return Err(Error::Config(format!(
                "scan.echo_marker must be a plain name, got {:?}",
                self.echo_marker
            )));
        }

        Ok(self)
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default log level when `RUST_LOG` is not set
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

/// TOML configuration file contents
///
/// Every section is optional; absent keys fall back to compiled defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TomlConfig {
    pub scan: ScanConfig,
    pub logging: LoggingConfig,
}

impl TomlConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: TomlConfig =
            toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))?;
        Ok(Self {
            scan: config.scan.validated()?,
            logging: config.logging,
        })
    }
}

/// Resolves which config file to use and loads it with graceful degradation
#[derive(Debug, Clone)]
pub struct ConfigResolver {
    cli_path: Option<PathBuf>,
}

impl ConfigResolver {
    pub fn new(cli_path: Option<PathBuf>) -> Self {
        Self { cli_path }
    }

    /// Find the config file path following the priority order
    ///
    /// Returns `None` when no candidate exists, meaning compiled defaults apply.
    pub fn resolve_path(&self) -> Option<PathBuf> {
        // Priority 1: Command-line argument
        if let Some(path) = &self.cli_path {
            return Some(path.clone());
        }

        // Priority 2: Environment variable
        if let Ok(path) = std::env::var(CONFIG_ENV_VAR) {
            if !path.is_empty() {
                return Some(PathBuf::from(path));
            }
        }

        // Priority 3: Platform config directory
        default_config_path().filter(|path| path.exists())
    }

    /// Load configuration, falling back to defaults when no file is usable
    ///
    /// Only a file that exists but cannot be parsed or validated is an error.
    pub fn load(&self) -> Result<TomlConfig> {
        let Some(path) = self.resolve_path() else {
            debug!("No config file found, using compiled defaults");
            return Ok(TomlConfig::default());
        };

        if !path.exists() {
            warn!(
                "Config file {} not found, using compiled defaults",
                path.display()
            );
            return Ok(TomlConfig::default());
        }

        let content = match std::fs::read_to_string(&path) {
            Ok(content) => content,
            Err(e) => {
                warn!(
                    "Cannot read config file {}: {} (using compiled defaults)",
                    path.display(),
                    e
                );
                return Ok(TomlConfig::default());
            }
        };

        let config = TomlConfig::from_toml_str(&content)?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

/// Platform config file location: `<config_dir>/toad/config.toml`
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("toad").join("config.toml"))
}
