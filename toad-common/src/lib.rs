//! # TOAD Common Library
//!
//! Shared code for the TOAD session tools including:
//! - Error types
//! - Configuration loading (TOML file, environment, compiled defaults)
//! - Logging setup

pub mod config;
pub mod error;
pub mod logging;

pub use config::{LoggingConfig, ScanConfig, TomlConfig};
pub use error::{Error, Result};
