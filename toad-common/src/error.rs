//! Common error types for TOAD

use thiserror::Error;

/// Common result type for TOAD operations
pub type Result<T> = std::result::Result<T, Error>;

/// Common error types across TOAD crates
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration loading or validation error
    #[error("Configuration error: {0}")]
    Config(String),
}
