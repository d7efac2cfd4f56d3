//! Error types for the signal engine
//!
//! Only genuine faults live here. Per-symbol skips (missing data, too few
//! samples, low accuracy) are modelled as [`crate::engine::SkipReason`] and
//! never surface as an `EngineError`.

use thiserror::Error;

/// Crate-wide result alias
pub type Result<T> = std::result::Result<T, EngineError>;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
