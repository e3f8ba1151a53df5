//! Error types for the price level book
//!
//! Error taxonomy using thiserror. Malformed feed batches are contract
//! violations and are asserted, not reported here.

use thiserror::Error;

/// Top-level book error
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BookError {
    #[error("Config error: {0}")]
    Config(#[from] ConfigError),

    #[error("Feed error: {0}")]
    Feed(#[from] FeedError),
}

/// Configuration errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConfigError {
    #[error("Symbol must not be empty")]
    EmptySymbol,

    #[error("Source must not be empty")]
    EmptySource,

    #[error("Malformed config: {reason}")]
    Malformed { reason: String },
}

/// Upstream feed errors
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FeedError {
    #[error("Feed closed")]
    Closed,
}
