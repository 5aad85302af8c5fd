//! Error types for foldable raster statistics
//!
//! Provides a unified error type for all tilestat crates. Every variant is a
//! configuration or precondition failure; nothing here is transient.

use thiserror::Error;

/// Core error type for aggregate construction and folding
#[derive(Error, Debug)]
pub enum Error {
    /// Invalid parameter provided to a constructor (e.g. a log base <= 1)
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    /// Malformed bucketing-strategy descriptor or unknown strategy/key
    #[error("Invalid descriptor: {0}")]
    InvalidDescriptor(String),

    /// Two aggregates that cannot be folded together
    #[error("Incompatible aggregates: {0}")]
    Incompatible(String),

    /// Invalid input data, e.g. a sample with the wrong number of components
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Serialization error at the persistence boundary
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Other errors
    #[error("Other error: {0}")]
    Other(#[from] anyhow::Error),
}

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

// Helper functions for common error patterns

impl Error {
    /// Create an error for size mismatch
    pub fn size_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::InvalidInput(format!(
            "Size mismatch in {context}: expected {expected}, got {actual}"
        ))
    }

    /// Create an error for folding operands with differing component counts
    pub fn component_mismatch(expected: usize, actual: usize, context: &str) -> Self {
        Self::Incompatible(format!(
            "{context}: component counts differ: {expected} vs {actual}"
        ))
    }

    /// Create an error for folding operands built with different strategies
    pub fn incompatible_strategies(context: &str, ours: &str, theirs: &str) -> Self {
        Self::Incompatible(format!(
            "{context}: bucketing strategies differ: {ours} vs {theirs}"
        ))
    }
}
