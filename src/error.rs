/// Error types for the rolling statistics service
use thiserror::Error;

use crate::aggregation::{MAX_WINDOW_EXPONENT, MIN_WINDOW_EXPONENT};

/// Main error type for registry and service operations
#[derive(Error, Debug)]
pub enum StatsError {
    /// A lookup targeted a symbol that was never registered, or a window
    /// that has no observations
    #[error("Symbol {0} not found")]
    SymbolNotFound(String),

    /// Ingestion for a new symbol would exceed the distinct-symbol cap
    #[error("Maximum number of symbols ({limit}) reached")]
    MaxSymbolsReached {
        /// The registry's configured cap
        limit: usize,
    },

    /// Window exponent outside the supported range
    #[error(
        "Window size exponent (k={k}) must be between {min} and {max}",
        min = MIN_WINDOW_EXPONENT,
        max = MAX_WINDOW_EXPONENT
    )]
    InvalidWindowExponent {
        /// The rejected exponent
        k: u32,
    },

    /// Configuration is invalid or incomplete
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// IO operation failed
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for registry and service operations
pub type Result<T> = std::result::Result<T, StatsError>;
