//! Rolling statistics service for streaming per-symbol market data
//!
//! This library maintains running statistics (min, max, last, mean, variance,
//! count) over eight sliding windows per symbol, sized 10^1 through 10^8 most
//! recent observations. Updates and queries are O(1) against running
//! accumulators; the only non-constant path is the extrema rescan when an
//! evicted value was the current min or max.
//!
//! # Example
//!
//! ```
//! use tickstats::{RegistryConfig, SymbolRegistry};
//!
//! # fn example() -> tickstats::Result<()> {
//! let registry = SymbolRegistry::new(RegistryConfig::default());
//!
//! registry.ingest("AAPL", &[142.35, 144.50, 143.75])?;
//!
//! // Statistics over the last 10^1 observations.
//! let snapshot = registry.query("AAPL", 1)?;
//! assert_eq!(snapshot.count, 3);
//! assert_eq!(snapshot.last, 143.75);
//! # Ok(())
//! # }
//! # example().unwrap();
//! ```

#![warn(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]

// Re-export commonly used items
pub use aggregation::{
    window_capacity, RegistryConfig, StatsSnapshot, SymbolRegistry, WindowAggregator,
    MAX_WINDOW_EXPONENT, MIN_WINDOW_EXPONENT,
};
pub use error::{Result, StatsError};

/// Sliding-window aggregation engine
pub mod aggregation;

/// Error types
pub mod error;

/// HTTP service layer with Tokio integration
pub mod service;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Initialize the tracing subscriber with default settings
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer().json())
        .init();
}
