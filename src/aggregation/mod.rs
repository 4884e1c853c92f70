use serde::{Deserialize, Serialize};

/// Fixed-capacity sliding window accumulator
pub mod window;
/// Per-symbol registry of window aggregators
pub mod registry;
/// Configuration types for the registry
pub mod config;

pub use config::RegistryConfig;
pub use registry::SymbolRegistry;
pub use window::WindowAggregator;

/// Smallest supported window exponent
pub const MIN_WINDOW_EXPONENT: u32 = 1;

/// Largest supported window exponent
pub const MAX_WINDOW_EXPONENT: u32 = 8;

/// Number of windows maintained per symbol
pub const WINDOW_COUNT: usize = (MAX_WINDOW_EXPONENT - MIN_WINDOW_EXPONENT + 1) as usize;

/// Window capacity for exponent `k`: the last 10^k observations
pub fn window_capacity(k: u32) -> usize {
    10usize.pow(k)
}

/// Rolling statistics for one window at one instant
///
/// Produced in O(1) from an aggregator's running state; `count` is the
/// number of observations currently held, at most the window capacity.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StatsSnapshot {
    /// Smallest value currently in the window
    pub min: f64,
    /// Largest value currently in the window
    pub max: f64,
    /// Most recently ingested value
    pub last: f64,
    /// Arithmetic mean of the window contents
    pub avg: f64,
    /// Population variance of the window contents
    pub var: f64,
    /// Number of observations currently in the window
    pub count: usize,
}
