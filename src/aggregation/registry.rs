use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use super::{
    window_capacity, RegistryConfig, StatsSnapshot, WindowAggregator, MAX_WINDOW_EXPONENT,
    MIN_WINDOW_EXPONENT,
};
use crate::error::{Result, StatsError};

/// The per-exponent windows for one symbol, behind the symbol's exclusivity
/// guard. Ingest and query both take the same mutex, so a query never
/// observes a partially applied batch.
#[derive(Debug)]
struct SymbolEntry {
    windows: Mutex<Vec<WindowAggregator>>,
}

impl SymbolEntry {
    fn new() -> Self {
        let windows = (MIN_WINDOW_EXPONENT..=MAX_WINDOW_EXPONENT)
            .map(|k| WindowAggregator::new(window_capacity(k)))
            .collect();
        Self {
            windows: Mutex::new(windows),
        }
    }
}

/// Registry of per-symbol sliding-window aggregators.
///
/// Each registered symbol owns eight [`WindowAggregator`]s with capacities
/// 10^1 through 10^8. Operations on the same symbol are serialized by that
/// symbol's mutex; operations on different symbols contend only on the outer
/// map lock, which is held just long enough to look up or create an entry,
/// never across batch or query work. Symbols are never removed once
/// registered.
#[derive(Debug)]
pub struct SymbolRegistry {
    entries: RwLock<HashMap<String, Arc<SymbolEntry>>>,
    max_symbols: usize,
}

impl SymbolRegistry {
    /// Create an empty registry.
    pub fn new(config: RegistryConfig) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            max_symbols: config.max_symbols,
        }
    }

    /// Ingest a batch of observations for `symbol`, in arrival order, into
    /// all of its windows.
    ///
    /// Registers the symbol on first ingestion. If that registration would
    /// exceed the distinct-symbol cap, fails with
    /// [`StatsError::MaxSymbolsReached`] and leaves the registry unchanged.
    /// Values are expected to be finite (the service boundary validates
    /// them), so a started batch always applies fully to every window.
    pub fn ingest(&self, symbol: &str, values: &[f64]) -> Result<()> {
        let entry = self.entry_or_create(symbol)?;

        let mut windows = entry.windows.lock();
        for &value in values {
            for window in windows.iter_mut() {
                window.add(value);
            }
        }
        debug!(symbol, batch_size = values.len(), "ingested batch");
        Ok(())
    }

    /// Statistics for `symbol` over its last 10^k observations.
    ///
    /// Fails with [`StatsError::InvalidWindowExponent`] for `k` outside
    /// [1, 8] and [`StatsError::SymbolNotFound`] for an unregistered symbol
    /// or a window with no observations. Never registers a symbol.
    pub fn query(&self, symbol: &str, k: u32) -> Result<StatsSnapshot> {
        if !(MIN_WINDOW_EXPONENT..=MAX_WINDOW_EXPONENT).contains(&k) {
            return Err(StatsError::InvalidWindowExponent { k });
        }

        let entry = self
            .entries
            .read()
            .get(symbol)
            .cloned()
            .ok_or_else(|| StatsError::SymbolNotFound(symbol.to_string()))?;

        let windows = entry.windows.lock();
        windows
            .get((k - MIN_WINDOW_EXPONENT) as usize)
            .and_then(|window| window.snapshot())
            // Registration always ingests at least one batch, so an empty
            // window means the symbol effectively has no data.
            .ok_or_else(|| StatsError::SymbolNotFound(symbol.to_string()))
    }

    /// Number of symbols registered so far.
    pub fn symbol_count(&self) -> usize {
        self.entries.read().len()
    }

    /// Configured cap on distinct symbols.
    pub fn max_symbols(&self) -> usize {
        self.max_symbols
    }

    // Atomic get-or-create: the fast path takes the read lock; creation
    // re-checks under the write lock, so two concurrent first ingests for
    // the same new symbol cannot both create its entry or miscount the cap.
    fn entry_or_create(&self, symbol: &str) -> Result<Arc<SymbolEntry>> {
        if let Some(entry) = self.entries.read().get(symbol) {
            return Ok(Arc::clone(entry));
        }

        let mut entries = self.entries.write();
        if let Some(entry) = entries.get(symbol) {
            return Ok(Arc::clone(entry));
        }
        if entries.len() >= self.max_symbols {
            warn!(symbol, limit = self.max_symbols, "symbol cap reached");
            return Err(StatsError::MaxSymbolsReached {
                limit: self.max_symbols,
            });
        }

        let entry = Arc::new(SymbolEntry::new());
        entries.insert(symbol.to_string(), Arc::clone(&entry));
        info!(symbol, "registered new symbol");
        Ok(entry)
    }
}

impl Default for SymbolRegistry {
    fn default() -> Self {
        Self::new(RegistryConfig::default())
    }
}
