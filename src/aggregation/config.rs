/// Configuration for the symbol registry
#[derive(Debug, Clone)]
pub struct RegistryConfig {
    /// Maximum number of distinct symbols the registry will ever register
    pub max_symbols: usize,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self { max_symbols: 10 }
    }
}
