use crate::models::instrument::InstrumentKind;

use super::frankfurter::FrankfurterProvider;
#[cfg(not(target_arch = "wasm32"))]
use super::yahoo_finance::YahooFinanceProvider;
use super::traits::MarketDataProvider;

/// Registry of all available market data providers.
///
/// Routes requests to the correct provider based on `InstrumentKind`.
pub struct ProviderRegistry {
    providers: Vec<Box<dyn MarketDataProvider>>,
}

impl ProviderRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            providers: Vec::new(),
        }
    }

    /// Create a registry with all default providers pre-configured.
    pub fn new_with_defaults() -> Self {
        let mut registry = Self::new();

        // Frankfurter: ECB exchange rates, no API key needed
        registry.register(Box::new(FrankfurterProvider::new()));

        // Yahoo Finance: stocks and ETFs, no API key needed
        // Not available on WASM (uses native reqwest/tokio connectors)
        #[cfg(not(target_arch = "wasm32"))]
        {
            match YahooFinanceProvider::new() {
                Ok(yahoo) => registry.register(Box::new(yahoo)),
                Err(e) => log::warn!("Yahoo Finance provider unavailable: {e}"),
            }
        }

        registry
    }

    /// Register a new provider.
    pub fn register(&mut self, provider: Box<dyn MarketDataProvider>) {
        self.providers.push(provider);
    }

    /// Find the first provider that supports the given kind.
    pub fn get_provider_for(&self, kind: InstrumentKind) -> Option<&dyn MarketDataProvider> {
        self.providers
            .iter()
            .find(|p| p.supported_kinds().contains(&kind))
            .map(|p| p.as_ref())
    }

    /// Return ALL providers that support the given kind, ordered by registration priority.
    /// Used for fallback: if the first provider fails, try the next one.
    pub fn get_providers_for(&self, kind: InstrumentKind) -> Vec<&dyn MarketDataProvider> {
        self.providers
            .iter()
            .filter(|p| p.supported_kinds().contains(&kind))
            .map(|p| p.as_ref())
            .collect()
    }

    pub fn len(&self) -> usize {
        self.providers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.providers.is_empty()
    }
}

impl Default for ProviderRegistry {
    fn default() -> Self {
        Self::new()
    }
}
