//! Price history caching.

use std::collections::HashMap;
use std::sync::Arc;

use crossover_core::types::PriceHistory;

/// In-memory cache of full price histories keyed by upper-case symbol.
#[derive(Debug, Default)]
pub struct HistoryCache {
    cache: HashMap<String, Arc<PriceHistory>>,
}

impl HistoryCache {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    fn key(symbol: &str) -> String {
        symbol.to_ascii_uppercase()
    }

    /// Get a cached history.
    pub fn get(&self, symbol: &str) -> Option<Arc<PriceHistory>> {
        self.cache.get(&Self::key(symbol)).cloned()
    }

    /// Store a history, returning the shared handle.
    pub fn put(&mut self, symbol: &str, history: PriceHistory) -> Arc<PriceHistory> {
        let history = Arc::new(history);
        self.cache.insert(Self::key(symbol), Arc::clone(&history));
        history
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_cache_is_case_insensitive() {
        let mut cache = HistoryCache::new();
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        cache.put("aapl", PriceHistory::from_closes("AAPL", start, &[1.0, 2.0]));

        assert_eq!(cache.get("AAPL").unwrap().len(), 2);
        assert!(cache.get("Aapl").is_some());
        assert!(cache.get("MSFT").is_none());
    }
}
