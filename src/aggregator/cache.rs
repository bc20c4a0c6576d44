//! Last-known-good snapshot cache.
//!
//! One slot per cached resource kind. A slot holds the most recent
//! successfully normalized payload: empty at startup, overwritten on
//! every success, and never expiring, so a populated slot can serve
//! arbitrarily stale data once every provider is down. Detail and OHLC
//! lookups are parameterized per asset and are not cached.

use std::sync::{Mutex, MutexGuard};

use tracing::warn;

use crate::models::{FearGreedIndex, GlobalMetrics, MarketEntry};

/// Cache of the last successful payload per resource kind.
#[derive(Default)]
pub struct SnapshotCache {
    markets: Mutex<Option<Vec<MarketEntry>>>,
    global: Mutex<Option<GlobalMetrics>>,
    fear_greed: Mutex<Option<FearGreedIndex>>,
}

impl SnapshotCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lock one slot, recovering from poison if necessary. A recovered
    /// slot at worst re-serves the previous payload.
    fn lock_slot<'a, T>(slot: &'a Mutex<Option<T>>, name: &str) -> MutexGuard<'a, Option<T>> {
        slot.lock().unwrap_or_else(|poisoned| {
            warn!("Cache slot '{}' mutex was poisoned, recovering", name);
            poisoned.into_inner()
        })
    }

    pub fn store_markets(&self, entries: &[MarketEntry]) {
        *Self::lock_slot(&self.markets, "markets") = Some(entries.to_vec());
    }

    pub fn markets(&self) -> Option<Vec<MarketEntry>> {
        Self::lock_slot(&self.markets, "markets").clone()
    }

    pub fn store_global(&self, metrics: &GlobalMetrics) {
        *Self::lock_slot(&self.global, "global") = Some(metrics.clone());
    }

    pub fn global(&self) -> Option<GlobalMetrics> {
        Self::lock_slot(&self.global, "global").clone()
    }

    pub fn store_fear_greed(&self, index: &FearGreedIndex) {
        *Self::lock_slot(&self.fear_greed, "fear_greed") = Some(index.clone());
    }

    pub fn fear_greed(&self) -> Option<FearGreedIndex> {
        Self::lock_slot(&self.fear_greed, "fear_greed").clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DataQuality;

    fn entry(id: &str, price: f64) -> MarketEntry {
        MarketEntry {
            id: id.to_string(),
            symbol: id.to_uppercase(),
            name: id.to_string(),
            image: String::new(),
            current_price: price,
            market_cap: 0.0,
            total_volume: 0.0,
            market_cap_rank: None,
            price_change_percentage_24h: 0.0,
            sparkline_7d: Vec::new(),
        }
    }

    #[test]
    fn test_slots_start_empty() {
        let cache = SnapshotCache::new();
        assert!(cache.markets().is_none());
        assert!(cache.global().is_none());
        assert!(cache.fear_greed().is_none());
    }

    #[test]
    fn test_store_and_read_back() {
        let cache = SnapshotCache::new();

        cache.store_markets(&[entry("bitcoin", 43250.0)]);

        let cached = cache.markets().unwrap();
        assert_eq!(cached.len(), 1);
        assert_eq!(cached[0].current_price, 43250.0);
    }

    #[test]
    fn test_success_overwrites_previous_snapshot() {
        let cache = SnapshotCache::new();

        cache.store_markets(&[entry("bitcoin", 43250.0)]);
        cache.store_markets(&[entry("bitcoin", 44000.0), entry("ethereum", 2280.0)]);

        let cached = cache.markets().unwrap();
        assert_eq!(cached.len(), 2);
        assert_eq!(cached[0].current_price, 44000.0);
    }

    #[test]
    fn test_slots_are_independent() {
        let cache = SnapshotCache::new();

        cache.store_global(&GlobalMetrics {
            total_market_cap: 2.34e12,
            total_volume: 9.87e10,
            btc_dominance: 54.2,
            eth_dominance: 17.1,
            market_cap_change_24h: -0.85,
            active_cryptocurrencies: 17468,
            data_quality: DataQuality::Measured,
        });

        assert!(cache.global().is_some());
        assert!(cache.markets().is_none());
        assert!(cache.fear_greed().is_none());
    }
}
