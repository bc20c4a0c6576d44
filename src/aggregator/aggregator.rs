//! Failover aggregation across market data providers.
//!
//! For each resource the aggregator builds a chain of capable providers
//! sorted by priority and tries them strictly in order: throttle,
//! dispatch, and on success stamp the provider healthy, refresh the
//! cache slot, and return. A failed provider is flagged unhealthy and
//! skipped until the next aggregation call; it is never retried within
//! the same call. When the whole chain fails, the cached snapshot is
//! served if one exists, however stale.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use crate::config::Config;
use crate::errors::AggregateError;
use crate::models::{Candle, CoinDetail, FearGreedIndex, GlobalMetrics, MarketEntry};
use crate::provider::alternative_me::AlternativeMeProvider;
use crate::provider::binance::BinanceProvider;
use crate::provider::coincap::CoinCapProvider;
use crate::provider::coingecko::CoinGeckoProvider;
use crate::provider::coinpaprika::CoinPaprikaProvider;
use crate::provider::cryptocompare::CryptoCompareProvider;
use crate::provider::{MarketProvider, Resource};

use super::cache::SnapshotCache;
use super::state::ProviderStates;

/// Hourly candles returned when the caller does not say otherwise.
pub const DEFAULT_OHLC_LIMIT: u32 = 100;

/// Point-in-time health probe over the provider lineup.
#[derive(Clone, Debug, Serialize)]
pub struct HealthReport {
    /// "healthy" while every provider is operational, else "degraded"
    pub status: &'static str,
    /// Per-provider status keyed by provider id
    pub providers: BTreeMap<String, &'static str>,
}

/// Multi-provider market data aggregator.
///
/// Owns the provider lineup, the per-provider runtime state, and the
/// last-known-good cache. One instance is built at startup and shared
/// behind an `Arc` for the lifetime of the process.
pub struct Aggregator {
    providers: Vec<Arc<dyn MarketProvider>>,
    states: ProviderStates,
    cache: SnapshotCache,
}

impl Aggregator {
    /// Create an aggregator over an explicit provider lineup.
    pub fn new(providers: Vec<Arc<dyn MarketProvider>>) -> Self {
        Self {
            providers,
            states: ProviderStates::new(),
            cache: SnapshotCache::new(),
        }
    }

    /// Create an aggregator with the standard provider lineup, wiring in
    /// the API keys from `config` where a provider accepts one.
    pub fn from_config(config: &Config) -> Self {
        Self::new(vec![
            Arc::new(CoinGeckoProvider::new(config.coingecko_api_key.clone())),
            Arc::new(CoinPaprikaProvider::new()),
            Arc::new(CoinCapProvider::new()),
            Arc::new(CryptoCompareProvider::new(
                config.cryptocompare_api_key.clone(),
            )),
            Arc::new(BinanceProvider::new()),
            Arc::new(AlternativeMeProvider::new()),
        ])
    }

    /// Providers able to serve `resource`, in priority order. The sort is
    /// stable, so equal priorities keep their registration order.
    fn chain(&self, resource: Resource) -> Vec<Arc<dyn MarketProvider>> {
        let mut chain: Vec<Arc<dyn MarketProvider>> = self
            .providers
            .iter()
            .filter(|provider| provider.capabilities().serves(resource))
            .cloned()
            .collect();
        chain.sort_by_key(|provider| provider.priority());
        chain
    }

    /// Ranked markets snapshot, newest provider data first, cached.
    pub async fn get_markets(&self) -> Result<Vec<MarketEntry>, AggregateError> {
        let resource = Resource::Markets;

        for provider in self.chain(resource) {
            self.states
                .throttle(provider.id(), provider.min_interval())
                .await;

            match provider.fetch_markets().await {
                Ok(entries) => {
                    self.states.mark_healthy(provider.id());
                    self.cache.store_markets(&entries);
                    debug!(
                        "Markets served by '{}' ({} entries)",
                        provider.id(),
                        entries.len()
                    );
                    return Ok(entries);
                }
                Err(e) => {
                    self.states.mark_unhealthy(provider.id());
                    warn!("Markets fetch via '{}' failed: {}", provider.id(), e);
                }
            }
        }

        if let Some(cached) = self.cache.markets() {
            warn!("All markets providers exhausted; serving cached snapshot");
            return Ok(cached);
        }

        Err(AggregateError::AllProvidersExhausted {
            resource: resource.to_string(),
        })
    }

    /// Market-wide aggregate metrics, cached.
    pub async fn get_global(&self) -> Result<GlobalMetrics, AggregateError> {
        let resource = Resource::Global;

        for provider in self.chain(resource) {
            self.states
                .throttle(provider.id(), provider.min_interval())
                .await;

            match provider.fetch_global().await {
                Ok(metrics) => {
                    self.states.mark_healthy(provider.id());
                    self.cache.store_global(&metrics);
                    debug!("Global metrics served by '{}'", provider.id());
                    return Ok(metrics);
                }
                Err(e) => {
                    self.states.mark_unhealthy(provider.id());
                    warn!("Global fetch via '{}' failed: {}", provider.id(), e);
                }
            }
        }

        if let Some(cached) = self.cache.global() {
            warn!("All global providers exhausted; serving cached snapshot");
            return Ok(cached);
        }

        Err(AggregateError::AllProvidersExhausted {
            resource: resource.to_string(),
        })
    }

    /// Latest Fear & Greed reading, cached.
    pub async fn get_fear_greed(&self) -> Result<FearGreedIndex, AggregateError> {
        let resource = Resource::FearGreed;

        for provider in self.chain(resource) {
            self.states
                .throttle(provider.id(), provider.min_interval())
                .await;

            match provider.fetch_fear_greed().await {
                Ok(index) => {
                    self.states.mark_healthy(provider.id());
                    self.cache.store_fear_greed(&index);
                    debug!("Fear & Greed served by '{}'", provider.id());
                    return Ok(index);
                }
                Err(e) => {
                    self.states.mark_unhealthy(provider.id());
                    warn!("Fear & Greed fetch via '{}' failed: {}", provider.id(), e);
                }
            }
        }

        if let Some(cached) = self.cache.fear_greed() {
            warn!("All Fear & Greed providers exhausted; serving cached snapshot");
            return Ok(cached);
        }

        Err(AggregateError::AllProvidersExhausted {
            resource: resource.to_string(),
        })
    }

    /// Single-asset detail by slug. Uncached: every call walks the chain.
    pub async fn get_detail(&self, coin_id: &str) -> Result<CoinDetail, AggregateError> {
        let resource = Resource::Detail;

        for provider in self.chain(resource) {
            self.states
                .throttle(provider.id(), provider.min_interval())
                .await;

            match provider.fetch_detail(coin_id).await {
                Ok(detail) => {
                    self.states.mark_healthy(provider.id());
                    debug!("Detail for '{}' served by '{}'", coin_id, provider.id());
                    return Ok(detail);
                }
                Err(e) => {
                    self.states.mark_unhealthy(provider.id());
                    warn!(
                        "Detail fetch for '{}' via '{}' failed: {}",
                        coin_id,
                        provider.id(),
                        e
                    );
                }
            }
        }

        Err(AggregateError::AllProvidersExhausted {
            resource: resource.to_string(),
        })
    }

    /// Up to `limit` hourly candles for a ticker symbol, oldest first.
    /// Uncached: every call walks the chain.
    pub async fn get_ohlc(&self, symbol: &str, limit: u32) -> Result<Vec<Candle>, AggregateError> {
        let resource = Resource::Ohlc;

        for provider in self.chain(resource) {
            self.states
                .throttle(provider.id(), provider.min_interval())
                .await;

            match provider.fetch_ohlc(symbol, limit).await {
                Ok(candles) => {
                    self.states.mark_healthy(provider.id());
                    debug!(
                        "OHLC for '{}' served by '{}' ({} candles)",
                        symbol,
                        provider.id(),
                        candles.len()
                    );
                    return Ok(candles);
                }
                Err(e) => {
                    self.states.mark_unhealthy(provider.id());
                    warn!(
                        "OHLC fetch for '{}' via '{}' failed: {}",
                        symbol,
                        provider.id(),
                        e
                    );
                }
            }
        }

        Err(AggregateError::AllProvidersExhausted {
            resource: resource.to_string(),
        })
    }

    /// Snapshot the health flags of every registered provider.
    pub fn health_report(&self) -> HealthReport {
        let mut providers = BTreeMap::new();
        let mut all_healthy = true;

        for provider in &self.providers {
            let healthy = self.states.is_healthy(provider.id());
            all_healthy &= healthy;
            providers.insert(
                provider.id().to_string(),
                if healthy { "operational" } else { "degraded" },
            );
        }

        HealthReport {
            status: if all_healthy { "healthy" } else { "degraded" },
            providers,
        }
    }
}
