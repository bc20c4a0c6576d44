//! Market provider trait definition.
//!
//! This module defines the core `MarketProvider` trait that all
//! provider adapters implement.

use std::time::Duration;

use async_trait::async_trait;

use crate::errors::FetchError;
use crate::models::{Candle, CoinDetail, FearGreedIndex, GlobalMetrics, MarketEntry};

use super::capabilities::{ProviderCapabilities, Resource};

/// Trait for market data provider adapters.
///
/// Implement this trait to add support for a new upstream source. The
/// aggregator uses the adapter's capabilities and priority to build the
/// failover chain for each resource, and its minimum interval to space
/// out calls.
///
/// Adapters implement only the fetch methods for resources they declare
/// in [`ProviderCapabilities`]; the default bodies return
/// [`FetchError::NotSupported`].
///
/// # Example
///
/// ```ignore
/// use async_trait::async_trait;
/// use cryptick::provider::{MarketProvider, ProviderCapabilities, Resource};
///
/// struct MyProvider {
///     client: reqwest::Client,
/// }
///
/// #[async_trait]
/// impl MarketProvider for MyProvider {
///     fn id(&self) -> &'static str {
///         "MY_PROVIDER"
///     }
///
///     fn capabilities(&self) -> ProviderCapabilities {
///         ProviderCapabilities {
///             resources: &[Resource::Markets],
///         }
///     }
///
///     // ... implement fetch_markets
/// }
/// ```
#[async_trait]
pub trait MarketProvider: Send + Sync {
    /// Unique identifier for this provider.
    ///
    /// A constant string like "COINGECKO" or "COINPAPRIKA". Used for
    /// logging, health tracking, and throttle bookkeeping.
    fn id(&self) -> &'static str;

    /// Provider priority for chain ordering.
    ///
    /// Lower values = higher priority. Default is 10. Priority reflects
    /// data quality of the upstream (richer fields, better rate limits),
    /// so the aggregator never reorders beyond it.
    fn priority(&self) -> u8 {
        10
    }

    /// Describes which resources this provider serves.
    fn capabilities(&self) -> ProviderCapabilities;

    /// Minimum interval between two calls to this provider.
    ///
    /// The aggregator suspends the calling task until the interval since
    /// the previous call has elapsed. This is cooperative self-throttling
    /// against the provider's published cadence, not a token bucket.
    fn min_interval(&self) -> Duration {
        Duration::from_millis(500)
    }

    /// Fetch the ranked market entries.
    async fn fetch_markets(&self) -> Result<Vec<MarketEntry>, FetchError> {
        Err(FetchError::NotSupported {
            provider: self.id().to_string(),
            resource: Resource::Markets.to_string(),
        })
    }

    /// Fetch market-wide aggregate metrics.
    async fn fetch_global(&self) -> Result<GlobalMetrics, FetchError> {
        Err(FetchError::NotSupported {
            provider: self.id().to_string(),
            resource: Resource::Global.to_string(),
        })
    }

    /// Fetch detail for one asset by its slug.
    async fn fetch_detail(&self, coin_id: &str) -> Result<CoinDetail, FetchError> {
        let _ = coin_id;
        Err(FetchError::NotSupported {
            provider: self.id().to_string(),
            resource: Resource::Detail.to_string(),
        })
    }

    /// Fetch up to `limit` hourly candles for a ticker symbol, oldest
    /// first.
    async fn fetch_ohlc(&self, symbol: &str, limit: u32) -> Result<Vec<Candle>, FetchError> {
        let _ = (symbol, limit);
        Err(FetchError::NotSupported {
            provider: self.id().to_string(),
            resource: Resource::Ohlc.to_string(),
        })
    }

    /// Fetch the latest Fear & Greed reading.
    async fn fetch_fear_greed(&self) -> Result<FearGreedIndex, FetchError> {
        Err(FetchError::NotSupported {
            provider: self.id().to_string(),
            resource: Resource::FearGreed.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BareProvider;

    #[async_trait]
    impl MarketProvider for BareProvider {
        fn id(&self) -> &'static str {
            "BARE"
        }

        fn capabilities(&self) -> ProviderCapabilities {
            ProviderCapabilities { resources: &[] }
        }
    }

    #[tokio::test]
    async fn test_default_bodies_return_not_supported() {
        let provider = BareProvider;

        let err = provider.fetch_markets().await.unwrap_err();
        assert!(matches!(err, FetchError::NotSupported { .. }));

        let err = provider.fetch_ohlc("BTC", 24).await.unwrap_err();
        match err {
            FetchError::NotSupported { provider, resource } => {
                assert_eq!(provider, "BARE");
                assert_eq!(resource, "ohlc");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_default_priority_and_interval() {
        let provider = BareProvider;
        assert_eq!(provider.priority(), 10);
        assert_eq!(provider.min_interval(), Duration::from_millis(500));
    }
}
