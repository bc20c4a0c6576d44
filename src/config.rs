//! Runtime configuration sourced from the process environment.

use std::env;
use std::time::Duration;

/// Seconds between broadcast ticks when unconfigured.
pub const DEFAULT_FEED_INTERVAL_SECS: u64 = 30;

/// Process configuration for the aggregation core.
///
/// Every field has a working default: without any environment the
/// providers run keyless at their public-tier limits and the feed ticks
/// every 30 seconds.
#[derive(Clone, Debug)]
pub struct Config {
    /// CoinGecko demo API key (`COINGECKO_API_KEY`)
    pub coingecko_api_key: Option<String>,
    /// CryptoCompare API key (`CRYPTOCOMPARE_API_KEY`)
    pub cryptocompare_api_key: Option<String>,
    /// Broadcast cadence (`FEED_INTERVAL_SECS`)
    pub feed_interval: Duration,
}

impl Config {
    /// Read configuration from environment variables. Blank values count
    /// as unset; an unparseable interval falls back to the default.
    pub fn from_env() -> Self {
        Self {
            coingecko_api_key: read_key("COINGECKO_API_KEY"),
            cryptocompare_api_key: read_key("CRYPTOCOMPARE_API_KEY"),
            feed_interval: Duration::from_secs(
                env::var("FEED_INTERVAL_SECS")
                    .ok()
                    .and_then(|raw| raw.trim().parse().ok())
                    .unwrap_or(DEFAULT_FEED_INTERVAL_SECS),
            ),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            coingecko_api_key: None,
            cryptocompare_api_key: None,
            feed_interval: Duration::from_secs(DEFAULT_FEED_INTERVAL_SECS),
        }
    }
}

fn read_key(name: &str) -> Option<String> {
    env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
