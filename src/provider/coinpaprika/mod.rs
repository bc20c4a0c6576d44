//! CoinPaprika market data provider implementation.
//!
//! First fallback for ranked markets and global metrics. The API is
//! keyless; tickers arrive unordered and without sparklines, and the
//! global overview carries no ETH dominance figure.
//! API documentation: https://api.coinpaprika.com/

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::errors::FetchError;
use crate::models::{DataQuality, GlobalMetrics, MarketEntry};
use crate::provider::{MarketProvider, ProviderCapabilities, Resource};

const BASE_URL: &str = "https://api.coinpaprika.com/v1";
const STATIC_URL: &str = "https://static.coinpaprika.com";
const PROVIDER_ID: &str = "COINPAPRIKA";

const MIN_INTERVAL: Duration = Duration::from_millis(600);

/// Tickers kept after sorting by rank.
const MARKETS_LIMIT: usize = 50;

/// Stand-in ETH dominance; the global overview only reports BTC.
const ESTIMATED_ETH_DOMINANCE_PCT: f64 = 17.0;

// ============================================================================
// API Response Structures
// ============================================================================

/// One row from /tickers
#[derive(Debug, Deserialize)]
struct TickerRow {
    id: String,
    name: String,
    symbol: String,
    /// 0 means unranked
    #[serde(default)]
    rank: u32,
    quotes: Option<TickerQuotes>,
}

#[derive(Debug, Deserialize)]
struct TickerQuotes {
    #[serde(rename = "USD")]
    usd: Option<UsdQuote>,
}

#[derive(Debug, Deserialize)]
struct UsdQuote {
    price: Option<f64>,
    volume_24h: Option<f64>,
    market_cap: Option<f64>,
    percent_change_24h: Option<f64>,
}

/// Response from /global
#[derive(Debug, Deserialize)]
struct GlobalOverview {
    market_cap_usd: Option<f64>,
    volume_24h_usd: Option<f64>,
    bitcoin_dominance_percentage: Option<f64>,
    cryptocurrencies_number: Option<u64>,
    market_cap_change_24h: Option<f64>,
}

/// Error envelope ({"error": "..."})
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

// ============================================================================
// CoinPaprikaProvider
// ============================================================================

/// CoinPaprika market data provider.
pub struct CoinPaprikaProvider {
    client: Client,
}

impl CoinPaprikaProvider {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// Make a GET request to the CoinPaprika API.
    async fn fetch(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, FetchError> {
        let url = format!("{}{}", BASE_URL, endpoint);

        let mut request = self.client.get(&url);

        for (key, value) in params {
            request = request.query(&[(key, value)]);
        }

        debug!("CoinPaprika request: {}", endpoint);

        let response = request.send().await.map_err(|e| {
            if e.is_timeout() {
                FetchError::Timeout {
                    provider: PROVIDER_ID.to_string(),
                }
            } else {
                FetchError::Network(e)
            }
        })?;

        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(FetchError::RateLimited {
                provider: PROVIDER_ID.to_string(),
            });
        }

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();

            if let Ok(error_resp) = serde_json::from_str::<ErrorResponse>(&body) {
                if let Some(message) = error_resp.error {
                    return Err(FetchError::ProviderReported {
                        provider: PROVIDER_ID.to_string(),
                        message,
                    });
                }
            }

            return Err(FetchError::UpstreamStatus {
                provider: PROVIDER_ID.to_string(),
                status: status.as_u16(),
            });
        }

        response
            .text()
            .await
            .map_err(|e| FetchError::MalformedResponse {
                provider: PROVIDER_ID.to_string(),
                reason: format!("Failed to read response: {}", e),
            })
    }
}

impl Default for CoinPaprikaProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MarketProvider Implementation
// ============================================================================

#[async_trait]
impl MarketProvider for CoinPaprikaProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        // First fallback behind CoinGecko
        2
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            resources: &[Resource::Markets, Resource::Global],
        }
    }

    fn min_interval(&self) -> Duration {
        MIN_INTERVAL
    }

    async fn fetch_markets(&self) -> Result<Vec<MarketEntry>, FetchError> {
        let text = self.fetch("/tickers", &[("quotes", "USD")]).await?;

        let rows: Vec<TickerRow> =
            serde_json::from_str(&text).map_err(|e| FetchError::MalformedResponse {
                provider: PROVIDER_ID.to_string(),
                reason: format!("Failed to parse tickers response: {}", e),
            })?;

        debug!("CoinPaprika: fetched {} tickers", rows.len());

        let mut entries: Vec<MarketEntry> = rows.into_iter().map(normalize_ticker).collect();

        // Tickers arrive unordered; rank-sort with unranked entries last
        entries.sort_by_key(|entry| entry.market_cap_rank.unwrap_or(u32::MAX));
        entries.truncate(MARKETS_LIMIT);

        Ok(entries)
    }

    async fn fetch_global(&self) -> Result<GlobalMetrics, FetchError> {
        let text = self.fetch("/global", &[]).await?;

        let overview: GlobalOverview =
            serde_json::from_str(&text).map_err(|e| FetchError::MalformedResponse {
                provider: PROVIDER_ID.to_string(),
                reason: format!("Failed to parse global response: {}", e),
            })?;

        warn!(
            "CoinPaprika global overview has no ETH dominance; assuming {}%",
            ESTIMATED_ETH_DOMINANCE_PCT
        );

        Ok(normalize_global(overview))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Normalize one ticker into the canonical entry. CoinPaprika serves no
/// logo in the ticker payload, so the image URL is built from its static
/// asset CDN.
fn normalize_ticker(row: TickerRow) -> MarketEntry {
    let usd = row.quotes.and_then(|q| q.usd);
    let image = format!("{}/coin/{}/logo.png", STATIC_URL, row.id);

    MarketEntry {
        symbol: row.symbol.to_uppercase(),
        name: row.name,
        image,
        current_price: usd.as_ref().and_then(|q| q.price).unwrap_or(0.0),
        market_cap: usd.as_ref().and_then(|q| q.market_cap).unwrap_or(0.0),
        total_volume: usd.as_ref().and_then(|q| q.volume_24h).unwrap_or(0.0),
        market_cap_rank: (row.rank > 0).then_some(row.rank),
        price_change_percentage_24h: usd
            .as_ref()
            .and_then(|q| q.percent_change_24h)
            .unwrap_or(0.0),
        sparkline_7d: Vec::new(),
        id: row.id,
    }
}

/// Map the global overview, flagging the result as estimated since the
/// ETH dominance slot is synthesized.
fn normalize_global(overview: GlobalOverview) -> GlobalMetrics {
    GlobalMetrics {
        total_market_cap: overview.market_cap_usd.unwrap_or(0.0),
        total_volume: overview.volume_24h_usd.unwrap_or(0.0),
        btc_dominance: overview.bitcoin_dominance_percentage.unwrap_or(0.0),
        eth_dominance: ESTIMATED_ETH_DOMINANCE_PCT,
        market_cap_change_24h: overview.market_cap_change_24h.unwrap_or(0.0),
        active_cryptocurrencies: overview.cryptocurrencies_number.unwrap_or(0),
        data_quality: DataQuality::Estimated,
    }
}

// ============================================================================
// Tests
// ============================================================================
