//! CoinGecko market data provider implementation.
//!
//! Primary source for:
//! - Ranked markets via /coins/markets (including the 7d sparkline)
//! - Global metrics via /global
//! - Single-asset detail via /coins/{id}
//!
//! Keyless access works at a reduced rate limit; a demo API key can be
//! injected via the `x-cg-demo-api-key` header.
//! API documentation: https://docs.coingecko.com/reference/introduction

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::errors::FetchError;
use crate::models::{
    CoinDetail, DataQuality, GlobalMetrics, MarketEntry, MAX_SPARKLINE_POINTS,
};
use crate::provider::{MarketProvider, ProviderCapabilities, Resource};

const BASE_URL: &str = "https://api.coingecko.com/api/v3";
const PROVIDER_ID: &str = "COINGECKO";

/// The demo tier throttles hard below 1.2s between calls.
const MIN_INTERVAL: Duration = Duration::from_millis(1200);

/// Rows requested from /coins/markets.
const MARKETS_PER_PAGE: &str = "50";

// ============================================================================
// API Response Structures
// ============================================================================

/// One row from /coins/markets
#[derive(Debug, Deserialize)]
struct MarketRow {
    id: String,
    symbol: String,
    name: String,
    /// Full logo URL
    image: Option<String>,
    current_price: Option<f64>,
    market_cap: Option<f64>,
    market_cap_rank: Option<u32>,
    total_volume: Option<f64>,
    price_change_percentage_24h: Option<f64>,
    /// Hourly prices over the last 7 days, present when sparkline=true
    sparkline_in_7d: Option<SparklineBlock>,
}

#[derive(Debug, Deserialize)]
struct SparklineBlock {
    #[serde(default)]
    price: Vec<f64>,
}

/// Envelope from /global
#[derive(Debug, Deserialize)]
struct GlobalResponse {
    data: GlobalData,
}

#[derive(Debug, Deserialize)]
struct GlobalData {
    /// Market cap per quote currency
    #[serde(default)]
    total_market_cap: HashMap<String, f64>,
    /// Volume per quote currency
    #[serde(default)]
    total_volume: HashMap<String, f64>,
    /// Dominance per asset ("btc", "eth", ...)
    #[serde(default)]
    market_cap_percentage: HashMap<String, f64>,
    market_cap_change_percentage_24h_usd: Option<f64>,
    active_cryptocurrencies: Option<u64>,
}

/// Response from /coins/{id}
#[derive(Debug, Deserialize)]
struct DetailResponse {
    id: String,
    symbol: String,
    name: String,
    description: Option<DescriptionBlock>,
    image: Option<ImageBlock>,
    links: Option<LinksBlock>,
    market_data: Option<MarketDataBlock>,
}

#[derive(Debug, Deserialize)]
struct DescriptionBlock {
    #[serde(default)]
    en: String,
}

#[derive(Debug, Deserialize)]
struct ImageBlock {
    large: Option<String>,
    small: Option<String>,
    thumb: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LinksBlock {
    #[serde(default)]
    homepage: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct MarketDataBlock {
    #[serde(default)]
    current_price: HashMap<String, f64>,
    #[serde(default)]
    market_cap: HashMap<String, f64>,
    #[serde(default)]
    total_volume: HashMap<String, f64>,
    #[serde(default)]
    high_24h: HashMap<String, f64>,
    #[serde(default)]
    low_24h: HashMap<String, f64>,
    price_change_percentage_24h: Option<f64>,
    circulating_supply: Option<f64>,
}

/// Error envelope on non-2xx statuses
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    status: Option<ErrorStatus>,
}

#[derive(Debug, Deserialize)]
struct ErrorStatus {
    error_message: Option<String>,
}

// ============================================================================
// CoinGeckoProvider
// ============================================================================

/// CoinGecko market data provider.
///
/// Highest-priority source for markets, global metrics, and coin detail.
/// The only provider in the lineup that supplies 7d sparklines.
pub struct CoinGeckoProvider {
    client: Client,
    api_key: Option<String>,
}

impl CoinGeckoProvider {
    /// Create a new CoinGecko provider. The API key is optional; without
    /// one the public demo limits apply.
    pub fn new(api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, api_key }
    }

    /// Make a GET request to the CoinGecko API.
    async fn fetch(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, FetchError> {
        let url = format!("{}{}", BASE_URL, endpoint);

        let mut request = self.client.get(&url);

        if let Some(key) = &self.api_key {
            request = request.header("x-cg-demo-api-key", key);
        }

        for (key, value) in params {
            request = request.query(&[(key, value)]);
        }

        debug!(
            "CoinGecko request: {} with {} params",
            endpoint,
            params.len()
        );

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

            // CoinGecko wraps error details in a status envelope
            if let Ok(error_resp) = serde_json::from_str::<ErrorResponse>(&body) {
                if let Some(message) = error_resp.status.and_then(|s| s.error_message) {
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

// ============================================================================
// MarketProvider Implementation
// ============================================================================

#[async_trait]
impl MarketProvider for CoinGeckoProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        // Primary source - richest field set in the lineup
        1
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            resources: &[Resource::Markets, Resource::Global, Resource::Detail],
        }
    }

    fn min_interval(&self) -> Duration {
        MIN_INTERVAL
    }

    async fn fetch_markets(&self) -> Result<Vec<MarketEntry>, FetchError> {
        let params = [
            ("vs_currency", "usd"),
            ("order", "market_cap_desc"),
            ("per_page", MARKETS_PER_PAGE),
            ("page", "1"),
            ("sparkline", "true"),
            ("price_change_percentage", "24h"),
        ];

        let text = self.fetch("/coins/markets", &params).await?;

        let rows: Vec<MarketRow> =
            serde_json::from_str(&text).map_err(|e| FetchError::MalformedResponse {
                provider: PROVIDER_ID.to_string(),
                reason: format!("Failed to parse markets response: {}", e),
            })?;

        debug!("CoinGecko: fetched {} market rows", rows.len());

        Ok(rows.into_iter().map(normalize_row).collect())
    }

    async fn fetch_global(&self) -> Result<GlobalMetrics, FetchError> {
        let text = self.fetch("/global", &[]).await?;

        let response: GlobalResponse =
            serde_json::from_str(&text).map_err(|e| FetchError::MalformedResponse {
                provider: PROVIDER_ID.to_string(),
                reason: format!("Failed to parse global response: {}", e),
            })?;

        let data = response.data;

        Ok(GlobalMetrics {
            total_market_cap: usd(&data.total_market_cap),
            total_volume: usd(&data.total_volume),
            btc_dominance: data.market_cap_percentage.get("btc").copied().unwrap_or(0.0),
            eth_dominance: data.market_cap_percentage.get("eth").copied().unwrap_or(0.0),
            market_cap_change_24h: data.market_cap_change_percentage_24h_usd.unwrap_or(0.0),
            active_cryptocurrencies: data.active_cryptocurrencies.unwrap_or(0),
            data_quality: DataQuality::Measured,
        })
    }

    async fn fetch_detail(&self, coin_id: &str) -> Result<CoinDetail, FetchError> {
        let endpoint = format!("/coins/{}", urlencoding::encode(coin_id));
        let params = [
            ("localization", "false"),
            ("tickers", "false"),
            ("market_data", "true"),
            ("community_data", "false"),
            ("developer_data", "false"),
        ];

        let text = self.fetch(&endpoint, &params).await?;

        let response: DetailResponse =
            serde_json::from_str(&text).map_err(|e| FetchError::MalformedResponse {
                provider: PROVIDER_ID.to_string(),
                reason: format!("Failed to parse detail response: {}", e),
            })?;

        let market = response.market_data.unwrap_or_default();

        Ok(CoinDetail {
            id: response.id,
            symbol: response.symbol.to_uppercase(),
            name: response.name,
            description: response.description.map(|d| d.en).unwrap_or_default(),
            image: response
                .image
                .and_then(|i| i.large.or(i.small).or(i.thumb))
                .unwrap_or_default(),
            current_price: usd(&market.current_price),
            market_cap: usd(&market.market_cap),
            total_volume: usd(&market.total_volume),
            price_change_percentage_24h: market.price_change_percentage_24h.unwrap_or(0.0),
            high_24h: usd(&market.high_24h),
            low_24h: usd(&market.low_24h),
            circulating_supply: market.circulating_supply.unwrap_or(0.0),
            homepage: response
                .links
                .map(|l| l.homepage)
                .unwrap_or_default()
                .into_iter()
                .find(|h| !h.is_empty())
                .unwrap_or_default(),
        })
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Normalize one upstream row into the canonical entry.
fn normalize_row(row: MarketRow) -> MarketEntry {
    let mut sparkline = row.sparkline_in_7d.map(|s| s.price).unwrap_or_default();
    if sparkline.len() > MAX_SPARKLINE_POINTS {
        let excess = sparkline.len() - MAX_SPARKLINE_POINTS;
        sparkline.drain(..excess);
    }

    MarketEntry {
        id: row.id,
        symbol: row.symbol.to_uppercase(),
        name: row.name,
        image: row.image.unwrap_or_default(),
        current_price: row.current_price.unwrap_or(0.0),
        market_cap: row.market_cap.unwrap_or(0.0),
        total_volume: row.total_volume.unwrap_or(0.0),
        market_cap_rank: row.market_cap_rank.filter(|rank| *rank > 0),
        price_change_percentage_24h: row.price_change_percentage_24h.unwrap_or(0.0),
        sparkline_7d: sparkline,
    }
}

/// Read the USD slot out of a per-currency map.
fn usd(map: &HashMap<String, f64>) -> f64 {
    map.get("usd").copied().unwrap_or(0.0)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_id() {
        let provider = CoinGeckoProvider::new(None);
        assert_eq!(provider.id(), "COINGECKO");
    }

    #[test]
    fn test_provider_priority() {
        let provider = CoinGeckoProvider::new(Some("demo_key".to_string()));
        assert_eq!(provider.priority(), 1);
    }

    #[test]
    fn test_provider_capabilities() {
        let provider = CoinGeckoProvider::new(None);
        let caps = provider.capabilities();
        assert!(caps.serves(Resource::Markets));
        assert!(caps.serves(Resource::Global));
        assert!(caps.serves(Resource::Detail));
        assert!(!caps.serves(Resource::Ohlc));
        assert!(!caps.serves(Resource::FearGreed));
    }

    #[test]
    fn test_min_interval() {
        let provider = CoinGeckoProvider::new(None);
        assert_eq!(provider.min_interval(), Duration::from_millis(1200));
    }

    #[test]
    fn test_market_row_parsing_and_normalization() {
        let json = r#"[
            {
                "id": "bitcoin",
                "symbol": "btc",
                "name": "Bitcoin",
                "image": "https://assets.coingecko.com/coins/images/1/large/bitcoin.png",
                "current_price": 43250.12,
                "market_cap": 845000000000,
                "market_cap_rank": 1,
                "total_volume": 28000000000,
                "price_change_percentage_24h": -1.23,
                "sparkline_in_7d": { "price": [42000.0, 42500.0, 43250.12] }
            },
            {
                "id": "ethereum",
                "symbol": "eth",
                "name": "Ethereum",
                "image": null,
                "current_price": null,
                "market_cap": null,
                "market_cap_rank": null,
                "total_volume": null,
                "price_change_percentage_24h": null,
                "sparkline_in_7d": null
            }
        ]"#;

        let rows: Vec<MarketRow> = serde_json::from_str(json).unwrap();
        let entries: Vec<MarketEntry> = rows.into_iter().map(normalize_row).collect();

        assert_eq!(entries[0].id, "bitcoin");
        assert_eq!(entries[0].symbol, "BTC");
        assert_eq!(entries[0].market_cap_rank, Some(1));
        assert_eq!(entries[0].sparkline_7d.len(), 3);

        // Nulled-out row coerces to zeros and empty strings
        assert_eq!(entries[1].symbol, "ETH");
        assert_eq!(entries[1].image, "");
        assert_eq!(entries[1].current_price, 0.0);
        assert_eq!(entries[1].market_cap_rank, None);
        assert!(entries[1].sparkline_7d.is_empty());
    }

    #[test]
    fn test_sparkline_truncated_to_most_recent_points() {
        let prices: Vec<f64> = (0..200).map(|i| i as f64).collect();
        let row = MarketRow {
            id: "bitcoin".to_string(),
            symbol: "btc".to_string(),
            name: "Bitcoin".to_string(),
            image: None,
            current_price: Some(199.0),
            market_cap: None,
            market_cap_rank: Some(1),
            total_volume: None,
            price_change_percentage_24h: None,
            sparkline_in_7d: Some(SparklineBlock { price: prices }),
        };

        let entry = normalize_row(row);
        assert_eq!(entry.sparkline_7d.len(), MAX_SPARKLINE_POINTS);
        // Oldest points dropped, newest kept
        assert_eq!(entry.sparkline_7d[0], 32.0);
        assert_eq!(*entry.sparkline_7d.last().unwrap(), 199.0);
    }

    #[test]
    fn test_global_response_parsing() {
        let json = r#"{
            "data": {
                "active_cryptocurrencies": 17468,
                "total_market_cap": { "usd": 2340000000000.0, "eur": 2150000000000.0 },
                "total_volume": { "usd": 98700000000.0 },
                "market_cap_percentage": { "btc": 54.2, "eth": 17.1 },
                "market_cap_change_percentage_24h_usd": -0.85
            }
        }"#;

        let response: GlobalResponse = serde_json::from_str(json).unwrap();
        let data = response.data;

        assert_eq!(usd(&data.total_market_cap), 2340000000000.0);
        assert_eq!(data.market_cap_percentage.get("btc"), Some(&54.2));
        assert_eq!(data.active_cryptocurrencies, Some(17468));
    }

    #[test]
    fn test_detail_response_parsing() {
        let json = r#"{
            "id": "bitcoin",
            "symbol": "btc",
            "name": "Bitcoin",
            "description": { "en": "Bitcoin is the first decentralized cryptocurrency." },
            "image": { "thumb": "t.png", "small": "s.png", "large": "l.png" },
            "links": { "homepage": ["", "https://bitcoin.org"] },
            "market_data": {
                "current_price": { "usd": 43250.12 },
                "market_cap": { "usd": 845000000000.0 },
                "total_volume": { "usd": 28000000000.0 },
                "high_24h": { "usd": 44100.0 },
                "low_24h": { "usd": 42800.0 },
                "price_change_percentage_24h": -1.23,
                "circulating_supply": 19750000.0
            }
        }"#;

        let response: DetailResponse = serde_json::from_str(json).unwrap();
        let market = response.market_data.as_ref().unwrap();

        assert_eq!(response.id, "bitcoin");
        assert_eq!(usd(&market.high_24h), 44100.0);
        assert_eq!(
            response.image.unwrap().large,
            Some("l.png".to_string())
        );
        // First non-empty homepage wins
        let homepage = response
            .links
            .map(|l| l.homepage)
            .unwrap_or_default()
            .into_iter()
            .find(|h| !h.is_empty());
        assert_eq!(homepage, Some("https://bitcoin.org".to_string()));
    }

    #[test]
    fn test_error_envelope_parsing() {
        let json = r#"{
            "status": {
                "error_code": 429,
                "error_message": "You've exceeded the Rate Limit."
            }
        }"#;

        let response: ErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.status.and_then(|s| s.error_message),
            Some("You've exceeded the Rate Limit.".to_string())
        );
    }
}
