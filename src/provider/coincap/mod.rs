//! CoinCap market data provider implementation.
//!
//! Last-resort source for ranked markets and a thin fallback for coin
//! detail. CoinCap serves every numeric field as a string, so all
//! values go through the lenient parsers; asset detail carries no
//! description or intraday high/low.
//! API documentation: https://docs.coincap.io/

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::errors::FetchError;
use crate::models::{lenient_f64, lenient_rank, CoinDetail, MarketEntry};
use crate::provider::{MarketProvider, ProviderCapabilities, Resource};

const BASE_URL: &str = "https://api.coincap.io/v2";
const ICONS_URL: &str = "https://assets.coincap.io/assets/icons";
const PROVIDER_ID: &str = "COINCAP";

const MIN_INTERVAL: Duration = Duration::from_millis(500);

/// Rows requested from /assets.
const MARKETS_LIMIT: &str = "50";

// ============================================================================
// API Response Structures
// ============================================================================

/// Envelope from /assets
#[derive(Debug, Deserialize)]
struct AssetsResponse {
    data: Vec<AssetRow>,
}

/// Envelope from /assets/{id}
#[derive(Debug, Deserialize)]
struct AssetResponse {
    data: AssetRow,
}

/// One asset; every numeric arrives string-typed
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssetRow {
    id: String,
    symbol: String,
    name: String,
    rank: Option<String>,
    supply: Option<String>,
    price_usd: Option<String>,
    market_cap_usd: Option<String>,
    volume_usd_24_hr: Option<String>,
    change_percent_24_hr: Option<String>,
    explorer: Option<String>,
}

/// Error envelope ({"error": "...", "timestamp": ...})
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    error: Option<String>,
}

// ============================================================================
// CoinCapProvider
// ============================================================================

/// CoinCap market data provider.
pub struct CoinCapProvider {
    client: Client,
}

impl CoinCapProvider {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// Make a GET request to the CoinCap API.
    async fn fetch(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, FetchError> {
        let url = format!("{}{}", BASE_URL, endpoint);

        let mut request = self.client.get(&url);

        for (key, value) in params {
            request = request.query(&[(key, value)]);
        }

        debug!("CoinCap request: {}", endpoint);

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

impl Default for CoinCapProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MarketProvider Implementation
// ============================================================================

#[async_trait]
impl MarketProvider for CoinCapProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        // Last resort for markets, behind CoinGecko and CoinPaprika
        3
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            resources: &[Resource::Markets, Resource::Detail],
        }
    }

    fn min_interval(&self) -> Duration {
        MIN_INTERVAL
    }

    async fn fetch_markets(&self) -> Result<Vec<MarketEntry>, FetchError> {
        let text = self.fetch("/assets", &[("limit", MARKETS_LIMIT)]).await?;

        let response: AssetsResponse =
            serde_json::from_str(&text).map_err(|e| FetchError::MalformedResponse {
                provider: PROVIDER_ID.to_string(),
                reason: format!("Failed to parse assets response: {}", e),
            })?;

        debug!("CoinCap: fetched {} assets", response.data.len());

        Ok(response.data.into_iter().map(normalize_asset).collect())
    }

    async fn fetch_detail(&self, coin_id: &str) -> Result<CoinDetail, FetchError> {
        let endpoint = format!("/assets/{}", urlencoding::encode(coin_id));
        let text = self.fetch(&endpoint, &[]).await?;

        let response: AssetResponse =
            serde_json::from_str(&text).map_err(|e| FetchError::MalformedResponse {
                provider: PROVIDER_ID.to_string(),
                reason: format!("Failed to parse asset response: {}", e),
            })?;

        Ok(normalize_detail(response.data))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Build the icon URL from CoinCap's asset CDN.
fn icon_url(symbol: &str) -> String {
    format!("{}/{}@2x.png", ICONS_URL, symbol.to_lowercase())
}

/// Normalize one asset into the canonical entry.
fn normalize_asset(row: AssetRow) -> MarketEntry {
    MarketEntry {
        symbol: row.symbol.to_uppercase(),
        image: icon_url(&row.symbol),
        current_price: lenient_f64(row.price_usd.as_deref().unwrap_or_default()),
        market_cap: lenient_f64(row.market_cap_usd.as_deref().unwrap_or_default()),
        total_volume: lenient_f64(row.volume_usd_24_hr.as_deref().unwrap_or_default()),
        market_cap_rank: row.rank.as_deref().and_then(lenient_rank),
        price_change_percentage_24h: lenient_f64(
            row.change_percent_24_hr.as_deref().unwrap_or_default(),
        ),
        sparkline_7d: Vec::new(),
        name: row.name,
        id: row.id,
    }
}

/// Normalize one asset into a detail record. CoinCap has no description
/// and no intraday high/low; those slots stay empty rather than failing
/// the chain.
fn normalize_detail(row: AssetRow) -> CoinDetail {
    CoinDetail {
        symbol: row.symbol.to_uppercase(),
        description: String::new(),
        image: icon_url(&row.symbol),
        current_price: lenient_f64(row.price_usd.as_deref().unwrap_or_default()),
        market_cap: lenient_f64(row.market_cap_usd.as_deref().unwrap_or_default()),
        total_volume: lenient_f64(row.volume_usd_24_hr.as_deref().unwrap_or_default()),
        price_change_percentage_24h: lenient_f64(
            row.change_percent_24_hr.as_deref().unwrap_or_default(),
        ),
        high_24h: 0.0,
        low_24h: 0.0,
        circulating_supply: lenient_f64(row.supply.as_deref().unwrap_or_default()),
        homepage: row.explorer.unwrap_or_default(),
        name: row.name,
        id: row.id,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_provider_identity() {
        let provider = CoinCapProvider::new();
        assert_eq!(provider.id(), "COINCAP");
        assert_eq!(provider.priority(), 3);
        assert_eq!(provider.min_interval(), Duration::from_millis(500));
        assert!(provider.capabilities().serves(Resource::Markets));
        assert!(provider.capabilities().serves(Resource::Detail));
        assert!(!provider.capabilities().serves(Resource::Global));
    }

    #[test]
    fn test_asset_parsing_with_string_numerics() {
        let json = r#"{
            "data": [
                {
                    "id": "bitcoin",
                    "rank": "1",
                    "symbol": "BTC",
                    "name": "Bitcoin",
                    "supply": "19750000.0",
                    "maxSupply": "21000000.0",
                    "marketCapUsd": "845000000000.55",
                    "volumeUsd24Hr": "28000000000.12",
                    "priceUsd": "43250.1234",
                    "changePercent24Hr": "-1.2345",
                    "vwap24Hr": "43100.0",
                    "explorer": "https://blockchain.info/"
                }
            ],
            "timestamp": 1735689600000
        }"#;

        let response: AssetsResponse = serde_json::from_str(json).unwrap();
        let entry = normalize_asset(response.data.into_iter().next().unwrap());

        assert_eq!(entry.id, "bitcoin");
        assert_eq!(entry.current_price, 43250.1234);
        assert_eq!(entry.price_change_percentage_24h, -1.2345);
        assert_eq!(entry.market_cap_rank, Some(1));
        assert_eq!(
            entry.image,
            "https://assets.coincap.io/assets/icons/btc@2x.png"
        );
    }

    #[test]
    fn test_asset_with_garbage_numerics() {
        let json = r#"{
            "data": [
                {
                    "id": "junkcoin",
                    "rank": "0",
                    "symbol": "JUNK",
                    "name": "Junkcoin",
                    "supply": null,
                    "priceUsd": "not-a-number",
                    "marketCapUsd": null,
                    "volumeUsd24Hr": "",
                    "changePercent24Hr": null,
                    "explorer": null
                }
            ]
        }"#;

        let response: AssetsResponse = serde_json::from_str(json).unwrap();
        let entry = normalize_asset(response.data.into_iter().next().unwrap());

        assert_eq!(entry.current_price, 0.0);
        assert_eq!(entry.market_cap, 0.0);
        assert_eq!(entry.total_volume, 0.0);
        // Rank zero is treated as unranked
        assert_eq!(entry.market_cap_rank, None);
    }

    #[test]
    fn test_detail_normalization() {
        let row = AssetRow {
            id: "ethereum".to_string(),
            symbol: "ETH".to_string(),
            name: "Ethereum".to_string(),
            rank: Some("2".to_string()),
            supply: Some("120000000.0".to_string()),
            price_usd: Some("2280.50".to_string()),
            market_cap_usd: Some("274000000000.0".to_string()),
            volume_usd_24_hr: Some("12000000000.0".to_string()),
            change_percent_24_hr: Some("2.15".to_string()),
            explorer: Some("https://etherscan.io/".to_string()),
        };

        let detail = normalize_detail(row);

        assert_eq!(detail.id, "ethereum");
        assert_eq!(detail.symbol, "ETH");
        assert_eq!(detail.current_price, 2280.50);
        assert_eq!(detail.circulating_supply, 120000000.0);
        assert_eq!(detail.homepage, "https://etherscan.io/");
        assert_eq!(detail.description, "");
        assert_eq!(detail.high_24h, 0.0);
        assert_eq!(detail.low_24h, 0.0);
    }

    #[test]
    fn test_error_envelope_parsing() {
        let json = r#"{"error": "asset not found", "timestamp": 1735689600000}"#;
        let response: ErrorResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.error, Some("asset not found".to_string()));
    }
}
