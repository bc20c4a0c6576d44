//! Binance OHLC provider implementation.
//!
//! Fallback source for hourly candles via /api/v3/klines. Klines arrive
//! as positional arrays with string-typed prices, quoted against USDT;
//! open time is in milliseconds. Keyless market-data access.
//! API documentation: https://developers.binance.com/docs/binance-spot-api-docs

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::errors::FetchError;
use crate::models::{json_f64, json_i64, Candle};
use crate::provider::{MarketProvider, ProviderCapabilities, Resource};

const BASE_URL: &str = "https://api.binance.com";
const PROVIDER_ID: &str = "BINANCE";

const MIN_INTERVAL: Duration = Duration::from_millis(250);

// ============================================================================
// API Response Structures
// ============================================================================

// Klines are positional: [open_time_ms, open, high, low, close, volume,
// close_time_ms, quote_volume, trades, ...]. Deserialized as raw values
// and picked apart by index.

/// Error envelope ({"code": -1121, "msg": "Invalid symbol."})
#[derive(Debug, Deserialize)]
struct ErrorResponse {
    msg: Option<String>,
}

// ============================================================================
// BinanceProvider
// ============================================================================

/// Binance hourly-candle provider.
pub struct BinanceProvider {
    client: Client,
}

impl BinanceProvider {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// Make a GET request to the Binance API.
    async fn fetch(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, FetchError> {
        let url = format!("{}{}", BASE_URL, endpoint);

        let mut request = self.client.get(&url);

        for (key, value) in params {
            request = request.query(&[(key, value)]);
        }

        debug!("Binance request: {}", endpoint);

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
                if let Some(message) = error_resp.msg {
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

impl Default for BinanceProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MarketProvider Implementation
// ============================================================================

#[async_trait]
impl MarketProvider for BinanceProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        // Candle fallback behind CryptoCompare
        2
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            resources: &[Resource::Ohlc],
        }
    }

    fn min_interval(&self) -> Duration {
        MIN_INTERVAL
    }

    async fn fetch_ohlc(&self, symbol: &str, limit: u32) -> Result<Vec<Candle>, FetchError> {
        // Spot pairs quote against USDT
        let pair = format!("{}USDT", symbol.to_uppercase());
        let limit_str = limit.to_string();
        let params = [
            ("symbol", pair.as_str()),
            ("interval", "1h"),
            ("limit", limit_str.as_str()),
        ];

        let text = self.fetch("/api/v3/klines", &params).await?;

        let rows: Vec<Vec<Value>> =
            serde_json::from_str(&text).map_err(|e| FetchError::MalformedResponse {
                provider: PROVIDER_ID.to_string(),
                reason: format!("Failed to parse klines response: {}", e),
            })?;

        debug!("Binance: {} klines for {}", rows.len(), pair);

        Ok(rows.iter().map(|row| normalize_kline(row)).collect())
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Map one positional kline row. Open time converts from milliseconds to
/// unix seconds; volume is the quote-asset slot (index 7) so it lines up
/// with USD-denominated volume elsewhere.
fn normalize_kline(row: &[Value]) -> Candle {
    Candle {
        time: json_i64(row.first()) / 1000,
        open: json_f64(row.get(1)),
        high: json_f64(row.get(2)),
        low: json_f64(row.get(3)),
        close: json_f64(row.get(4)),
        volume: json_f64(row.get(7)),
    }
}

// ============================================================================
// Tests
// ============================================================================
