//! CryptoCompare OHLC provider implementation.
//!
//! Primary source for hourly candles via /data/v2/histohour. The API
//! reports failures in-band: a 200 whose `Response` field is "Error"
//! carries the message in `Message`. An API key, when configured, is
//! passed as the `api_key` query parameter.
//! API documentation: https://min-api.cryptocompare.com/documentation

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::errors::FetchError;
use crate::models::Candle;
use crate::provider::{MarketProvider, ProviderCapabilities, Resource};

const BASE_URL: &str = "https://min-api.cryptocompare.com";
const PROVIDER_ID: &str = "CRYPTOCOMPARE";

const MIN_INTERVAL: Duration = Duration::from_millis(500);

// ============================================================================
// API Response Structures
// ============================================================================

/// Envelope from /data/v2/histohour
#[derive(Debug, Deserialize)]
struct HistoResponse {
    #[serde(rename = "Response")]
    response: Option<String>,
    #[serde(rename = "Message")]
    message: Option<String>,
    #[serde(rename = "Data")]
    data: Option<HistoData>,
}

#[derive(Debug, Deserialize)]
struct HistoData {
    #[serde(rename = "Data", default)]
    data: Vec<HistoCandle>,
}

/// One hourly candle; `volumeto` is volume in the quote currency
#[derive(Debug, Deserialize)]
struct HistoCandle {
    time: i64,
    open: f64,
    high: f64,
    low: f64,
    close: f64,
    #[serde(default)]
    volumeto: f64,
}

// ============================================================================
// CryptoCompareProvider
// ============================================================================

/// CryptoCompare hourly-candle provider.
pub struct CryptoCompareProvider {
    client: Client,
    api_key: Option<String>,
}

impl CryptoCompareProvider {
    /// Create a new CryptoCompare provider. The API key is optional;
    /// without one the free-tier limits apply.
    pub fn new(api_key: Option<String>) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client, api_key }
    }

    /// Make a GET request to the CryptoCompare API.
    async fn fetch(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, FetchError> {
        let url = format!("{}{}", BASE_URL, endpoint);

        let mut request = self.client.get(&url);

        for (key, value) in params {
            request = request.query(&[(key, value)]);
        }

        if let Some(key) = &self.api_key {
            request = request.query(&[("api_key", key.as_str())]);
        }

        debug!("CryptoCompare request: {}", endpoint);

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
impl MarketProvider for CryptoCompareProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        // Primary candle source
        1
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
        let fsym = symbol.to_uppercase();
        let limit_str = limit.to_string();
        let params = [
            ("fsym", fsym.as_str()),
            ("tsym", "USD"),
            ("limit", limit_str.as_str()),
        ];

        let text = self.fetch("/data/v2/histohour", &params).await?;

        let response: HistoResponse =
            serde_json::from_str(&text).map_err(|e| FetchError::MalformedResponse {
                provider: PROVIDER_ID.to_string(),
                reason: format!("Failed to parse histohour response: {}", e),
            })?;

        // In-band failure: HTTP 200, Response "Error"
        if response.response.as_deref() == Some("Error") {
            return Err(FetchError::ProviderReported {
                provider: PROVIDER_ID.to_string(),
                message: response
                    .message
                    .unwrap_or_else(|| "unspecified error".to_string()),
            });
        }

        let candles: Vec<Candle> = response
            .data
            .map(|d| d.data)
            .unwrap_or_default()
            .into_iter()
            .map(normalize_candle)
            .collect();

        debug!("CryptoCompare: {} candles for {}", candles.len(), fsym);

        Ok(candles)
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Map one upstream candle; volume is taken in the quote currency so it
/// lines up with USD-denominated volume elsewhere.
fn normalize_candle(raw: HistoCandle) -> Candle {
    Candle {
        time: raw.time,
        open: raw.open,
        high: raw.high,
        low: raw.low,
        close: raw.close,
        volume: raw.volumeto,
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
        let provider = CryptoCompareProvider::new(Some("key".to_string()));
        assert_eq!(provider.id(), "CRYPTOCOMPARE");
        assert_eq!(provider.priority(), 1);
        assert_eq!(provider.min_interval(), Duration::from_millis(500));
        assert!(provider.capabilities().serves(Resource::Ohlc));
        assert!(!provider.capabilities().serves(Resource::Markets));
    }

    #[test]
    fn test_histohour_parsing() {
        let json = r#"{
            "Response": "Success",
            "Message": "",
            "Data": {
                "Aggregated": false,
                "TimeFrom": 1735686000,
                "TimeTo": 1735689600,
                "Data": [
                    {
                        "time": 1735686000,
                        "high": 43500.0,
                        "low": 43000.0,
                        "open": 43100.0,
                        "close": 43400.0,
                        "volumefrom": 1250.5,
                        "volumeto": 54100000.0
                    },
                    {
                        "time": 1735689600,
                        "high": 43600.0,
                        "low": 43300.0,
                        "open": 43400.0,
                        "close": 43550.0,
                        "volumefrom": 980.2,
                        "volumeto": 42600000.0
                    }
                ]
            }
        }"#;

        let response: HistoResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.response.as_deref(), Some("Success"));

        let candles: Vec<Candle> = response
            .data
            .map(|d| d.data)
            .unwrap_or_default()
            .into_iter()
            .map(normalize_candle)
            .collect();

        assert_eq!(candles.len(), 2);
        assert_eq!(candles[0].time, 1735686000);
        assert_eq!(candles[0].open, 43100.0);
        assert_eq!(candles[0].close, 43400.0);
        // Quote-currency volume is the one kept
        assert_eq!(candles[0].volume, 54100000.0);
    }

    #[test]
    fn test_in_band_error_detected() {
        let json = r#"{
            "Response": "Error",
            "Message": "There is no data for the symbol FAKECOIN.",
            "Data": {}
        }"#;

        let response: HistoResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.response.as_deref(), Some("Error"));
        assert_eq!(
            response.message.as_deref(),
            Some("There is no data for the symbol FAKECOIN.")
        );
    }

    #[test]
    fn test_missing_data_block_yields_empty_series() {
        let json = r#"{"Response": "Success"}"#;

        let response: HistoResponse = serde_json::from_str(json).unwrap();
        let candles: Vec<Candle> = response
            .data
            .map(|d| d.data)
            .unwrap_or_default()
            .into_iter()
            .map(normalize_candle)
            .collect();

        assert!(candles.is_empty());
    }
}
