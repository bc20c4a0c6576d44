//! Alternative.me sentiment provider implementation.
//!
//! Sole source for the crypto Fear & Greed index. The payload is a
//! one-row history with string-typed numerics and an error slot in the
//! metadata block.
//! API documentation: https://alternative.me/crypto/fear-and-greed-index/

use std::time::Duration;

use async_trait::async_trait;
use chrono::{TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::debug;

use crate::errors::FetchError;
use crate::models::{lenient_f64, FearGreedIndex};
use crate::provider::{MarketProvider, ProviderCapabilities, Resource};

const BASE_URL: &str = "https://api.alternative.me";
const PROVIDER_ID: &str = "ALTERNATIVE_ME";

const MIN_INTERVAL: Duration = Duration::from_millis(1000);

// ============================================================================
// API Response Structures
// ============================================================================

/// Envelope from /fng/
#[derive(Debug, Deserialize)]
struct FngResponse {
    #[serde(default)]
    data: Vec<FngRow>,
    metadata: Option<FngMetadata>,
}

/// One index reading; numerics arrive string-typed
#[derive(Debug, Deserialize)]
struct FngRow {
    value: Option<String>,
    value_classification: Option<String>,
    /// Unix seconds, as a string
    timestamp: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FngMetadata {
    error: Option<String>,
}

// ============================================================================
// AlternativeMeProvider
// ============================================================================

/// Alternative.me Fear & Greed index provider.
pub struct AlternativeMeProvider {
    client: Client,
}

impl AlternativeMeProvider {
    pub fn new() -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(10))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self { client }
    }

    /// Make a GET request to the Alternative.me API.
    async fn fetch(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, FetchError> {
        let url = format!("{}{}", BASE_URL, endpoint);

        let mut request = self.client.get(&url);

        for (key, value) in params {
            request = request.query(&[(key, value)]);
        }

        debug!("Alternative.me request: {}", endpoint);

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

impl Default for AlternativeMeProvider {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// MarketProvider Implementation
// ============================================================================

#[async_trait]
impl MarketProvider for AlternativeMeProvider {
    fn id(&self) -> &'static str {
        PROVIDER_ID
    }

    fn priority(&self) -> u8 {
        // Only source for this resource
        1
    }

    fn capabilities(&self) -> ProviderCapabilities {
        ProviderCapabilities {
            resources: &[Resource::FearGreed],
        }
    }

    fn min_interval(&self) -> Duration {
        MIN_INTERVAL
    }

    async fn fetch_fear_greed(&self) -> Result<FearGreedIndex, FetchError> {
        let text = self.fetch("/fng/", &[("limit", "1")]).await?;

        let response: FngResponse =
            serde_json::from_str(&text).map_err(|e| FetchError::MalformedResponse {
                provider: PROVIDER_ID.to_string(),
                reason: format!("Failed to parse fng response: {}", e),
            })?;

        // A 200 can still carry an error in the metadata block
        if let Some(message) = response.metadata.and_then(|m| m.error) {
            return Err(FetchError::ProviderReported {
                provider: PROVIDER_ID.to_string(),
                message,
            });
        }

        let row = response
            .data
            .into_iter()
            .next()
            .ok_or_else(|| FetchError::MalformedResponse {
                provider: PROVIDER_ID.to_string(),
                reason: "empty data array".to_string(),
            })?;

        Ok(normalize_reading(row))
    }
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Normalize one index reading. The value clamps into 0..=100 and an
/// absent classification falls back to the scale midpoint label.
fn normalize_reading(row: FngRow) -> FearGreedIndex {
    let value = lenient_f64(row.value.as_deref().unwrap_or_default()).clamp(0.0, 100.0) as u8;

    let timestamp = row
        .timestamp
        .as_deref()
        .and_then(|raw| raw.trim().parse::<i64>().ok())
        .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
        .unwrap_or_else(Utc::now);

    FearGreedIndex {
        value,
        classification: row
            .value_classification
            .unwrap_or_else(|| "Neutral".to_string()),
        timestamp,
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
        let provider = AlternativeMeProvider::new();
        assert_eq!(provider.id(), "ALTERNATIVE_ME");
        assert_eq!(provider.priority(), 1);
        assert_eq!(provider.min_interval(), Duration::from_millis(1000));
        assert!(provider.capabilities().serves(Resource::FearGreed));
        assert!(!provider.capabilities().serves(Resource::Markets));
    }

    #[test]
    fn test_reading_parsing_and_normalization() {
        let json = r#"{
            "name": "Fear and Greed Index",
            "data": [
                {
                    "value": "29",
                    "value_classification": "Fear",
                    "timestamp": "1735689600",
                    "time_until_update": "3600"
                }
            ],
            "metadata": { "error": null }
        }"#;

        let response: FngResponse = serde_json::from_str(json).unwrap();
        assert!(response.metadata.unwrap().error.is_none());

        let reading = normalize_reading(response.data.into_iter().next().unwrap());
        assert_eq!(reading.value, 29);
        assert_eq!(reading.classification, "Fear");
        assert_eq!(reading.timestamp.timestamp(), 1735689600);
    }

    #[test]
    fn test_garbage_value_clamps_to_zero() {
        let row = FngRow {
            value: Some("not-a-number".to_string()),
            value_classification: None,
            timestamp: Some("garbage".to_string()),
        };

        let reading = normalize_reading(row);
        assert_eq!(reading.value, 0);
        assert_eq!(reading.classification, "Neutral");
        // Unparseable timestamp falls back to now
        assert!(reading.timestamp.timestamp() > 1735689600);
    }

    #[test]
    fn test_out_of_range_value_clamps() {
        let row = FngRow {
            value: Some("250".to_string()),
            value_classification: Some("Extreme Greed".to_string()),
            timestamp: Some("1735689600".to_string()),
        };

        let reading = normalize_reading(row);
        assert_eq!(reading.value, 100);
    }

    #[test]
    fn test_metadata_error_detected() {
        let json = r#"{
            "name": "Fear and Greed Index",
            "data": [],
            "metadata": { "error": "service unavailable" }
        }"#;

        let response: FngResponse = serde_json::from_str(json).unwrap();
        assert_eq!(
            response.metadata.and_then(|m| m.error),
            Some("service unavailable".to_string())
        );
        assert!(response.data.is_empty());
    }
}
