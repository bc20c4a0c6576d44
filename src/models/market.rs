use serde::{Deserialize, Serialize};

/// Upper bound on sparkline length: one hourly point per hour of a 7 day
/// window. Adapters truncate longer upstream series to the most recent
/// points.
pub const MAX_SPARKLINE_POINTS: usize = 168;

/// Canonical per-asset market record.
///
/// Every adapter emits exactly this shape. Numeric fields that the
/// upstream omits or garbles are coerced to `0` rather than failing the
/// whole payload; see [`crate::models::lenient_f64`].
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct MarketEntry {
    /// Provider-assigned slug, lowercase (e.g. "bitcoin", "btc-bitcoin")
    pub id: String,

    /// Uppercase ticker (e.g. "BTC")
    pub symbol: String,

    /// Display name
    pub name: String,

    /// Logo URL, possibly prefixed with the provider's CDN host.
    /// Empty when the provider has none.
    pub image: String,

    /// Latest price in USD
    pub current_price: f64,

    /// Market capitalization in USD
    pub market_cap: f64,

    /// 24h traded volume in USD
    pub total_volume: f64,

    /// Provider-assigned rank (1 = largest). Absent when the upstream
    /// carries no ranking and the adapter assigned sequential order.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub market_cap_rank: Option<u32>,

    /// Signed 24h price change, percent
    pub price_change_percentage_24h: f64,

    /// Chronological 7d price series, up to [`MAX_SPARKLINE_POINTS`]
    /// points. Empty when the provider supplies no history.
    pub sparkline_7d: Vec<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_serialize_skips_absent_rank() {
        let entry = MarketEntry {
            id: "bitcoin".to_string(),
            symbol: "BTC".to_string(),
            name: "Bitcoin".to_string(),
            image: String::new(),
            current_price: 43250.0,
            market_cap: 845_000_000_000.0,
            total_volume: 28_000_000_000.0,
            market_cap_rank: None,
            price_change_percentage_24h: -1.2,
            sparkline_7d: vec![],
        };

        let json = serde_json::to_string(&entry).unwrap();
        assert!(!json.contains("market_cap_rank"));
    }

    #[test]
    fn test_round_trip_with_rank() {
        let entry = MarketEntry {
            id: "ethereum".to_string(),
            symbol: "ETH".to_string(),
            name: "Ethereum".to_string(),
            image: "https://example.com/eth.png".to_string(),
            current_price: 2280.5,
            market_cap: 274_000_000_000.0,
            total_volume: 12_000_000_000.0,
            market_cap_rank: Some(2),
            price_change_percentage_24h: 3.4,
            sparkline_7d: vec![2200.0, 2240.0, 2280.5],
        };

        let json = serde_json::to_string(&entry).unwrap();
        let back: MarketEntry = serde_json::from_str(&json).unwrap();
        assert_eq!(back, entry);
    }
}
