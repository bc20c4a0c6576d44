use serde::{Deserialize, Serialize};

/// Whether a payload was measured upstream or padded with a documented
/// estimate by a fallback adapter.
///
/// CoinPaprika's global endpoint carries no ETH dominance, so its adapter
/// fills a constant estimate and marks the whole payload `Estimated`.
/// Consumers that care about precision should check this before trusting
/// the dominance figures.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DataQuality {
    /// All fields come from the upstream response.
    Measured,
    /// One or more fields are adapter-supplied estimates.
    Estimated,
}

/// Market-wide aggregate metrics.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct GlobalMetrics {
    /// Total market capitalization in USD
    pub total_market_cap: f64,

    /// Total 24h traded volume in USD
    pub total_volume: f64,

    /// Bitcoin share of total market cap, percent
    pub btc_dominance: f64,

    /// Ethereum share of total market cap, percent
    pub eth_dominance: f64,

    /// 24h market cap change, percent
    pub market_cap_change_24h: f64,

    /// Number of actively tracked assets
    pub active_cryptocurrencies: u64,

    /// Provenance marker for the fields above
    pub data_quality: DataQuality,
}
