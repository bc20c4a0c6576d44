use serde::{Deserialize, Serialize};

/// Single-asset detail lookup.
///
/// Fallback providers carry fewer fields than the primary; missing
/// strings stay empty and missing numerics stay `0` rather than failing
/// the lookup.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct CoinDetail {
    /// Provider-assigned slug, lowercase
    pub id: String,

    /// Uppercase ticker
    pub symbol: String,

    /// Display name
    pub name: String,

    /// Description text, possibly empty
    pub description: String,

    /// Logo URL, possibly empty
    pub image: String,

    /// Latest price in USD
    pub current_price: f64,

    /// Market capitalization in USD
    pub market_cap: f64,

    /// 24h traded volume in USD
    pub total_volume: f64,

    /// Signed 24h price change, percent
    pub price_change_percentage_24h: f64,

    /// 24h high in USD, `0` when the provider has none
    pub high_24h: f64,

    /// 24h low in USD, `0` when the provider has none
    pub low_24h: f64,

    /// Circulating supply in native units
    pub circulating_supply: f64,

    /// Project homepage or explorer URL, possibly empty
    pub homepage: String,
}
