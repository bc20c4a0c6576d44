use serde::{Deserialize, Serialize};

/// One hourly OHLCV candle.
///
/// Some upstreams (Binance) send every numeric field as a string; the
/// adapters coerce those leniently, so a garbled field shows up as `0`
/// rather than dropping the candle.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq)]
pub struct Candle {
    /// Candle open time, unix seconds
    pub time: i64,

    /// Opening price in USD
    pub open: f64,

    /// High price in USD
    pub high: f64,

    /// Low price in USD
    pub low: f64,

    /// Closing price in USD
    pub close: f64,

    /// Traded volume over the hour, quoted in USD
    pub volume: f64,
}
