//! Canonical data models
//!
//! This module contains the normalized records every adapter must emit,
//! regardless of the upstream shape it started from:
//! - `market` - Per-asset market entry (MarketEntry)
//! - `global` - Market-wide aggregate metrics (GlobalMetrics)
//! - `sentiment` - Fear & Greed index reading (FearGreedIndex)
//! - `detail` - Single-asset detail lookup (CoinDetail)
//! - `ohlc` - Hourly OHLCV candle (Candle)
//! - `parse` - Garbage-tolerant numeric coercion helpers

mod detail;
mod global;
mod market;
mod ohlc;
mod parse;
mod sentiment;

pub use detail::CoinDetail;
pub use global::{DataQuality, GlobalMetrics};
pub use market::{MarketEntry, MAX_SPARKLINE_POINTS};
pub use ohlc::Candle;
pub use parse::{json_f64, json_i64, lenient_f64, lenient_rank};
pub use sentiment::FearGreedIndex;
