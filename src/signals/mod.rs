//! Derived signals module.
//!
//! Pure, deterministic computation over normalized market data:
//! - Technical indicators (RSI, MACD direction, range bounds, trend)
//! - The composite decision table and per-asset signal payload
//! - Ranked signal digests for the leading assets

mod engine;
mod indicators;

pub use engine::{analyze, digest, RiskLevel, SignalAction, SignalDigest, TradingSignal};
pub use indicators::{
    macd_bullish, resistance, rsi, support, synthetic_history, trend_pct, window_high,
    window_low, RSI_PERIOD,
};
