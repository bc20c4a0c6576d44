//! Composite trading-signal engine.
//!
//! Folds the indicators into a per-asset recommendation via a fixed
//! decision table: rows are evaluated top to bottom and the first match
//! wins, so the output is a deterministic scoring contract rather than a
//! heuristic. Assets without a sparkline get a synthesized history so
//! every indicator stays defined.

use serde::{Deserialize, Serialize};

use crate::models::MarketEntry;

use super::indicators;

/// Entries considered for a digest.
const DIGEST_CANDIDATES: usize = 10;

/// Signals a digest keeps after ranking.
const DIGEST_SIZE: usize = 8;

/// Trade action from the decision table.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum SignalAction {
    #[serde(rename = "STRONG BUY")]
    StrongBuy,
    #[serde(rename = "BUY")]
    Buy,
    #[serde(rename = "HOLD")]
    Hold,
    #[serde(rename = "SELL")]
    Sell,
    #[serde(rename = "STRONG SELL")]
    StrongSell,
}

/// Qualitative risk attached to a recommendation.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// Full per-asset signal payload.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TradingSignal {
    pub symbol: String,
    pub name: String,
    /// Quoted trading pair, e.g. "BTC/USDT"
    pub pair: String,
    pub current_price: f64,
    pub signal: SignalAction,
    /// Decision-table confidence, 70..=92
    pub confidence: u8,
    pub risk: RiskLevel,
    pub rsi: f64,
    pub support: f64,
    pub resistance: f64,
    pub week_high: f64,
    pub week_low: f64,
    /// Percent change across the history window
    pub trend_pct: f64,
    pub target_price: f64,
    pub stop_loss: f64,
    /// Derived hit-rate estimate, `72 + confidence / 20`
    pub win_rate: u8,
    pub volume_trend: String,
    /// Assembled human-readable explanation
    pub analysis: String,
}

/// Ranked signal digest for the leading assets.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SignalDigest {
    /// Single highest-confidence signal, absent for an empty market list
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_signal: Option<TradingSignal>,
    /// Up to eight signals, confidence descending
    pub signals: Vec<TradingSignal>,
}

/// Compute the full signal payload for one market entry.
pub fn analyze(entry: &MarketEntry) -> TradingSignal {
    let history = if entry.sparkline_7d.is_empty() {
        indicators::synthetic_history(entry.current_price)
    } else {
        entry.sparkline_7d.clone()
    };

    let change_24h = entry.price_change_percentage_24h;
    let rsi = indicators::rsi(&history, change_24h);
    let macd = indicators::macd_bullish(&history);
    let trend = indicators::trend_pct(&history);
    let support = indicators::support(&history);
    let resistance = indicators::resistance(&history);

    let (signal, confidence, risk) = decide(rsi, change_24h, trend, macd);

    TradingSignal {
        symbol: entry.symbol.clone(),
        name: entry.name.clone(),
        pair: format!("{}/USDT", entry.symbol),
        current_price: entry.current_price,
        signal,
        confidence,
        risk,
        rsi,
        support,
        resistance,
        week_high: indicators::window_high(&history),
        week_low: indicators::window_low(&history),
        trend_pct: trend,
        // Trade levels reuse the padded range bounds
        target_price: resistance,
        stop_loss: support,
        win_rate: 72 + confidence / 20,
        volume_trend: volume_trend(entry.total_volume, entry.market_cap).to_string(),
        analysis: build_analysis(rsi, change_24h, macd, entry.total_volume, entry.market_cap),
    }
}

/// Signals for the first `DIGEST_CANDIDATES` entries, ranked by
/// confidence. The sort is stable, so equal confidences keep the
/// aggregator's market-cap ordering.
pub fn digest(entries: &[MarketEntry]) -> SignalDigest {
    let mut signals: Vec<TradingSignal> = entries
        .iter()
        .take(DIGEST_CANDIDATES)
        .map(analyze)
        .collect();

    signals.sort_by(|a, b| b.confidence.cmp(&a.confidence));

    let top_signal = signals.first().cloned();
    signals.truncate(DIGEST_SIZE);

    SignalDigest {
        top_signal,
        signals,
    }
}

/// The decision table. Rows are ordered; the first match wins.
fn decide(
    rsi: f64,
    change_24h: f64,
    trend: f64,
    macd_bullish: bool,
) -> (SignalAction, u8, RiskLevel) {
    if rsi < 30.0 && change_24h < -5.0 {
        (SignalAction::StrongBuy, 92, RiskLevel::Low)
    } else if rsi < 40.0 && trend < 0.0 {
        (SignalAction::Buy, 84, RiskLevel::Medium)
    } else if macd_bullish && rsi < 55.0 {
        (SignalAction::Buy, 78, RiskLevel::Medium)
    } else if rsi > 70.0 && change_24h > 5.0 {
        (SignalAction::StrongSell, 90, RiskLevel::High)
    } else if rsi > 65.0 && trend > 2.0 {
        (SignalAction::Sell, 82, RiskLevel::Medium)
    } else {
        (SignalAction::Hold, 75, RiskLevel::Low)
    }
}

/// Volume activity label from the volume to market-cap ratio.
fn volume_trend(volume: f64, market_cap: f64) -> &'static str {
    if market_cap <= 0.0 {
        return "Low";
    }

    let ratio = volume / market_cap;
    if ratio >= 0.10 {
        "High"
    } else if ratio >= 0.03 {
        "Moderate"
    } else {
        "Low"
    }
}

/// Assemble the explanation from four independent threshold checks:
/// RSI band, 24h momentum, MACD direction, and volume ratio.
fn build_analysis(
    rsi: f64,
    change_24h: f64,
    macd_bullish: bool,
    volume: f64,
    market_cap: f64,
) -> String {
    let rsi_condition = if rsi > 70.0 {
        "Overbought"
    } else if rsi < 30.0 {
        "Oversold"
    } else if rsi > 50.0 {
        "Strong"
    } else {
        "Weak"
    };

    let strength = if change_24h > 2.0 {
        "Strong"
    } else if change_24h > 0.0 {
        "Moderate"
    } else {
        "Weak"
    };
    let direction = if change_24h > 0.0 { "bullish" } else { "bearish" };

    let macd_clause = if macd_bullish {
        "Bullish MACD crossover"
    } else {
        "Bearish MACD crossover"
    };

    let ratio_pct = if market_cap > 0.0 {
        volume / market_cap * 100.0
    } else {
        0.0
    };

    format!(
        "{} RSI at {:.1}. {} {} momentum over 24h ({:+.1}%). {}. Volume at {:.1}% of market cap.",
        rsi_condition, rsi, strength, direction, change_24h, macd_clause, ratio_pct
    )
}
