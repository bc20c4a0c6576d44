//! Technical indicators computed over a price history window.
//!
//! All functions are pure and total: degenerate histories (empty, short,
//! or flat) produce documented fallback values instead of errors, since
//! upstream sparklines are best-effort.

/// Price moves per RSI window.
pub const RSI_PERIOD: usize = 14;

/// Fast EMA window for the MACD direction.
const MACD_FAST: usize = 12;

/// Slow EMA window for the MACD direction.
const MACD_SLOW: usize = 26;

/// Points in a synthesized stand-in history.
const SYNTHETIC_POINTS: usize = 7;

/// Relative Strength Index over the last `RSI_PERIOD` points.
///
/// Histories shorter than one period fall back to an estimate anchored
/// on the 24h change: `clamp(50 + 1.5 * change_24h, 0, 100)`. A window
/// with zero losses reads 100 when it gained and 50 when it was flat.
pub fn rsi(history: &[f64], change_24h: f64) -> f64 {
    if history.len() < RSI_PERIOD {
        return (50.0 + 1.5 * change_24h).clamp(0.0, 100.0);
    }

    let start = history.len() - RSI_PERIOD;
    let mut gains = 0.0;
    let mut losses = 0.0;

    for i in start..history.len() {
        if i == 0 {
            continue;
        }
        let diff = history[i] - history[i - 1];
        if diff > 0.0 {
            gains += diff;
        } else {
            losses -= diff;
        }
    }

    let avg_gain = gains / RSI_PERIOD as f64;
    let avg_loss = losses / RSI_PERIOD as f64;

    if avg_loss == 0.0 {
        return if avg_gain > 0.0 { 100.0 } else { 50.0 };
    }

    let rs = avg_gain / avg_loss;
    100.0 - 100.0 / (1.0 + rs)
}

/// Whether the fast EMA sits above the slow EMA. Histories shorter than
/// the slow window carry no signal and read bearish.
pub fn macd_bullish(history: &[f64]) -> bool {
    if history.len() < MACD_SLOW {
        return false;
    }

    let ema_fast = ema_over_window(history, MACD_FAST);
    let ema_slow = ema_over_window(history, MACD_SLOW);

    ema_fast - ema_slow > 0.0
}

/// EMA over the last `n` points, seeded at the most recent price and
/// folded backwards through the window with smoothing `2 / (n + 1)`.
fn ema_over_window(history: &[f64], n: usize) -> f64 {
    let window = &history[history.len() - n..];
    let k = 2.0 / (n as f64 + 1.0);

    let mut ema = match window.last() {
        Some(last) => *last,
        None => return 0.0,
    };

    for price in window.iter().rev().skip(1) {
        ema = price * k + ema * (1.0 - k);
    }

    ema
}

/// Highest point of the window, 0 for an empty history.
pub fn window_high(history: &[f64]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    history.iter().copied().fold(f64::MIN, f64::max)
}

/// Lowest point of the window, 0 for an empty history.
pub fn window_low(history: &[f64]) -> f64 {
    if history.is_empty() {
        return 0.0;
    }
    history.iter().copied().fold(f64::MAX, f64::min)
}

/// Resistance estimate: 2% above the window high.
pub fn resistance(history: &[f64]) -> f64 {
    window_high(history) * 1.02
}

/// Support estimate: 2% below the window low.
pub fn support(history: &[f64]) -> f64 {
    window_low(history) * 0.98
}

/// Percent change from the first to the last point of the window.
pub fn trend_pct(history: &[f64]) -> f64 {
    match (history.first(), history.last()) {
        (Some(first), Some(last)) if *first != 0.0 => (last - first) / first * 100.0,
        _ => 0.0,
    }
}

/// Stand-in history for an asset with no sparkline: a deterministic
/// 7-point decay ending at the current price, each step 1% above the
/// next. Keeps the downstream indicators defined without inventing
/// random data.
pub fn synthetic_history(current_price: f64) -> Vec<f64> {
    (0..SYNTHETIC_POINTS)
        .map(|i| current_price * 1.01f64.powi((SYNTHETIC_POINTS - 1 - i) as i32))
        .collect()
}
