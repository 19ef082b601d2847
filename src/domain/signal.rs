//! The two entry sub-strategies.
//!
//! Both read the latest [`IndicatorSnapshot`] and the latest close and return a
//! side, or `None` when there is no signal.

use crate::domain::indicator::snapshot::IndicatorSnapshot;
use crate::domain::order::Side;

/// BUY, SELL or no signal for one sub-strategy on one instrument this tick.
pub type SignalDecision = Option<Side>;

/// Method label used when the band-reversion rule trades on its own.
pub const BAND_REVERSION_LABEL: &str = "double_bbands";
/// Method label used when the counter-trend rule trades on its own.
pub const COUNTER_TREND_LABEL: &str = "counter_trend";

/// Four-zone classification against the outer (A) and inner (B) bands.
///
/// Branches are checked in order and the first match wins:
/// 1. `upper_B < price <= upper_A` → BUY
/// 2. `lower_A <= price < lower_B` → SELL
/// 3. `price > upper_A` → SELL
/// 4. `price < lower_A` → BUY
pub fn band_reversion(price: f64, snapshot: &IndicatorSnapshot) -> SignalDecision {
    if price > snapshot.inner_upper && price <= snapshot.outer_upper {
        Some(Side::Buy)
    } else if price < snapshot.inner_lower && price >= snapshot.outer_lower {
        Some(Side::Sell)
    } else if price > snapshot.outer_upper {
        Some(Side::Sell)
    } else if price < snapshot.outer_lower {
        Some(Side::Buy)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CounterTrendThresholds {
    pub overbought: f64,
    pub oversold: f64,
}

impl Default for CounterTrendThresholds {
    fn default() -> Self {
        CounterTrendThresholds {
            overbought: 70.0,
            oversold: 30.0,
        }
    }
}

/// Fade an outer-band breakout when the oscillator confirms exhaustion.
pub fn counter_trend(
    price: f64,
    snapshot: &IndicatorSnapshot,
    thresholds: &CounterTrendThresholds,
) -> SignalDecision {
    let oscillator = snapshot.stoch_rsi();
    if price > snapshot.outer_upper && oscillator >= thresholds.overbought {
        Some(Side::Sell)
    } else if price < snapshot.outer_lower && oscillator <= thresholds.oversold {
        Some(Side::Buy)
    } else {
        None
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubStrategySignals {
    pub band_reversion: SignalDecision,
    pub counter_trend: SignalDecision,
}

pub fn generate(
    price: f64,
    snapshot: &IndicatorSnapshot,
    thresholds: &CounterTrendThresholds,
) -> SubStrategySignals {
    SubStrategySignals {
        band_reversion: band_reversion(price, snapshot),
        counter_trend: counter_trend(price, snapshot, thresholds),
    }
}
