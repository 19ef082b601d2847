//! Reconciles the sub-strategy decisions into entry candidates.

use crate::domain::order::Side;
use crate::domain::signal::{
    SignalDecision, SubStrategySignals, BAND_REVERSION_LABEL, COUNTER_TREND_LABEL,
};

/// Method label for orders placed when both rules agree.
pub const COMBINED_LABEL: &str = "combine";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalPolicy {
    /// Trade only when both rules agree, under [`COMBINED_LABEL`].
    Combined,
    /// Each rule trades on its own under its own label.
    Independent,
}

impl SignalPolicy {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "combined" | "combine" => Some(SignalPolicy::Combined),
            "independent" => Some(SignalPolicy::Independent),
            _ => None,
        }
    }
}

/// Short-term direction check applied to candidates before throttling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrendFilter {
    /// How many bars back the comparison close sits: 1 = prior bar.
    pub lookback: usize,
}

impl Default for TrendFilter {
    fn default() -> Self {
        TrendFilter { lookback: 1 }
    }
}

impl TrendFilter {
    /// SELL needs the latest close above the comparison close, BUY needs it below.
    pub fn confirms(&self, side: Side, closes: &[f64]) -> bool {
        let lookback = self.lookback.max(1);
        if closes.len() <= lookback {
            return false;
        }
        let latest = closes[closes.len() - 1];
        let reference = closes[closes.len() - 1 - lookback];
        match side {
            Side::Sell => latest > reference,
            Side::Buy => latest < reference,
        }
    }
}

/// Agreement on the same non-empty side.
pub fn agree(a: SignalDecision, b: SignalDecision) -> SignalDecision {
    match (a, b) {
        (Some(x), Some(y)) if x == y => Some(x),
        _ => None,
    }
}

fn filtered(decision: SignalDecision, closes: &[f64], filter: Option<&TrendFilter>) -> SignalDecision {
    decision.filter(|side| filter.is_none_or(|f| f.confirms(*side, closes)))
}

/// Entry candidates for one instrument, as `(method label, side)` pairs.
pub fn entry_candidates(
    signals: &SubStrategySignals,
    closes: &[f64],
    policy: SignalPolicy,
    filter: Option<&TrendFilter>,
) -> Vec<(&'static str, Side)> {
    match policy {
        SignalPolicy::Combined => {
            filtered(agree(signals.band_reversion, signals.counter_trend), closes, filter)
                .map(|side| vec![(COMBINED_LABEL, side)])
                .unwrap_or_default()
        }
        SignalPolicy::Independent => [
            (BAND_REVERSION_LABEL, signals.band_reversion),
            (COUNTER_TREND_LABEL, signals.counter_trend),
        ]
        .into_iter()
        .filter_map(|(label, decision)| {
            filtered(decision, closes, filter).map(|side| (label, side))
        })
        .collect(),
    }
}
