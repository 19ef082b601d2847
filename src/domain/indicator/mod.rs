//! Bollinger bands, RSI, stochastic RSI and SMA over a bar history.
//!
//! Each calculator returns a full [`IndicatorSeries`] so warmup and NaN checks
//! happen in one place; [`snapshot`] keeps only the last bar for the signal
//! rules and the exit evaluator.

pub mod bollinger;
pub mod rsi;
pub mod sma;
pub mod snapshot;
pub mod stddev;
pub mod stoch_rsi;

use chrono::NaiveDateTime;
use std::fmt;

#[derive(Debug, Clone)]
pub struct IndicatorPoint {
    pub timestamp: NaiveDateTime,
    pub valid: bool,
    pub value: IndicatorValue,
}

#[derive(Debug, Clone, PartialEq)]
pub enum IndicatorValue {
    Simple(f64),
    Stochastic { k: f64, d: f64 },
    Bollinger { upper: f64, middle: f64, lower: f64 },
}

impl IndicatorValue {
    pub fn is_finite(&self) -> bool {
        match *self {
            IndicatorValue::Simple(v) => v.is_finite(),
            IndicatorValue::Stochastic { k, d } => k.is_finite() && d.is_finite(),
            IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            } => upper.is_finite() && middle.is_finite() && lower.is_finite(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum IndicatorType {
    Sma(usize),
    Rsi(usize),
    StochRsi {
        rsi_period: usize,
        stoch_period: usize,
        k_period: usize,
        d_period: usize,
    },
    Bollinger {
        period: usize,
        stddev_mult_x100: u32,
    },
}

impl IndicatorType {
    /// Bars needed before the indicator produces its first valid point.
    pub fn lookback(&self) -> usize {
        match *self {
            IndicatorType::Sma(period) | IndicatorType::Bollinger { period, .. } => period.max(1),
            IndicatorType::Rsi(period) => period.max(1) + 1,
            IndicatorType::StochRsi {
                rsi_period,
                stoch_period,
                k_period,
                d_period,
            } => {
                rsi_period.max(1) + stoch_period.max(1) + k_period.max(1) + d_period.max(1) - 2
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct IndicatorSeries {
    pub indicator_type: IndicatorType,
    pub values: Vec<IndicatorPoint>,
}

impl IndicatorSeries {
    pub fn latest(&self) -> Option<&IndicatorPoint> {
        self.values.last()
    }
}

impl fmt::Display for IndicatorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            IndicatorType::Sma(period) => write!(f, "SMA({})", period),
            IndicatorType::Rsi(period) => write!(f, "RSI({})", period),
            IndicatorType::StochRsi {
                rsi_period,
                stoch_period,
                k_period,
                d_period,
            } => write!(
                f,
                "STOCHRSI({},{},{},{})",
                rsi_period, stoch_period, k_period, d_period
            ),
            IndicatorType::Bollinger {
                period,
                stddev_mult_x100,
            } => {
                let mult = *stddev_mult_x100 as f64 / 100.0;
                write!(f, "BOLLINGER({},{})", period, mult)
            }
        }
    }
}

/// Convert a band multiplier such as 2.3 into the hundredths used by [`IndicatorType::Bollinger`].
pub fn mult_to_x100(mult: f64) -> u32 {
    (mult * 100.0).round().max(0.0) as u32
}
