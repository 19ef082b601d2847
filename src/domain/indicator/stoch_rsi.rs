//! Stochastic RSI.
//!
//! RSI(r) fed into a stochastic oscillator over s bars, then smoothed:
//! - raw[i] = 100 * (RSI[i] - min(RSI, s)) / (max(RSI, s) - min(RSI, s)), 0 when the range is flat
//! - %K = SMA(raw, k)
//! - %D = SMA(%K, d)
//!
//! Warmup: a point is valid once %D is, i.e. from bar (r + s + k + d - 3).

use crate::domain::indicator::rsi::calculate_rsi;
use crate::domain::indicator::sma::trailing_mean;
use crate::domain::indicator::{IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PriceBar;

pub fn calculate_stoch_rsi(
    bars: &[PriceBar],
    rsi_period: usize,
    stoch_period: usize,
    k_period: usize,
    d_period: usize,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::StochRsi {
        rsi_period,
        stoch_period,
        k_period,
        d_period,
    };
    if rsi_period == 0 || stoch_period == 0 || k_period == 0 || d_period == 0 {
        return IndicatorSeries {
            indicator_type,
            values: Vec::new(),
        };
    }

    let rsi: Vec<f64> = calculate_rsi(bars, rsi_period)
        .values
        .iter()
        .map(|p| match p.value {
            IndicatorValue::Simple(v) => v,
            _ => 0.0,
        })
        .collect();

    let raw_start = rsi_period + stoch_period - 1;
    let k_start = raw_start + k_period - 1;
    let d_start = k_start + d_period - 1;

    let mut raw = vec![0.0; bars.len()];
    let mut k = vec![0.0; bars.len()];
    let mut values = Vec::with_capacity(bars.len());

    for (i, bar) in bars.iter().enumerate() {
        if i >= raw_start {
            let window = &rsi[i + 1 - stoch_period..=i];
            let lowest = window.iter().copied().fold(f64::INFINITY, f64::min);
            let highest = window.iter().copied().fold(f64::NEG_INFINITY, f64::max);
            let range = highest - lowest;
            raw[i] = if range > 0.0 {
                100.0 * (rsi[i] - lowest) / range
            } else {
                0.0
            };
        }
        if i >= k_start {
            k[i] = trailing_mean(&raw, i, k_period);
        }

        let valid = i >= d_start;
        let (k_val, d_val) = if valid {
            (k[i], trailing_mean(&k, i, d_period))
        } else {
            (0.0, 0.0)
        };

        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid,
            value: IndicatorValue::Stochastic { k: k_val, d: d_val },
        });
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}
