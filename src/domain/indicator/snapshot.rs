//! Latest-bar indicator values consumed by the signal rules and exit evaluator.

use crate::domain::error::EngineError;
use crate::domain::indicator::bollinger::calculate_bollinger;
use crate::domain::indicator::sma::calculate_sma;
use crate::domain::indicator::stoch_rsi::calculate_stoch_rsi;
use crate::domain::indicator::{mult_to_x100, IndicatorSeries, IndicatorType, IndicatorValue};
use crate::domain::ohlcv::PriceSeries;

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorParams {
    pub window: usize,
    pub stddev_mult: f64,
    pub inner_stddev_mult: f64,
    pub rsi_period: usize,
    pub stoch_period: usize,
    pub k_period: usize,
    pub d_period: usize,
    pub sma_window: usize,
}

impl Default for IndicatorParams {
    fn default() -> Self {
        IndicatorParams {
            window: 20,
            stddev_mult: 2.0,
            inner_stddev_mult: 1.0,
            rsi_period: 14,
            stoch_period: 14,
            k_period: 3,
            d_period: 3,
            sma_window: 20,
        }
    }
}

impl IndicatorParams {
    pub fn outer_bands(&self) -> IndicatorType {
        IndicatorType::Bollinger {
            period: self.window,
            stddev_mult_x100: mult_to_x100(self.stddev_mult),
        }
    }

    pub fn inner_bands(&self) -> IndicatorType {
        IndicatorType::Bollinger {
            period: self.window,
            stddev_mult_x100: mult_to_x100(self.inner_stddev_mult),
        }
    }

    pub fn stoch_rsi(&self) -> IndicatorType {
        IndicatorType::StochRsi {
            rsi_period: self.rsi_period,
            stoch_period: self.stoch_period,
            k_period: self.k_period,
            d_period: self.d_period,
        }
    }

    pub fn sma(&self) -> IndicatorType {
        IndicatorType::Sma(self.sma_window)
    }

    /// Shortest history that yields a fully valid snapshot.
    pub fn minimum_bars(&self) -> usize {
        [self.outer_bands(), self.stoch_rsi(), self.sma()]
            .iter()
            .map(IndicatorType::lookback)
            .max()
            .unwrap_or(1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct IndicatorSnapshot {
    pub outer_upper: f64,
    pub outer_middle: f64,
    pub outer_lower: f64,
    pub inner_upper: f64,
    pub inner_lower: f64,
    pub stoch_k: f64,
    pub stoch_d: f64,
    pub sma: f64,
}

impl IndicatorSnapshot {
    /// Average of %K and %D, in [0, 100].
    pub fn stoch_rsi(&self) -> f64 {
        (self.stoch_k + self.stoch_d) / 2.0
    }
}

/// Compute every indicator over `series` and keep the values at its last bar.
///
/// Fails with [`EngineError::InsufficientData`] when any lookback exceeds the
/// history, and with [`EngineError::NonFiniteIndicator`] when the inputs
/// produce NaN or infinite values.
pub fn compute_snapshot(
    series: &PriceSeries,
    params: &IndicatorParams,
) -> Result<IndicatorSnapshot, EngineError> {
    for indicator in [params.outer_bands(), params.stoch_rsi(), params.sma()] {
        let minimum = indicator.lookback();
        if series.len() < minimum {
            return Err(EngineError::InsufficientData {
                instrument: series.pair.clone(),
                indicator: indicator.to_string(),
                bars: series.len(),
                minimum,
            });
        }
    }

    let bars = &series.bars;
    let outer = calculate_bollinger(bars, params.window, params.stddev_mult);
    let inner = calculate_bollinger(bars, params.window, params.inner_stddev_mult);
    let stoch = calculate_stoch_rsi(
        bars,
        params.rsi_period,
        params.stoch_period,
        params.k_period,
        params.d_period,
    );
    let sma = calculate_sma(bars, params.sma_window);

    let (outer_upper, outer_middle, outer_lower) = match latest(series, &outer)? {
        IndicatorValue::Bollinger {
            upper,
            middle,
            lower,
        } => (upper, middle, lower),
        _ => return Err(non_finite(series, &outer)),
    };
    let (inner_upper, inner_lower) = match latest(series, &inner)? {
        IndicatorValue::Bollinger { upper, lower, .. } => (upper, lower),
        _ => return Err(non_finite(series, &inner)),
    };
    let (stoch_k, stoch_d) = match latest(series, &stoch)? {
        IndicatorValue::Stochastic { k, d } => (k, d),
        _ => return Err(non_finite(series, &stoch)),
    };
    let sma = match latest(series, &sma)? {
        IndicatorValue::Simple(v) => v,
        _ => return Err(non_finite(series, &sma)),
    };

    Ok(IndicatorSnapshot {
        outer_upper,
        outer_middle,
        outer_lower,
        inner_upper,
        inner_lower,
        stoch_k,
        stoch_d,
        sma,
    })
}

fn latest(series: &PriceSeries, indicator: &IndicatorSeries) -> Result<IndicatorValue, EngineError> {
    let point = indicator
        .latest()
        .filter(|p| p.valid)
        .ok_or_else(|| EngineError::InsufficientData {
            instrument: series.pair.clone(),
            indicator: indicator.indicator_type.to_string(),
            bars: series.len(),
            minimum: indicator.indicator_type.lookback(),
        })?;
    if !point.value.is_finite() {
        return Err(non_finite(series, indicator));
    }
    Ok(point.value.clone())
}

fn non_finite(series: &PriceSeries, indicator: &IndicatorSeries) -> EngineError {
    EngineError::NonFiniteIndicator {
        instrument: series.pair.clone(),
        indicator: indicator.indicator_type.to_string(),
    }
}
