//! Bollinger Bands indicator.
//!
//! Bollinger Bands consist of:
//! - Middle: Simple Moving Average (SMA) over n periods
//! - Upper: Middle + (multiplier × StdDev)
//! - Lower: Middle - (multiplier × StdDev)
//!
//! Where StdDev is population standard deviation (divides by N, not N-1).
//!
//! The engine runs it twice per tick over the same window: once at the
//! configured multiplier (outer band) and once at 1.0 (inner band).
//! Warmup: first (period-1) bars are invalid. The multiplier is applied as
//! given; hundredths only appear in the series label.

use crate::domain::indicator::{
    mult_to_x100, IndicatorPoint, IndicatorSeries, IndicatorType, IndicatorValue,
};
use crate::domain::indicator::stddev::population_stddev;
use crate::domain::ohlcv::PriceBar;

pub fn calculate_bollinger(
    bars: &[PriceBar],
    period: usize,
    stddev_mult: f64,
) -> IndicatorSeries {
    let indicator_type = IndicatorType::Bollinger {
        period,
        stddev_mult_x100: mult_to_x100(stddev_mult),
    };
    if period == 0 {
        return IndicatorSeries {
            indicator_type,
            values: Vec::new(),
        };
    }

    let mut values = Vec::with_capacity(bars.len());
    let warmup = period - 1;

    for (i, bar) in bars.iter().enumerate() {
        let valid = i >= warmup;

        let (upper, middle, lower) = if valid {
            let window = &bars[i + 1 - period..=i];

            let middle_val: f64 = window.iter().map(|b| b.close).sum::<f64>() / period as f64;
            let stddev = population_stddev(window.iter().map(|b| b.close));
            (
                middle_val + stddev_mult * stddev,
                middle_val,
                middle_val - stddev_mult * stddev,
            )
        } else {
            (0.0, 0.0, 0.0)
        };

        values.push(IndicatorPoint {
            timestamp: bar.timestamp,
            valid,
            value: IndicatorValue::Bollinger {
                upper,
                middle,
                lower,
            },
        });
    }

    IndicatorSeries {
        indicator_type,
        values,
    }
}
