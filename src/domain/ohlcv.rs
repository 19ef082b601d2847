//! OHLC bar and price series representation.

use chrono::NaiveDateTime;

#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub timestamp: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}

/// Bar history for one instrument, oldest first.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceSeries {
    pub pair: String,
    pub bars: Vec<PriceBar>,
}

impl PriceSeries {
    pub fn new(pair: impl Into<String>, bars: Vec<PriceBar>) -> Self {
        Self {
            pair: pair.into(),
            bars,
        }
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}
