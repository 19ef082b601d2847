//! Bar history source used by the replay harness.

use crate::domain::error::EngineError;
use crate::domain::instrument::Instrument;
use crate::domain::ohlcv::PriceBar;

pub trait DataPort {
    /// Every bar available for `instrument`, oldest first.
    fn fetch_bars(&self, instrument: &Instrument) -> Result<Vec<PriceBar>, EngineError>;
}
