//! Broker port: market data, holdings and order routing.

use crate::domain::error::EngineError;
use crate::domain::instrument::Instrument;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::order::{Order, OrderRequest};
use crate::domain::position::Position;

/// Optional highlight for host-facing log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogColor {
    Green,
    Red,
    Yellow,
    Blue,
}

pub trait Broker {
    fn get_cash(&self) -> Result<f64, EngineError>;

    fn get_last_price(&self, base: &str, quote: &str) -> Result<f64, EngineError>;

    /// The trailing `length` bars for `instrument`, oldest first.
    fn get_historical_prices(
        &self,
        instrument: &Instrument,
        length: usize,
        timestep: &str,
    ) -> Result<PriceSeries, EngineError>;

    fn get_positions(&self) -> Result<Vec<Position>, EngineError>;

    /// Build a broker order from `request`. The returned order must carry `request.id`.
    fn create_order(&mut self, request: &OrderRequest) -> Result<Order, EngineError>;

    fn submit_order(&mut self, order: &Order) -> Result<(), EngineError>;

    fn log_message(&mut self, text: &str, color: Option<LogColor>);
}
