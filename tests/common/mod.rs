#![allow(dead_code)]

use bandtrader::domain::error::EngineError;
use bandtrader::domain::instrument::Instrument;
pub use bandtrader::domain::ohlcv::{PriceBar, PriceSeries};
use bandtrader::domain::order::{Order, OrderId, OrderRequest, Side};
use bandtrader::domain::position::Position;
use bandtrader::ports::broker_port::{Broker, LogColor};
use bandtrader::ports::data_port::DataPort;
use chrono::NaiveDate;
use std::collections::HashMap;

/// Scripted broker: fixed prices and positions, records everything it is sent.
pub struct MockBroker {
    pub cash: f64,
    pub closes: HashMap<String, Vec<f64>>,
    pub positions: Vec<Position>,
    pub created: Vec<OrderRequest>,
    pub submitted: Vec<Order>,
    pub messages: Vec<(String, Option<LogColor>)>,
    /// Fail every submission once this many orders have gone through.
    pub fail_submit_after: Option<usize>,
    pub rewrite_ids: bool,
}

impl MockBroker {
    pub fn new(cash: f64) -> Self {
        Self {
            cash,
            closes: HashMap::new(),
            positions: Vec::new(),
            created: Vec::new(),
            submitted: Vec::new(),
            messages: Vec::new(),
            fail_submit_after: None,
            rewrite_ids: false,
        }
    }

    pub fn with_closes(mut self, pair: &str, closes: Vec<f64>) -> Self {
        self.closes.insert(pair.to_string(), closes);
        self
    }

    pub fn with_position(mut self, position: Position) -> Self {
        self.positions.push(position);
        self
    }

    pub fn set_closes(&mut self, pair: &str, closes: Vec<f64>) {
        self.closes.insert(pair.to_string(), closes);
    }

    pub fn logged(&self, needle: &str) -> bool {
        self.messages.iter().any(|(text, _)| text.contains(needle))
    }
}

impl Broker for MockBroker {
    fn get_cash(&self) -> Result<f64, EngineError> {
        Ok(self.cash)
    }

    fn get_last_price(&self, base: &str, quote: &str) -> Result<f64, EngineError> {
        self.closes
            .get(&format!("{base}/{quote}"))
            .and_then(|c| c.last().copied())
            .ok_or_else(|| EngineError::Broker {
                reason: format!("no price for {base}/{quote}"),
            })
    }

    fn get_historical_prices(
        &self,
        instrument: &Instrument,
        length: usize,
        _timestep: &str,
    ) -> Result<PriceSeries, EngineError> {
        let closes = self
            .closes
            .get(&instrument.pair())
            .ok_or_else(|| EngineError::Broker {
                reason: format!("no data for {instrument}"),
            })?;
        let start = closes.len().saturating_sub(length);
        Ok(PriceSeries::new(instrument.pair(), make_bars(&closes[start..])))
    }

    fn get_positions(&self) -> Result<Vec<Position>, EngineError> {
        Ok(self.positions.clone())
    }

    fn create_order(&mut self, request: &OrderRequest) -> Result<Order, EngineError> {
        self.created.push(request.clone());
        let mut order = Order::from_request(request);
        if self.rewrite_ids {
            order.id = OrderId(format!("broker-{}", self.created.len()));
        }
        Ok(order)
    }

    fn submit_order(&mut self, order: &Order) -> Result<(), EngineError> {
        if self
            .fail_submit_after
            .is_some_and(|n| self.submitted.len() >= n)
        {
            return Err(EngineError::Broker {
                reason: "connection reset".into(),
            });
        }
        self.submitted.push(order.clone());
        Ok(())
    }

    fn log_message(&mut self, text: &str, color: Option<LogColor>) {
        self.messages.push((text.to_string(), color));
    }
}

pub struct MockDataPort {
    pub data: HashMap<String, Vec<PriceBar>>,
}

impl MockDataPort {
    pub fn new() -> Self {
        Self {
            data: HashMap::new(),
        }
    }

    pub fn with_closes(mut self, pair: &str, closes: &[f64]) -> Self {
        self.data.insert(pair.to_string(), make_bars(closes));
        self
    }
}

impl DataPort for MockDataPort {
    fn fetch_bars(&self, instrument: &Instrument) -> Result<Vec<PriceBar>, EngineError> {
        self.data
            .get(&instrument.pair())
            .cloned()
            .ok_or_else(|| EngineError::DataSource {
                reason: format!("no file for {instrument}"),
            })
    }
}

/// Hourly bars from 2024-01-01 with open = high = low = close.
pub fn make_bars(closes: &[f64]) -> Vec<PriceBar> {
    let start = NaiveDate::from_ymd_opt(2024, 1, 1)
        .unwrap()
        .and_hms_opt(0, 0, 0)
        .unwrap();
    closes
        .iter()
        .enumerate()
        .map(|(i, &close)| PriceBar {
            timestamp: start + chrono::Duration::hours(i as i64),
            open: close,
            high: close,
            low: close,
            close,
        })
        .collect()
}

/// Choppy range followed by a slide that ends below the outer band with a
/// falling RSI: both rules say BUY and the last close is lower than the prior.
pub fn decline_closes() -> Vec<f64> {
    let mut closes: Vec<f64> = (0..72)
        .map(|i| if i % 2 == 0 { 1.200 } else { 1.202 })
        .collect();
    closes.extend([1.19, 1.18, 1.17, 1.16, 1.15, 1.14, 1.13, 1.10]);
    closes
}

/// Mirror image of [`decline_closes`]: both rules say SELL, last close 1.302.
pub fn rally_closes() -> Vec<f64> {
    decline_closes().iter().map(|c| 2.402 - c).collect()
}

/// A range with no band breakouts.
pub fn flat_closes(n: usize) -> Vec<f64> {
    (0..n)
        .map(|i| if i % 2 == 0 { 1.200 } else { 1.202 })
        .collect()
}

pub fn eur_usd() -> Instrument {
    Instrument::new("EUR", "USD", 0.2).unwrap()
}

pub fn filled_order(id: &str, side: Side, quantity: f64, fill: f64) -> Order {
    Order {
        id: OrderId(id.to_string()),
        asset: "EUR".into(),
        quantity,
        side,
        quote: "USD".into(),
        fill_price: Some(fill),
    }
}

/// Long EUR/USD built from `orders`, closable with a SELL.
pub fn long_position(orders: Vec<Order>) -> Position {
    let quantity = orders.iter().map(|o| o.quantity).sum();
    Position {
        asset: "EUR".into(),
        quote: "USD".into(),
        quantity,
        orders,
        selling_order: Order {
            id: OrderId("exit-EUR-USD".into()),
            asset: "EUR".into(),
            quantity,
            side: Side::Sell,
            quote: "USD".into(),
            fill_price: None,
        },
    }
}
