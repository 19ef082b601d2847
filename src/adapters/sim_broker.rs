//! In-memory broker that replays recorded bars.
//!
//! All pairs share one timeline built from the union of their timestamps.
//! At each step a pair exposes the bars at or before the current time.
//! Orders fill immediately at the pair's latest close and net into one
//! position per pair. Cash is kept in a single quote currency.

use crate::domain::error::EngineError;
use crate::domain::instrument::Instrument;
use crate::domain::ohlcv::{PriceBar, PriceSeries};
use crate::domain::order::{Order, OrderId, OrderRequest, Side};
use crate::domain::position::Position;
use crate::ports::broker_port::{Broker, LogColor};
use chrono::NaiveDateTime;
use log::info;
use std::collections::BTreeMap;

const FLAT: f64 = 1e-9;

#[derive(Debug, Clone, Default)]
struct Holding {
    quantity: f64,
    orders: Vec<Order>,
}

#[derive(Debug, Default)]
pub struct SimBroker {
    bars: BTreeMap<(String, String), Vec<PriceBar>>,
    timeline: Vec<NaiveDateTime>,
    step: Option<usize>,
    cash: f64,
    holdings: BTreeMap<(String, String), Holding>,
    fills: Vec<Order>,
    messages: Vec<(String, Option<LogColor>)>,
}

fn pair_key(base: &str, quote: &str) -> (String, String) {
    (base.to_string(), quote.to_string())
}

impl SimBroker {
    pub fn new(cash: f64) -> Self {
        SimBroker {
            cash,
            ..Default::default()
        }
    }

    /// Register the full bar history for `instrument`. Bars must be sorted.
    pub fn add_series(&mut self, instrument: &Instrument, bars: Vec<PriceBar>) {
        self.timeline.extend(bars.iter().map(|b| b.timestamp));
        self.timeline.sort();
        self.timeline.dedup();
        self.bars
            .insert(pair_key(instrument.base(), instrument.quote()), bars);
    }

    pub fn now(&self) -> Option<NaiveDateTime> {
        self.step.map(|i| self.timeline[i])
    }

    /// Move to the next timestamp. Returns false once the timeline is exhausted.
    pub fn advance(&mut self) -> bool {
        let next = self.step.map_or(0, |i| i + 1);
        if next < self.timeline.len() {
            self.step = Some(next);
            true
        } else {
            false
        }
    }

    /// Jump to step `index` (clamped to the last step).
    pub fn seek(&mut self, index: usize) {
        if !self.timeline.is_empty() {
            self.step = Some(index.min(self.timeline.len() - 1));
        }
    }

    pub fn fills(&self) -> &[Order] {
        &self.fills
    }

    pub fn messages(&self) -> &[(String, Option<LogColor>)] {
        &self.messages
    }

    /// Cash plus open positions marked at their latest close.
    pub fn equity(&self) -> f64 {
        self.holdings
            .iter()
            .filter_map(|((base, quote), h)| {
                self.last_close(base, quote).map(|price| h.quantity * price)
            })
            .sum::<f64>()
            + self.cash
    }

    fn visible(&self, base: &str, quote: &str) -> Option<&[PriceBar]> {
        let bars = self.bars.get(&pair_key(base, quote))?;
        let now = self.now()?;
        let end = bars.partition_point(|b| b.timestamp <= now);
        Some(&bars[..end])
    }

    fn last_close(&self, base: &str, quote: &str) -> Option<f64> {
        self.visible(base, quote)?.last().map(|b| b.close)
    }

    fn selling_order(asset: &str, quote: &str, quantity: f64) -> Order {
        Order {
            id: OrderId(format!("exit-{asset}-{quote}")),
            asset: asset.to_string(),
            quantity: quantity.abs(),
            side: if quantity > 0.0 { Side::Sell } else { Side::Buy },
            quote: quote.to_string(),
            fill_price: None,
        }
    }
}

impl Broker for SimBroker {
    fn get_cash(&self) -> Result<f64, EngineError> {
        Ok(self.cash)
    }

    fn get_last_price(&self, base: &str, quote: &str) -> Result<f64, EngineError> {
        self.last_close(base, quote).ok_or_else(|| EngineError::Broker {
            reason: format!("no price for {base}/{quote}"),
        })
    }

    fn get_historical_prices(
        &self,
        instrument: &Instrument,
        length: usize,
        _timestep: &str,
    ) -> Result<PriceSeries, EngineError> {
        let visible = self
            .visible(instrument.base(), instrument.quote())
            .ok_or_else(|| EngineError::Broker {
                reason: format!("no data for {instrument}"),
            })?;
        if visible.is_empty() {
            return Err(EngineError::InsufficientData {
                instrument: instrument.pair(),
                indicator: "price history".to_string(),
                bars: 0,
                minimum: 1,
            });
        }
        let start = visible.len().saturating_sub(length);
        Ok(PriceSeries::new(instrument.pair(), visible[start..].to_vec()))
    }

    fn get_positions(&self) -> Result<Vec<Position>, EngineError> {
        Ok(self
            .holdings
            .iter()
            .map(|((asset, quote), h)| Position {
                asset: asset.clone(),
                quote: quote.clone(),
                quantity: h.quantity,
                orders: h.orders.clone(),
                selling_order: Self::selling_order(asset, quote, h.quantity),
            })
            .collect())
    }

    fn create_order(&mut self, request: &OrderRequest) -> Result<Order, EngineError> {
        if !(request.quantity > 0.0) {
            return Err(EngineError::Broker {
                reason: format!("order {} has non-positive quantity", request.id),
            });
        }
        Ok(Order::from_request(request))
    }

    fn submit_order(&mut self, order: &Order) -> Result<(), EngineError> {
        let price = self.get_last_price(&order.asset, &order.quote)?;
        let filled = order.clone().filled_at(price);
        let delta = match order.side {
            Side::Buy => order.quantity,
            Side::Sell => -order.quantity,
        };
        self.cash -= delta * price;

        let key = pair_key(&order.asset, &order.quote);
        let holding = self.holdings.entry(key.clone()).or_default();
        let before = holding.quantity;
        let after = before + delta;
        if after.abs() < FLAT {
            self.holdings.remove(&key);
        } else if before.abs() < FLAT || before.signum() != after.signum() {
            holding.quantity = after;
            holding.orders = vec![filled.clone()];
        } else {
            holding.quantity = after;
            if after.abs() > before.abs() {
                holding.orders.push(filled.clone());
            }
        }

        self.fills.push(filled);
        Ok(())
    }

    fn log_message(&mut self, text: &str, color: Option<LogColor>) {
        info!("{text}");
        self.messages.push((text.to_string(), color));
    }
}
