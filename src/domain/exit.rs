//! Position exit evaluation.
//!
//! Two rules are available. [`ExitRule::SmaCross`] reads the trend from the
//! SMA against the current price and needs every fill to be in profit.
//! [`ExitRule::Monotonic`] needs three strictly ordered closes and a single
//! profitable fill, so it exits earlier and more often.

use crate::domain::ledger::OrderLedger;
use crate::domain::order::{Order, Side};
use crate::domain::position::Position;
use log::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitRule {
    SmaCross,
    Monotonic,
}

impl ExitRule {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "sma_cross" | "sma" => Some(ExitRule::SmaCross),
            "monotonic" => Some(ExitRule::Monotonic),
            _ => None,
        }
    }
}

/// Trend inputs for one instrument at the current bar.
#[derive(Debug, Clone, Copy)]
pub struct ExitInputs<'a> {
    pub sma: f64,
    pub closes: &'a [f64],
}

#[derive(Debug, Clone, PartialEq)]
pub struct ExitDecision {
    pub selling_order: Order,
    /// Ledger keys emptied by this close.
    pub reset_keys: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExitEvaluator {
    rule: ExitRule,
}

impl ExitEvaluator {
    pub fn new(rule: ExitRule) -> Self {
        Self { rule }
    }

    pub fn should_close(&self, position: &Position, price: f64, inputs: &ExitInputs<'_>) -> bool {
        if !position.is_closable() {
            return false;
        }
        let closing = position.selling_order.side;
        match self.rule {
            ExitRule::SmaCross => match closing {
                Side::Sell => inputs.sma < price && position.all_fills(|fill| fill < price),
                Side::Buy => inputs.sma > price && position.all_fills(|fill| fill > price),
            },
            ExitRule::Monotonic => {
                let Some(&[oldest, middle, latest]) = inputs.closes.last_chunk::<3>() else {
                    return false;
                };
                match closing {
                    Side::Sell => {
                        latest < middle && middle < oldest && position.any_fill(|fill| price > fill)
                    }
                    Side::Buy => {
                        latest > middle && middle > oldest && position.any_fill(|fill| price < fill)
                    }
                }
            }
        }
    }

    /// Decide on one position and, when closing, free the ledger keys holding its latest order.
    pub fn evaluate(
        &self,
        ledger: &mut OrderLedger,
        position: &Position,
        price: f64,
        inputs: &ExitInputs<'_>,
    ) -> Option<ExitDecision> {
        if !self.should_close(position, price, inputs) {
            return None;
        }

        let reset_keys = position
            .latest_order()
            .map(|latest| ledger.reset_containing(&latest.id))
            .unwrap_or_default();
        info!(
            "closing {}/{} at {price} via {} {}, reset {:?}",
            position.asset,
            position.quote,
            position.selling_order.side,
            position.selling_order.quantity,
            reset_keys
        );

        Some(ExitDecision {
            selling_order: position.selling_order.clone(),
            reset_keys,
        })
    }
}
