//! Outstanding orders per method key.
//!
//! Orders are added on admission and removed only when a position closes;
//! nothing expires on its own. A reset keeps the key with an empty list.

use crate::domain::order::{Order, OrderId};
use std::collections::BTreeMap;
use std::fmt;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderLedger {
    entries: BTreeMap<String, Vec<Order>>,
}

impl OrderLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Orders recorded under `method_key`; empty when the key is unknown.
    pub fn orders(&self, method_key: &str) -> &[Order] {
        self.entries.get(method_key).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Number of recorded orders, or `None` when the key has never been used.
    pub fn occupancy(&self, method_key: &str) -> Option<usize> {
        self.entries.get(method_key).map(Vec::len)
    }

    pub fn append(&mut self, method_key: &str, order: Order) {
        self.entries
            .entry(method_key.to_string())
            .or_default()
            .push(order);
    }

    /// Empty every list holding `order_id`, returning the affected keys.
    pub fn reset_containing(&mut self, order_id: &OrderId) -> Vec<String> {
        let mut reset = Vec::new();
        for (key, orders) in self.entries.iter_mut() {
            if orders.iter().any(|o| &o.id == order_id) {
                orders.clear();
                reset.push(key.clone());
            }
        }
        reset
    }

    /// Empty the list under `method_key`, keeping the key.
    pub fn reset(&mut self, method_key: &str) {
        if let Some(orders) = self.entries.get_mut(method_key) {
            orders.clear();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.entries.values().all(Vec::is_empty)
    }
}

impl fmt::Display for OrderLedger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, orders)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let ids: Vec<&str> = orders.iter().map(|o| o.id.0.as_str()).collect();
            write!(f, "{}: [{}]", key, ids.join(", "))?;
        }
        write!(f, "}}")
    }
}
