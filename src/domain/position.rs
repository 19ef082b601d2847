//! Broker-owned holdings, read by the exit evaluator.

use crate::domain::order::Order;

#[derive(Debug, Clone, PartialEq)]
pub struct Position {
    pub asset: String,
    pub quote: String,
    /// Net holding; negative for a short.
    pub quantity: f64,
    /// Constituent orders, oldest first.
    pub orders: Vec<Order>,
    /// The order that would flatten this position.
    pub selling_order: Order,
}

impl Position {
    pub fn latest_order(&self) -> Option<&Order> {
        self.orders.last()
    }

    /// A position can only be closed when it has orders and something to sell.
    pub fn is_closable(&self) -> bool {
        !self.orders.is_empty() && self.selling_order.quantity > 0.0
    }

    /// True when every constituent fill satisfies `beats`. Unfilled orders never do.
    pub fn all_fills(&self, beats: impl Fn(f64) -> bool) -> bool {
        !self.orders.is_empty()
            && self
                .orders
                .iter()
                .all(|o| o.fill_price.is_some_and(|p| beats(p)))
    }

    /// True when at least one constituent fill satisfies `beats`.
    pub fn any_fill(&self, beats: impl Fn(f64) -> bool) -> bool {
        self.orders
            .iter()
            .any(|o| o.fill_price.is_some_and(|p| beats(p)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderId, Side};

    fn order(id: &str, fill: Option<f64>) -> Order {
        Order {
            id: OrderId(id.into()),
            asset: "EUR".into(),
            quantity: 10.0,
            side: Side::Buy,
            quote: "USD".into(),
            fill_price: fill,
        }
    }

    fn position(orders: Vec<Order>, selling_quantity: f64) -> Position {
        Position {
            asset: "EUR".into(),
            quote: "USD".into(),
            quantity: selling_quantity,
            orders,
            selling_order: Order {
                id: OrderId("exit".into()),
                asset: "EUR".into(),
                quantity: selling_quantity,
                side: Side::Sell,
                quote: "USD".into(),
                fill_price: None,
            },
        }
    }

    #[test]
    fn closable_requires_orders_and_quantity() {
        assert!(!position(vec![], 10.0).is_closable());
        assert!(!position(vec![order("a", Some(1.0))], 0.0).is_closable());
        assert!(position(vec![order("a", Some(1.0))], 10.0).is_closable());
    }

    #[test]
    fn unfilled_orders_never_beat_price() {
        let pos = position(vec![order("a", Some(1.0)), order("b", None)], 20.0);
        assert!(!pos.all_fills(|p| p < 2.0));
        assert!(pos.any_fill(|p| p < 2.0));
    }

    #[test]
    fn latest_order_is_last() {
        let pos = position(vec![order("a", Some(1.0)), order("b", Some(1.1))], 20.0);
        assert_eq!(pos.latest_order().unwrap().id.0, "b");
    }
}
