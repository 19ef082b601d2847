//! Orders as seen by the engine.
//!
//! The engine assigns every entry order a client id before handing it to the
//! broker. Brokers must echo that id back so the ledger can later recognise
//! the order inside a position.

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Buy,
    Sell,
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Side::Buy => write!(f, "buy"),
            Side::Sell => write!(f, "sell"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OrderId(pub String);

impl fmt::Display for OrderId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Sequential client ids of the form `<method_key>-<n>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OrderIdSource {
    next: u64,
}

impl OrderIdSource {
    pub fn next_id(&mut self, method_key: &str) -> OrderId {
        self.next += 1;
        OrderId(format!("{}-{}", method_key, self.next))
    }
}

/// An order the engine wants created, prior to broker acknowledgement.
#[derive(Debug, Clone, PartialEq)]
pub struct OrderRequest {
    pub id: OrderId,
    pub asset: String,
    pub quantity: f64,
    pub side: Side,
    pub quote: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Order {
    pub id: OrderId,
    pub asset: String,
    pub quantity: f64,
    pub side: Side,
    pub quote: String,
    /// Populated by the broker once the order executes.
    pub fill_price: Option<f64>,
}

impl Order {
    pub fn from_request(request: &OrderRequest) -> Self {
        Order {
            id: request.id.clone(),
            asset: request.asset.clone(),
            quantity: request.quantity,
            side: request.side,
            quote: request.quote.clone(),
            fill_price: None,
        }
    }

    pub fn filled_at(mut self, price: f64) -> Self {
        self.fill_price = Some(price);
        self
    }
}
