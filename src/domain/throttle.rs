//! Entry gate: sizing plus the per-method-key concurrency limit.
//!
//! A key admits new orders while its ledger list holds at most
//! `method_orders_limit` entries, so one order beyond the limit gets through
//! before the key blocks.

use crate::domain::instrument::Instrument;
use crate::domain::ledger::OrderLedger;
use crate::domain::order::{Order, OrderIdSource, OrderRequest};
use crate::domain::signal::SignalDecision;
use log::debug;

/// `round(cash * cash_at_risk / last_price, 2)`, or zero for an unusable price.
pub fn position_size(cash: f64, cash_at_risk: f64, last_price: f64) -> f64 {
    if !(last_price.is_finite() && last_price > 0.0) {
        return 0.0;
    }
    round_to_cents(cash * cash_at_risk / last_price)
}

pub fn round_to_cents(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[derive(Debug, Clone)]
pub struct EntryCandidate<'a> {
    pub instrument: &'a Instrument,
    pub side: SignalDecision,
    pub method: &'a str,
    pub cash: f64,
    pub last_price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Rejection {
    NoCash,
    NoSignal,
    ZeroQuantity,
    LimitReached { method_key: String, occupancy: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Admission {
    Approved {
        method_key: String,
        request: OrderRequest,
    },
    Rejected(Rejection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderThrottler {
    method_orders_limit: usize,
}

impl OrderThrottler {
    pub fn new(method_orders_limit: usize) -> Self {
        Self {
            method_orders_limit,
        }
    }

    pub fn has_capacity(&self, ledger: &OrderLedger, method_key: &str) -> bool {
        ledger
            .occupancy(method_key)
            .is_none_or(|n| n <= self.method_orders_limit)
    }

    /// Run every guard and, on approval, record the new order under its key.
    ///
    /// Rejections leave both the ledger and the id source untouched.
    pub fn admit(
        &self,
        ledger: &mut OrderLedger,
        ids: &mut OrderIdSource,
        candidate: &EntryCandidate<'_>,
    ) -> Admission {
        if !(candidate.cash > 0.0) {
            return Admission::Rejected(Rejection::NoCash);
        }
        let Some(side) = candidate.side else {
            return Admission::Rejected(Rejection::NoSignal);
        };
        let quantity = position_size(
            candidate.cash,
            candidate.instrument.cash_at_risk(),
            candidate.last_price,
        );
        if !(quantity > 0.0) {
            return Admission::Rejected(Rejection::ZeroQuantity);
        }

        let method_key = candidate.instrument.method_key(candidate.method);
        if !self.has_capacity(ledger, &method_key) {
            return Admission::Rejected(Rejection::LimitReached {
                occupancy: ledger.occupancy(&method_key).unwrap_or(0),
                method_key,
            });
        }
        if ledger.occupancy(&method_key) == Some(self.method_orders_limit) {
            debug!("{method_key} admitting order beyond limit {}", self.method_orders_limit);
        }

        let request = OrderRequest {
            id: ids.next_id(&method_key),
            asset: candidate.instrument.base().to_string(),
            quantity,
            side,
            quote: candidate.instrument.quote().to_string(),
        };
        ledger.append(&method_key, Order::from_request(&request));

        Admission::Approved {
            method_key,
            request,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::order::{OrderId, Side};
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn eur_usd() -> Instrument {
        Instrument::new("EUR", "USD", 0.2).unwrap()
    }

    fn candidate(instrument: &Instrument, side: Option<Side>) -> EntryCandidate<'_> {
        EntryCandidate {
            instrument,
            side,
            method: "combine",
            cash: 100.0,
            last_price: 1.10,
        }
    }

    #[test]
    fn sizing_rounds_to_two_places() {
        assert_relative_eq!(position_size(100.0, 0.2, 1.10), 18.18);
        assert_relative_eq!(position_size(100.0, 0.05, 0.61), 8.2);
        assert_relative_eq!(position_size(100.0, 0.2, 0.0), 0.0);
        assert_relative_eq!(position_size(100.0, 0.2, f64::NAN), 0.0);
    }

    #[test]
    fn approval_records_order_under_method_key() {
        let eur = eur_usd();
        let throttler = OrderThrottler::new(1);
        let mut ledger = OrderLedger::new();
        let mut ids = OrderIdSource::default();

        match throttler.admit(&mut ledger, &mut ids, &candidate(&eur, Some(Side::Buy))) {
            Admission::Approved {
                method_key,
                request,
            } => {
                assert_eq!(method_key, "combine_EUR_USD");
                assert_eq!(request.side, Side::Buy);
                assert_eq!(request.asset, "EUR");
                assert_eq!(request.quote, "USD");
                assert_relative_eq!(request.quantity, 18.18);
                assert_eq!(ledger.orders("combine_EUR_USD")[0].id, request.id);
            }
            other => panic!("expected approval, got {other:?}"),
        }
    }

    #[test]
    fn guards_reject_without_mutation() {
        let eur = eur_usd();
        let throttler = OrderThrottler::new(1);
        let mut ledger = OrderLedger::new();
        let mut ids = OrderIdSource::default();

        let mut no_cash = candidate(&eur, Some(Side::Buy));
        no_cash.cash = 0.0;
        assert_eq!(
            throttler.admit(&mut ledger, &mut ids, &no_cash),
            Admission::Rejected(Rejection::NoCash)
        );

        assert_eq!(
            throttler.admit(&mut ledger, &mut ids, &candidate(&eur, None)),
            Admission::Rejected(Rejection::NoSignal)
        );

        let mut dust = candidate(&eur, Some(Side::Buy));
        dust.cash = 0.01;
        assert_eq!(
            throttler.admit(&mut ledger, &mut ids, &dust),
            Admission::Rejected(Rejection::ZeroQuantity)
        );

        assert!(ledger.is_empty());
        assert_eq!(ledger.occupancy("combine_EUR_USD"), None);
        assert_eq!(ids, OrderIdSource::default());
    }

    #[test]
    fn limit_admits_one_overflow_order() {
        let eur = eur_usd();
        let throttler = OrderThrottler::new(1);
        let mut ledger = OrderLedger::new();
        let mut ids = OrderIdSource::default();
        let buy = candidate(&eur, Some(Side::Buy));

        assert!(matches!(throttler.admit(&mut ledger, &mut ids, &buy), Admission::Approved { .. }));
        assert!(matches!(throttler.admit(&mut ledger, &mut ids, &buy), Admission::Approved { .. }));
        assert_eq!(
            throttler.admit(&mut ledger, &mut ids, &buy),
            Admission::Rejected(Rejection::LimitReached {
                method_key: "combine_EUR_USD".into(),
                occupancy: 2,
            })
        );
        assert_eq!(ledger.occupancy("combine_EUR_USD"), Some(2));
    }

    #[test]
    fn reset_reopens_capacity() {
        let eur = eur_usd();
        let throttler = OrderThrottler::new(0);
        let mut ledger = OrderLedger::new();
        let mut ids = OrderIdSource::default();
        let buy = candidate(&eur, Some(Side::Buy));

        assert!(matches!(throttler.admit(&mut ledger, &mut ids, &buy), Admission::Approved { .. }));
        assert!(matches!(throttler.admit(&mut ledger, &mut ids, &buy), Admission::Rejected(_)));

        ledger.reset_containing(&OrderId("combine_EUR_USD-1".into()));
        assert!(matches!(throttler.admit(&mut ledger, &mut ids, &buy), Admission::Approved { .. }));
    }

    #[test]
    fn keys_are_independent_per_method_and_pair() {
        let eur = eur_usd();
        let nzd = Instrument::new("NZD", "USD", 0.2).unwrap();
        let throttler = OrderThrottler::new(0);
        let mut ledger = OrderLedger::new();
        let mut ids = OrderIdSource::default();

        let eur_buy = candidate(&eur, Some(Side::Buy));
        let nzd_buy = candidate(&nzd, Some(Side::Buy));
        let mut eur_band = candidate(&eur, Some(Side::Buy));
        eur_band.method = "double_bbands";

        for c in [&eur_buy, &nzd_buy, &eur_band] {
            assert!(matches!(throttler.admit(&mut ledger, &mut ids, c), Admission::Approved { .. }));
        }
    }

    proptest! {
        #[test]
        fn approvals_never_exceed_limit_plus_one(limit in 0usize..5, attempts in 0usize..20) {
            let eur = eur_usd();
            let throttler = OrderThrottler::new(limit);
            let mut ledger = OrderLedger::new();
            let mut ids = OrderIdSource::default();
            let buy = candidate(&eur, Some(Side::Sell));

            let approved = (0..attempts)
                .filter(|_| matches!(throttler.admit(&mut ledger, &mut ids, &buy), Admission::Approved { .. }))
                .count();

            prop_assert_eq!(approved, attempts.min(limit + 1));
            prop_assert_eq!(ledger.occupancy("combine_EUR_USD").unwrap_or(0), approved);
        }
    }
}
