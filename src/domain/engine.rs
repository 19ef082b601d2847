//! Per-tick orchestration.
//!
//! [`evaluate_tick`] is the pure decision step: it takes the engine state and a
//! market snapshot and returns the next state plus the orders to send.
//! [`TradingEngine`] wraps it with the broker round trips a live host needs.

use crate::domain::combiner::{entry_candidates, SignalPolicy, TrendFilter};
use crate::domain::error::EngineError;
use crate::domain::exit::{ExitEvaluator, ExitInputs, ExitRule};
use crate::domain::indicator::snapshot::{compute_snapshot, IndicatorParams};
use crate::domain::instrument::Instrument;
use crate::domain::ledger::OrderLedger;
use crate::domain::ohlcv::PriceSeries;
use crate::domain::order::{Order, OrderIdSource, OrderRequest};
use crate::domain::position::Position;
use crate::domain::signal::{generate, CounterTrendThresholds};
use crate::domain::throttle::{Admission, EntryCandidate, OrderThrottler};
use crate::ports::broker_port::{Broker, LogColor};
use log::{debug, error, info, warn};

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    /// Bars requested from the broker each tick.
    pub history_length: usize,
    pub timestep: String,
    /// Host sleep between ticks; the engine only reports it.
    pub sleeptime: String,
    pub method_orders_limit: usize,
    pub signal_policy: SignalPolicy,
    pub trend_filter: Option<TrendFilter>,
    pub exit_rule: ExitRule,
    pub indicators: IndicatorParams,
    pub thresholds: CounterTrendThresholds,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            history_length: 100,
            timestep: "60 minutes".to_string(),
            sleeptime: "1H".to_string(),
            method_orders_limit: 1,
            signal_policy: SignalPolicy::Combined,
            trend_filter: Some(TrendFilter::default()),
            exit_rule: ExitRule::SmaCross,
            indicators: IndicatorParams::default(),
            thresholds: CounterTrendThresholds::default(),
        }
    }
}

/// Everything that survives from one tick to the next.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineState {
    pub ledger: OrderLedger,
    pub order_ids: OrderIdSource,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InstrumentMarket {
    pub instrument: Instrument,
    pub history: PriceSeries,
    pub last_price: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PositionQuote {
    pub position: Position,
    pub last_price: f64,
}

/// Broker state captured at the start of a tick.
///
/// `cash` is read once and sizes every entry in the tick, including each
/// method's order under the independent policy.
#[derive(Debug, Clone, PartialEq)]
pub struct MarketSnapshot {
    pub cash: f64,
    pub instruments: Vec<InstrumentMarket>,
    pub positions: Vec<PositionQuote>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum OrderIntent {
    Enter {
        method_key: String,
        request: OrderRequest,
    },
    Close {
        order: Order,
        reset_keys: Vec<String>,
    },
}

#[derive(Debug)]
pub struct SkippedInstrument {
    pub pair: String,
    pub error: EngineError,
}

#[derive(Debug)]
pub struct TickOutcome {
    pub state: EngineState,
    pub intents: Vec<OrderIntent>,
    pub skipped: Vec<SkippedInstrument>,
}

/// One decision pass over every instrument in snapshot order.
///
/// For each instrument, exits run before entries so a close frees ledger
/// capacity for the same tick. Instruments whose history cannot support the
/// indicators are skipped; any other error aborts the tick.
pub fn evaluate_tick(
    mut state: EngineState,
    snapshot: &MarketSnapshot,
    config: &EngineConfig,
) -> Result<TickOutcome, EngineError> {
    let throttler = OrderThrottler::new(config.method_orders_limit);
    let exits = ExitEvaluator::new(config.exit_rule);
    let mut intents = Vec::new();
    let mut skipped = Vec::new();

    for market in &snapshot.instruments {
        let instrument = &market.instrument;
        let indicators = match compute_snapshot(&market.history, &config.indicators) {
            Ok(indicators) => indicators,
            Err(e) if e.is_data_insufficiency() => {
                warn!("skipping {instrument}: {e}");
                skipped.push(SkippedInstrument {
                    pair: instrument.pair(),
                    error: e,
                });
                continue;
            }
            Err(e) => return Err(e),
        };
        let closes = market.history.closes();

        let inputs = ExitInputs {
            sma: indicators.sma,
            closes: &closes,
        };
        for quote in snapshot
            .positions
            .iter()
            .filter(|q| instrument.holds(&q.position.asset, &q.position.quote))
        {
            if let Some(decision) =
                exits.evaluate(&mut state.ledger, &quote.position, quote.last_price, &inputs)
            {
                intents.push(OrderIntent::Close {
                    order: decision.selling_order,
                    reset_keys: decision.reset_keys,
                });
            }
        }

        let signals = generate(market.last_price, &indicators, &config.thresholds);
        debug!(
            "{instrument} price={} band={:?} counter={:?} stoch_rsi={:.2}",
            market.last_price,
            signals.band_reversion,
            signals.counter_trend,
            indicators.stoch_rsi()
        );

        let candidates = entry_candidates(
            &signals,
            &closes,
            config.signal_policy,
            config.trend_filter.as_ref(),
        );
        for (method, side) in candidates {
            let candidate = EntryCandidate {
                instrument,
                side: Some(side),
                method,
                cash: snapshot.cash,
                last_price: market.last_price,
            };
            match throttler.admit(&mut state.ledger, &mut state.order_ids, &candidate) {
                Admission::Approved {
                    method_key,
                    request,
                } => intents.push(OrderIntent::Enter {
                    method_key,
                    request,
                }),
                Admission::Rejected(reason) => {
                    debug!("{instrument} {method} {side} rejected: {reason:?}");
                }
            }
        }
    }

    Ok(TickOutcome {
        state,
        intents,
        skipped,
    })
}

/// What one call to [`TradingEngine::on_trading_iteration`] sent to the broker.
#[derive(Debug, Default)]
pub struct TickReport {
    pub entries: Vec<Order>,
    pub closes: Vec<Order>,
    pub skipped: Vec<SkippedInstrument>,
}

#[derive(Debug)]
pub struct TradingEngine {
    instruments: Vec<Instrument>,
    config: EngineConfig,
    state: EngineState,
}

impl TradingEngine {
    pub fn initialize(
        instruments: Vec<Instrument>,
        config: EngineConfig,
    ) -> Result<Self, EngineError> {
        if instruments.is_empty() {
            return Err(EngineError::NoInstruments);
        }
        info!(
            "trading {} instrument(s) every {}, limit {} per method key",
            instruments.len(),
            config.sleeptime,
            config.method_orders_limit
        );
        Ok(TradingEngine {
            instruments,
            config,
            state: EngineState::default(),
        })
    }

    pub fn instruments(&self) -> &[Instrument] {
        &self.instruments
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn ledger(&self) -> &OrderLedger {
        &self.state.ledger
    }

    /// Run one tick against `broker`.
    ///
    /// Each intent reaches the ledger as soon as its submission succeeds, so a
    /// failure part way through keeps the orders and resets already sent. On
    /// error the caller should hand it to [`TradingEngine::on_bot_crash`].
    pub fn on_trading_iteration<B: Broker + ?Sized>(
        &mut self,
        broker: &mut B,
    ) -> Result<TickReport, EngineError> {
        let (snapshot, mut skipped) = self.capture_snapshot(broker)?;
        let outcome = evaluate_tick(self.state.clone(), &snapshot, &self.config)?;
        skipped.extend(outcome.skipped);
        // ids handed out this tick are spent even if their submission fails
        self.state.order_ids = outcome.state.order_ids;

        let mut report = TickReport::default();
        for intent in outcome.intents {
            match intent {
                OrderIntent::Close { order, reset_keys } => {
                    broker.submit_order(&order)?;
                    for key in &reset_keys {
                        self.state.ledger.reset(key);
                    }
                    broker.log_message(
                        &format!(
                            "closing {} {} {}/{}, reset {}",
                            order.side,
                            order.quantity,
                            order.asset,
                            order.quote,
                            reset_keys.join(", ")
                        ),
                        Some(LogColor::Yellow),
                    );
                    report.closes.push(order);
                }
                OrderIntent::Enter {
                    method_key,
                    request,
                } => {
                    let order = broker.create_order(&request)?;
                    if order.id != request.id {
                        return Err(EngineError::Broker {
                            reason: format!(
                                "created order {} does not carry client id {}",
                                order.id, request.id
                            ),
                        });
                    }
                    broker.submit_order(&order)?;
                    self.state.ledger.append(&method_key, order.clone());
                    info!(
                        "{method_key}: submitted {} {} {}/{}",
                        order.side, order.quantity, order.asset, order.quote
                    );
                    broker.log_message(
                        &format!(
                            "{method_key}: {} {} {}/{}",
                            order.side, order.quantity, order.asset, order.quote
                        ),
                        Some(LogColor::Green),
                    );
                    report.entries.push(order);
                }
            }
        }

        for skip in &skipped {
            broker.log_message(&format!("skipped {}: {}", skip.pair, skip.error), None);
        }

        info!("order ledger {}", self.state.ledger);
        broker.log_message(&format!("order ledger {}", self.state.ledger), None);

        report.skipped = skipped;
        Ok(report)
    }

    /// Surface a fatal tick error through the broker's log sink.
    pub fn on_bot_crash<B: Broker + ?Sized>(&self, broker: &mut B, err: &EngineError) {
        error!("trading iteration failed: {err}");
        broker.log_message(&format!("bot crashed: {err}"), Some(LogColor::Red));
    }

    fn capture_snapshot<B: Broker + ?Sized>(
        &self,
        broker: &B,
    ) -> Result<(MarketSnapshot, Vec<SkippedInstrument>), EngineError> {
        let cash = broker.get_cash()?;
        let mut markets = Vec::with_capacity(self.instruments.len());
        let mut skipped = Vec::new();

        for instrument in &self.instruments {
            let history = match broker.get_historical_prices(
                instrument,
                self.config.history_length,
                &self.config.timestep,
            ) {
                Ok(history) => history,
                Err(e) if e.is_data_insufficiency() => {
                    warn!("skipping {instrument}: {e}");
                    skipped.push(SkippedInstrument {
                        pair: instrument.pair(),
                        error: e,
                    });
                    continue;
                }
                Err(e) => return Err(e),
            };
            let last_price = broker.get_last_price(instrument.base(), instrument.quote())?;
            markets.push(InstrumentMarket {
                instrument: instrument.clone(),
                history,
                last_price,
            });
        }

        let mut positions = Vec::new();
        for position in broker.get_positions()? {
            if !markets
                .iter()
                .any(|m| m.instrument.holds(&position.asset, &position.quote))
            {
                continue;
            }
            let last_price = broker.get_last_price(&position.asset, &position.quote)?;
            positions.push(PositionQuote {
                position,
                last_price,
            });
        }

        Ok((
            MarketSnapshot {
                cash,
                instruments: markets,
                positions,
            },
            skipped,
        ))
    }
}
