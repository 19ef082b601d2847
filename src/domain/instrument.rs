//! Tradable currency pairs and their per-entry cash weight.
//!
//! Pairs are configured as a comma-separated list of `BASE/QUOTE` tokens, each
//! optionally suffixed with `:weight` to override the default `cash_at_risk`.

use crate::domain::error::EngineError;
use std::collections::HashSet;
use std::fmt;

#[derive(Debug, Clone, PartialEq)]
pub struct Instrument {
    base: String,
    quote: String,
    cash_at_risk: f64,
}

impl Instrument {
    pub fn new(base: &str, quote: &str, cash_at_risk: f64) -> Result<Self, EngineError> {
        let base = base.trim().to_uppercase();
        let quote = quote.trim().to_uppercase();
        let pair = format!("{base}/{quote}");

        for asset in [&base, &quote] {
            if asset.is_empty() || !asset.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(EngineError::InvalidInstrument {
                    pair,
                    reason: "asset symbols must be non-empty and alphanumeric".into(),
                });
            }
        }
        if base == quote {
            return Err(EngineError::InvalidInstrument {
                pair,
                reason: "base and quote must differ".into(),
            });
        }
        if !(cash_at_risk > 0.0 && cash_at_risk <= 1.0) {
            return Err(EngineError::InvalidInstrument {
                pair,
                reason: format!("cash_at_risk {cash_at_risk} must be in (0, 1]"),
            });
        }

        Ok(Self {
            base,
            quote,
            cash_at_risk,
        })
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    pub fn quote(&self) -> &str {
        &self.quote
    }

    pub fn cash_at_risk(&self) -> f64 {
        self.cash_at_risk
    }

    pub fn pair(&self) -> String {
        self.to_string()
    }

    /// Ledger key for orders placed by `label` on this pair, e.g. `combine_EUR_USD`.
    pub fn method_key(&self, label: &str) -> String {
        format!("{}_{}_{}", label, self.base, self.quote)
    }

    /// True when a holding of `asset` priced in `quote` belongs to this pair.
    pub fn holds(&self, asset: &str, quote: &str) -> bool {
        self.base == asset && self.quote == quote
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.base, self.quote)
    }
}

/// Parse `EUR/USD:0.2, NZD/USD` into instruments, in configured order.
pub fn parse_instruments(
    input: &str,
    default_cash_at_risk: f64,
) -> Result<Vec<Instrument>, EngineError> {
    if input.trim().is_empty() {
        return Err(EngineError::NoInstruments);
    }

    let mut instruments = Vec::new();
    let mut seen = HashSet::new();

    for token in input.split(',') {
        let trimmed = token.trim();
        if trimmed.is_empty() {
            return Err(EngineError::InvalidInstrument {
                pair: String::new(),
                reason: "empty token in pair list".into(),
            });
        }

        let (pair, weight) = match trimmed.split_once(':') {
            Some((pair, weight)) => {
                let weight = weight.trim().parse::<f64>().map_err(|_| {
                    EngineError::InvalidInstrument {
                        pair: pair.trim().to_string(),
                        reason: format!("invalid cash_at_risk '{}'", weight.trim()),
                    }
                })?;
                (pair.trim(), weight)
            }
            None => (trimmed, default_cash_at_risk),
        };

        let (base, quote) =
            pair.split_once('/')
                .ok_or_else(|| EngineError::InvalidInstrument {
                    pair: pair.to_string(),
                    reason: "expected BASE/QUOTE".into(),
                })?;

        let instrument = Instrument::new(base, quote, weight)?;
        if !seen.insert(instrument.pair()) {
            return Err(EngineError::InvalidInstrument {
                pair: instrument.pair(),
                reason: "duplicate pair".into(),
            });
        }
        instruments.push(instrument);
    }

    Ok(instruments)
}
