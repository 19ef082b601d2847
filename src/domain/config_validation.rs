//! Configuration validation.
//!
//! Checks every field before the engine starts; builders in
//! [`crate::domain::config`] call these first.

use crate::domain::combiner::SignalPolicy;
use crate::domain::config::{indicator_params, ENGINE, INDICATORS, INSTRUMENTS, REPLAY};
use crate::domain::error::EngineError;
use crate::domain::exit::ExitRule;
use crate::domain::instrument::parse_instruments;
use crate::ports::config_port::ConfigPort;

pub fn validate_engine_config(config: &dyn ConfigPort) -> Result<(), EngineError> {
    validate_indicator_periods(config)?;
    validate_band_widths(config)?;
    validate_thresholds(config)?;
    validate_history_length(config)?;
    validate_method_orders_limit(config)?;
    validate_trend_lookback(config)?;
    validate_choice(config, "signal_policy", |v| SignalPolicy::parse(v).is_some())?;
    validate_choice(config, "exit_rule", |v| ExitRule::parse(v).is_some())?;
    validate_non_empty(config, ENGINE, "timestep")?;
    validate_non_empty(config, ENGINE, "sleeptime")?;
    Ok(())
}

pub fn validate_instrument_config(config: &dyn ConfigPort) -> Result<(), EngineError> {
    let default_weight = config.get_double(INSTRUMENTS, "cash_at_risk", 0.05);
    if !(default_weight > 0.0 && default_weight <= 1.0) {
        return Err(invalid(
            INSTRUMENTS,
            "cash_at_risk",
            "cash_at_risk must be in (0, 1]",
        ));
    }
    let pairs = config
        .get_string(INSTRUMENTS, "pairs")
        .ok_or(EngineError::NoInstruments)?;
    parse_instruments(&pairs, default_weight)?;
    Ok(())
}

pub fn validate_replay_config(config: &dyn ConfigPort) -> Result<(), EngineError> {
    match config.get_string(REPLAY, "data_dir") {
        Some(s) if !s.trim().is_empty() => {}
        _ => {
            return Err(EngineError::ConfigMissing {
                section: REPLAY.to_string(),
                key: "data_dir".to_string(),
            })
        }
    }
    let cash = config.get_double(REPLAY, "cash", 100.0);
    if !(cash > 0.0) {
        return Err(invalid(REPLAY, "cash", "cash must be positive"));
    }
    Ok(())
}

fn invalid(section: &str, key: &str, reason: &str) -> EngineError {
    EngineError::ConfigInvalid {
        section: section.to_string(),
        key: key.to_string(),
        reason: reason.to_string(),
    }
}

fn validate_indicator_periods(config: &dyn ConfigPort) -> Result<(), EngineError> {
    for key in [
        "window",
        "rsi_period",
        "stoch_period",
        "k_period",
        "d_period",
        "sma_window",
    ] {
        if config.get_int(INDICATORS, key, 1) < 1 {
            return Err(invalid(INDICATORS, key, &format!("{key} must be at least 1")));
        }
    }
    if config.get_int(INDICATORS, "window", 2) < 2 {
        return Err(invalid(INDICATORS, "window", "window must be at least 2"));
    }
    Ok(())
}

fn validate_band_widths(config: &dyn ConfigPort) -> Result<(), EngineError> {
    let params = indicator_params(config);
    if !(params.stddev_mult > 0.0) {
        return Err(invalid(
            INDICATORS,
            "stddev_mult",
            "stddev_mult must be positive",
        ));
    }
    if !(params.inner_stddev_mult > 0.0 && params.inner_stddev_mult < params.stddev_mult) {
        return Err(invalid(
            INDICATORS,
            "inner_stddev_mult",
            "inner_stddev_mult must be positive and below stddev_mult",
        ));
    }
    Ok(())
}

fn validate_thresholds(config: &dyn ConfigPort) -> Result<(), EngineError> {
    let overbought = config.get_double(INDICATORS, "overbought", 70.0);
    let oversold = config.get_double(INDICATORS, "oversold", 30.0);
    for (key, value) in [("overbought", overbought), ("oversold", oversold)] {
        if !(0.0..=100.0).contains(&value) {
            return Err(invalid(INDICATORS, key, &format!("{key} must be between 0 and 100")));
        }
    }
    if oversold >= overbought {
        return Err(invalid(
            INDICATORS,
            "oversold",
            "oversold must be below overbought",
        ));
    }
    Ok(())
}

fn validate_history_length(config: &dyn ConfigPort) -> Result<(), EngineError> {
    let minimum = indicator_params(config).minimum_bars();
    let value = config.get_int(ENGINE, "history_length", 100);
    if value < minimum as i64 {
        return Err(invalid(
            ENGINE,
            "history_length",
            &format!("history_length must cover the longest indicator lookback ({minimum} bars)"),
        ));
    }
    Ok(())
}

fn validate_method_orders_limit(config: &dyn ConfigPort) -> Result<(), EngineError> {
    if config.get_int(ENGINE, "method_orders_limit", 1) < 0 {
        return Err(invalid(
            ENGINE,
            "method_orders_limit",
            "method_orders_limit must be non-negative",
        ));
    }
    Ok(())
}

fn validate_trend_lookback(config: &dyn ConfigPort) -> Result<(), EngineError> {
    let value = config.get_int(ENGINE, "trend_lookback", 1);
    if !(1..=2).contains(&value) {
        return Err(invalid(
            ENGINE,
            "trend_lookback",
            "trend_lookback must be 1 or 2",
        ));
    }
    Ok(())
}

fn validate_choice(
    config: &dyn ConfigPort,
    key: &str,
    accepts: impl Fn(&str) -> bool,
) -> Result<(), EngineError> {
    match config.get_string(ENGINE, key) {
        Some(value) if !accepts(&value) => Err(invalid(
            ENGINE,
            key,
            &format!("unknown {key} '{}'", value.trim()),
        )),
        _ => Ok(()),
    }
}

fn validate_non_empty(config: &dyn ConfigPort, section: &str, key: &str) -> Result<(), EngineError> {
    match config.get_string(section, key) {
        Some(value) if value.trim().is_empty() => {
            Err(invalid(section, key, &format!("{key} must not be empty")))
        }
        _ => Ok(()),
    }
}
