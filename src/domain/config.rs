//! Builds engine inputs from a [`ConfigPort`].

use crate::domain::combiner::{SignalPolicy, TrendFilter};
use crate::domain::config_validation::{
    validate_engine_config, validate_instrument_config, validate_replay_config,
};
use crate::domain::engine::EngineConfig;
use crate::domain::error::EngineError;
use crate::domain::exit::ExitRule;
use crate::domain::indicator::snapshot::IndicatorParams;
use crate::domain::instrument::{parse_instruments, Instrument};
use crate::domain::signal::CounterTrendThresholds;
use crate::ports::config_port::ConfigPort;
use std::path::PathBuf;

pub const ENGINE: &str = "engine";
pub const INDICATORS: &str = "indicators";
pub const INSTRUMENTS: &str = "instruments";
pub const REPLAY: &str = "replay";

/// Inputs for the offline replay harness.
#[derive(Debug, Clone, PartialEq)]
pub struct ReplayConfig {
    pub data_dir: PathBuf,
    pub cash: f64,
}

fn get_count(config: &dyn ConfigPort, section: &str, key: &str, default: usize) -> usize {
    usize::try_from(config.get_int(section, key, default as i64)).unwrap_or(0)
}

/// Indicator settings with defaults for every missing key.
pub fn indicator_params(config: &dyn ConfigPort) -> IndicatorParams {
    let d = IndicatorParams::default();
    IndicatorParams {
        window: get_count(config, INDICATORS, "window", d.window),
        stddev_mult: config.get_double(INDICATORS, "stddev_mult", d.stddev_mult),
        inner_stddev_mult: config.get_double(INDICATORS, "inner_stddev_mult", d.inner_stddev_mult),
        rsi_period: get_count(config, INDICATORS, "rsi_period", d.rsi_period),
        stoch_period: get_count(config, INDICATORS, "stoch_period", d.stoch_period),
        k_period: get_count(config, INDICATORS, "k_period", d.k_period),
        d_period: get_count(config, INDICATORS, "d_period", d.d_period),
        sma_window: get_count(config, INDICATORS, "sma_window", d.sma_window),
    }
}

pub fn build_engine_config(config: &dyn ConfigPort) -> Result<EngineConfig, EngineError> {
    validate_engine_config(config)?;
    let d = EngineConfig::default();

    let signal_policy = config
        .get_string(ENGINE, "signal_policy")
        .and_then(|v| SignalPolicy::parse(&v))
        .unwrap_or(d.signal_policy);
    let exit_rule = config
        .get_string(ENGINE, "exit_rule")
        .and_then(|v| ExitRule::parse(&v))
        .unwrap_or(d.exit_rule);
    let trend_filter = config.get_bool(ENGINE, "trend_filter", true).then(|| TrendFilter {
        lookback: get_count(config, ENGINE, "trend_lookback", 1),
    });

    Ok(EngineConfig {
        history_length: get_count(config, ENGINE, "history_length", d.history_length),
        timestep: config
            .get_string(ENGINE, "timestep")
            .map(|s| s.trim().to_string())
            .unwrap_or(d.timestep),
        sleeptime: config
            .get_string(ENGINE, "sleeptime")
            .map(|s| s.trim().to_string())
            .unwrap_or(d.sleeptime),
        method_orders_limit: get_count(
            config,
            ENGINE,
            "method_orders_limit",
            d.method_orders_limit,
        ),
        signal_policy,
        trend_filter,
        exit_rule,
        indicators: indicator_params(config),
        thresholds: CounterTrendThresholds {
            overbought: config.get_double(INDICATORS, "overbought", d.thresholds.overbought),
            oversold: config.get_double(INDICATORS, "oversold", d.thresholds.oversold),
        },
    })
}

pub fn build_instruments(config: &dyn ConfigPort) -> Result<Vec<Instrument>, EngineError> {
    validate_instrument_config(config)?;
    let pairs = config
        .get_string(INSTRUMENTS, "pairs")
        .ok_or(EngineError::NoInstruments)?;
    parse_instruments(&pairs, config.get_double(INSTRUMENTS, "cash_at_risk", 0.05))
}

pub fn build_replay_config(config: &dyn ConfigPort) -> Result<ReplayConfig, EngineError> {
    validate_replay_config(config)?;
    let data_dir = config
        .get_string(REPLAY, "data_dir")
        .map(|s| PathBuf::from(s.trim()))
        .ok_or_else(|| EngineError::ConfigMissing {
            section: REPLAY.to_string(),
            key: "data_dir".to_string(),
        })?;
    Ok(ReplayConfig {
        data_dir,
        cash: config.get_double(REPLAY, "cash", 100.0),
    })
}
