//! CLI definition and dispatch.

use clap::{Parser, Subcommand};
use log::{info, warn};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use crate::adapters::csv_adapter::CsvAdapter;
use crate::adapters::file_config_adapter::FileConfigAdapter;
use crate::adapters::sim_broker::SimBroker;
use crate::domain::config::{
    build_engine_config, build_instruments, build_replay_config, ReplayConfig, REPLAY,
};
use crate::domain::engine::{EngineConfig, TradingEngine};
use crate::domain::error::EngineError;
use crate::domain::instrument::Instrument;
use crate::domain::order::Order;
use crate::ports::broker_port::Broker;
use crate::ports::config_port::ConfigPort;
use crate::ports::data_port::DataPort;

#[derive(Parser, Debug)]
#[command(name = "bandtrader", about = "Band and stochastic RSI FX trading engine")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Replay recorded bars through the engine with a simulated broker
    Replay {
        #[arg(short, long)]
        config: PathBuf,
        /// Overrides [replay] data_dir
        #[arg(long)]
        data_dir: Option<PathBuf>,
        /// Overrides [replay] cash
        #[arg(long)]
        cash: Option<f64>,
    },
    /// Validate a configuration file
    Validate {
        #[arg(short, long)]
        config: PathBuf,
    },
}

pub fn run(cli: Cli) -> ExitCode {
    match cli.command {
        Command::Replay {
            config,
            data_dir,
            cash,
        } => run_replay(&config, data_dir, cash),
        Command::Validate { config } => run_validate(&config),
    }
}

pub fn load_config(path: &Path) -> Result<FileConfigAdapter, ExitCode> {
    FileConfigAdapter::from_file(path).map_err(|err| {
        eprintln!("error: {err}");
        ExitCode::from(&err)
    })
}

fn fail(err: &EngineError) -> ExitCode {
    eprintln!("error: {err}");
    err.into()
}

/// `[replay]` settings with command-line overrides applied.
pub fn resolve_replay_config(
    config: &dyn ConfigPort,
    data_dir: Option<PathBuf>,
    cash: Option<f64>,
) -> Result<ReplayConfig, EngineError> {
    let mut replay = match data_dir {
        Some(data_dir) => ReplayConfig {
            data_dir,
            cash: config.get_double(REPLAY, "cash", 100.0),
        },
        None => build_replay_config(config)?,
    };
    if let Some(cash) = cash {
        replay.cash = cash;
    }
    if !(replay.cash > 0.0) {
        return Err(EngineError::ConfigInvalid {
            section: REPLAY.to_string(),
            key: "cash".to_string(),
            reason: "cash must be positive".to_string(),
        });
    }
    Ok(replay)
}

fn run_replay(config_path: &Path, data_dir: Option<PathBuf>, cash: Option<f64>) -> ExitCode {
    eprintln!("Loading config from {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let engine_config = match build_engine_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let instruments = match build_instruments(&adapter) {
        Ok(i) => i,
        Err(e) => return fail(&e),
    };
    let replay = match resolve_replay_config(&adapter, data_dir, cash) {
        Ok(r) => r,
        Err(e) => return fail(&e),
    };

    eprintln!(
        "Replaying {} instrument(s) from {}",
        instruments.len(),
        replay.data_dir.display()
    );
    let data_port = CsvAdapter::new(replay.data_dir.clone());
    let summary = match run_replay_pipeline(&data_port, instruments, engine_config, replay.cash) {
        Ok(s) => s,
        Err(e) => return fail(&e),
    };

    eprintln!("\n=== Orders ===");
    for order in &summary.fills {
        eprintln!(
            "  {:<28} {:<4} {:>10.2} {}/{} @ {:.5}",
            order.id.0,
            order.side.to_string(),
            order.quantity,
            order.asset,
            order.quote,
            order.fill_price.unwrap_or(f64::NAN),
        );
    }
    eprintln!("\n=== Summary ===");
    eprintln!("Ticks:          {}", summary.ticks);
    eprintln!("Orders:         {}", summary.fills.len());
    eprintln!("Skipped:        {}", summary.skipped);
    eprintln!("Final cash:     {:.2}", summary.final_cash);
    eprintln!("Final equity:   {:.2}", summary.final_equity);
    ExitCode::SUCCESS
}

/// Outcome of a full replay.
#[derive(Debug)]
pub struct ReplaySummary {
    pub ticks: usize,
    /// Instrument ticks skipped for insufficient data.
    pub skipped: usize,
    pub fills: Vec<Order>,
    pub final_cash: f64,
    pub final_equity: f64,
}

/// Load bars for every instrument, then tick the engine once per timestamp.
///
/// Pairs without data are dropped with a warning. Ticking starts once the
/// timeline is long enough to fill the requested history.
pub fn run_replay_pipeline(
    data_port: &dyn DataPort,
    instruments: Vec<Instrument>,
    engine_config: EngineConfig,
    cash: f64,
) -> Result<ReplaySummary, EngineError> {
    let mut broker = SimBroker::new(cash);
    let mut loaded = Vec::with_capacity(instruments.len());

    for instrument in instruments {
        match data_port.fetch_bars(&instrument) {
            Ok(bars) if !bars.is_empty() => {
                broker.add_series(&instrument, bars);
                loaded.push(instrument);
            }
            Ok(_) => warn!("skipping {instrument}: no bars"),
            Err(e) => warn!("skipping {instrument}: {e}"),
        }
    }
    if loaded.is_empty() {
        return Err(EngineError::DataSource {
            reason: "no bar data for any configured instrument".to_string(),
        });
    }

    let mut engine = TradingEngine::initialize(loaded, engine_config)?;
    broker.seek(engine.config().history_length.saturating_sub(1));
    info!(
        "replaying {} pair(s) from {}",
        engine.instruments().len(),
        broker.now().map(|t| t.to_string()).unwrap_or_default()
    );

    let mut ticks = 0;
    let mut skipped = 0;
    loop {
        match engine.on_trading_iteration(&mut broker) {
            Ok(report) => skipped += report.skipped.len(),
            Err(e) => {
                engine.on_bot_crash(&mut broker, &e);
                return Err(e);
            }
        }
        ticks += 1;
        if !broker.advance() {
            break;
        }
    }

    Ok(ReplaySummary {
        ticks,
        skipped,
        fills: broker.fills().to_vec(),
        final_cash: broker.get_cash()?,
        final_equity: broker.equity(),
    })
}

fn run_validate(config_path: &Path) -> ExitCode {
    eprintln!("Validating config: {}", config_path.display());
    let adapter = match load_config(config_path) {
        Ok(a) => a,
        Err(code) => return code,
    };

    let engine_config = match build_engine_config(&adapter) {
        Ok(c) => c,
        Err(e) => return fail(&e),
    };
    let instruments = match build_instruments(&adapter) {
        Ok(i) => i,
        Err(e) => return fail(&e),
    };

    eprintln!("\nInstruments:");
    for instrument in &instruments {
        eprintln!(
            "  {:<8} cash_at_risk {:.2}",
            instrument.pair(),
            instrument.cash_at_risk()
        );
    }
    eprintln!("\nEngine:");
    eprintln!("  history_length       {}", engine_config.history_length);
    eprintln!(
        "  minimum bars         {}",
        engine_config.indicators.minimum_bars()
    );
    eprintln!("  method_orders_limit  {}", engine_config.method_orders_limit);
    eprintln!("  signal_policy        {:?}", engine_config.signal_policy);
    eprintln!("  exit_rule            {:?}", engine_config.exit_rule);
    match engine_config.trend_filter {
        Some(filter) => eprintln!("  trend_filter         lookback {}", filter.lookback),
        None => eprintln!("  trend_filter         off"),
    }

    eprintln!("\nConfiguration is valid.");
    ExitCode::SUCCESS
}
