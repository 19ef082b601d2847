//! Domain error types.

/// Top-level error type for bandtrader.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("missing config key [{section}] {key}")]
    ConfigMissing { section: String, key: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("no instruments configured")]
    NoInstruments,

    #[error("invalid instrument {pair}: {reason}")]
    InvalidInstrument { pair: String, reason: String },

    #[error("insufficient data for {instrument}: {indicator} needs {minimum} bars, have {bars}")]
    InsufficientData {
        instrument: String,
        indicator: String,
        bars: usize,
        minimum: usize,
    },

    #[error("{indicator} produced a non-finite value for {instrument}")]
    NonFiniteIndicator {
        instrument: String,
        indicator: String,
    },

    #[error("data source error: {reason}")]
    DataSource { reason: String },

    #[error("broker error: {reason}")]
    Broker { reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// True for errors that only disqualify one instrument for the current tick.
    pub fn is_data_insufficiency(&self) -> bool {
        matches!(
            self,
            EngineError::InsufficientData { .. } | EngineError::NonFiniteIndicator { .. }
        )
    }
}

impl From<&EngineError> for std::process::ExitCode {
    fn from(err: &EngineError) -> Self {
        let code: u8 = match err {
            EngineError::Io(_) => 1,
            EngineError::ConfigParse { .. }
            | EngineError::ConfigMissing { .. }
            | EngineError::ConfigInvalid { .. }
            | EngineError::NoInstruments
            | EngineError::InvalidInstrument { .. } => 2,
            EngineError::DataSource { .. } => 3,
            EngineError::Broker { .. } => 4,
            EngineError::InsufficientData { .. } | EngineError::NonFiniteIndicator { .. } => 5,
        };
        std::process::ExitCode::from(code)
    }
}
