//! CSV bar files, one per pair: `<data_dir>/<BASE>_<QUOTE>.csv`.

use crate::domain::error::EngineError;
use crate::domain::instrument::Instrument;
use crate::domain::ohlcv::PriceBar;
use crate::ports::data_port::DataPort;
use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use std::path::PathBuf;

const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

pub struct CsvAdapter {
    base_path: PathBuf,
}

impl CsvAdapter {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    pub fn csv_path(&self, instrument: &Instrument) -> PathBuf {
        self.base_path
            .join(format!("{}_{}.csv", instrument.base(), instrument.quote()))
    }
}

fn data_error(reason: String) -> EngineError {
    EngineError::DataSource { reason }
}

/// Accepts `YYYY-MM-DD HH:MM:SS`, or a bare date read as midnight.
fn parse_timestamp(value: &str) -> Result<NaiveDateTime, EngineError> {
    let value = value.trim();
    if let Ok(ts) = NaiveDateTime::parse_from_str(value, TIMESTAMP_FORMAT) {
        return Ok(ts);
    }
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .ok_or_else(|| {
            data_error(format!(
                "invalid timestamp '{value}', expected {TIMESTAMP_FORMAT}"
            ))
        })
}

fn parse_price(record: &csv::StringRecord, index: usize, column: &str) -> Result<f64, EngineError> {
    let raw = record
        .get(index)
        .ok_or_else(|| data_error(format!("missing {column} column")))?;
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|e| data_error(format!("invalid {column} value '{raw}': {e}")))?;
    if !value.is_finite() {
        return Err(data_error(format!("non-finite {column} value '{raw}'")));
    }
    Ok(value)
}

impl DataPort for CsvAdapter {
    fn fetch_bars(&self, instrument: &Instrument) -> Result<Vec<PriceBar>, EngineError> {
        let path = self.csv_path(instrument);
        let content = fs::read_to_string(&path)
            .map_err(|e| data_error(format!("failed to read {}: {}", path.display(), e)))?;

        let mut rdr = csv::Reader::from_reader(content.as_bytes());
        let mut bars = Vec::new();

        for result in rdr.records() {
            let record = result.map_err(|e| data_error(format!("CSV parse error: {e}")))?;
            let timestamp = parse_timestamp(
                record
                    .get(0)
                    .ok_or_else(|| data_error("missing timestamp column".into()))?,
            )?;

            bars.push(PriceBar {
                timestamp,
                open: parse_price(&record, 1, "open")?,
                high: parse_price(&record, 2, "high")?,
                low: parse_price(&record, 3, "low")?,
                close: parse_price(&record, 4, "close")?,
            });
        }

        bars.sort_by_key(|b| b.timestamp);
        bars.dedup_by_key(|b| b.timestamp);
        Ok(bars)
    }
}
