//! Core domain types and decision logic.

pub mod combiner;
pub mod config;
pub mod config_validation;
pub mod engine;
pub mod error;
pub mod exit;
pub mod indicator;
pub mod instrument;
pub mod ledger;
pub mod ohlcv;
pub mod order;
pub mod position;
pub mod signal;
pub mod throttle;
