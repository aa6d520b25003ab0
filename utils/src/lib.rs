//! Shared utilities for the Groundtruth report ledger.

pub mod logging;

pub use logging::{init_logging, init_tracing, LogFormat, LoggingError};
