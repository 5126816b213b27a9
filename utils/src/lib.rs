//! Shared utilities for the delegate voters node.

pub mod logging;

pub use logging::{init_logging, LogFormat, LoggingError};
