//! Per-trait logging.
//!
//! Each trait job gets its own logger that writes to a dedicated log file
//! and optionally forwards every line to a callback. Process-level events
//! go through `tracing` instead.

mod trait_logger;
mod types;

pub use trait_logger::TraitLogger;
pub use types::{LogCallback, LogConfig, LogLevel, MessagePrefix};
