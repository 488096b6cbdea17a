//! Configuration loading and persistence.

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{EstimatorSettings, LoggingSettings, PathSettings, Settings};
