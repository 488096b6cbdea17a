//! Per-trait logger with file and callback output.

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Local;
use parking_lot::Mutex;

use super::types::{LogCallback, LogConfig, LogLevel, MessagePrefix};

/// Per-trait logger with dual output (file + optional callback).
///
/// One logger is created per trait job; concurrent jobs on a shared
/// filesystem each write to their own file.
pub struct TraitLogger {
    /// Trait code this logger belongs to.
    trait_id: String,
    /// Path to the log file (when file logging is enabled).
    log_path: Option<PathBuf>,
    /// File writer (buffered).
    file_writer: Arc<Mutex<Option<BufWriter<File>>>>,
    /// Optional forwarding callback.
    callback: Arc<Mutex<Option<LogCallback>>>,
    /// Logging configuration.
    config: LogConfig,
}

impl TraitLogger {
    /// Create a new logger writing to `<log_dir>/<trait_id>.log`.
    pub fn new(
        trait_id: impl Into<String>,
        log_dir: &Path,
        config: LogConfig,
        callback: Option<LogCallback>,
    ) -> std::io::Result<Self> {
        let trait_id = trait_id.into();

        fs::create_dir_all(log_dir)?;
        let log_path = log_dir.join(format!("{}.log", trait_id));
        let file_writer = BufWriter::new(File::create(&log_path)?);

        Ok(Self {
            trait_id,
            log_path: Some(log_path),
            file_writer: Arc::new(Mutex::new(Some(file_writer))),
            callback: Arc::new(Mutex::new(callback)),
            config,
        })
    }

    /// Create a logger with no file output (callback only, or silent).
    pub fn detached(trait_id: impl Into<String>, callback: Option<LogCallback>) -> Self {
        Self {
            trait_id: trait_id.into(),
            log_path: None,
            file_writer: Arc::new(Mutex::new(None)),
            callback: Arc::new(Mutex::new(callback)),
            config: LogConfig::default(),
        }
    }

    /// Get the trait code.
    pub fn trait_id(&self) -> &str {
        &self.trait_id
    }

    /// Get the log file path (if file logging is enabled).
    pub fn log_path(&self) -> Option<&Path> {
        self.log_path.as_deref()
    }

    /// Log a message at the specified level.
    pub fn log(&self, level: LogLevel, message: &str) {
        if level < self.config.level {
            return;
        }
        let formatted = self.format_message(message);
        self.output(&formatted);
    }

    /// Log an info message.
    pub fn info(&self, message: &str) {
        self.log(LogLevel::Info, message);
    }

    /// Log a debug message.
    pub fn debug(&self, message: &str) {
        self.log(LogLevel::Debug, message);
    }

    /// Log a warning message.
    pub fn warn(&self, message: &str) {
        let msg = MessagePrefix::Warning.format(message);
        self.log(LogLevel::Warn, &msg);
    }

    /// Log an error message.
    pub fn error(&self, message: &str) {
        let msg = MessagePrefix::Error.format(message);
        self.log(LogLevel::Error, &msg);
    }

    /// Log a command being executed.
    pub fn command(&self, command: &str) {
        let msg = MessagePrefix::Command.format(command);
        self.log(LogLevel::Info, &msg);
    }

    /// Log a phase marker.
    pub fn phase(&self, phase_name: &str) {
        let msg = MessagePrefix::Phase.format(phase_name);
        self.log(LogLevel::Info, &msg);
    }

    /// Log a success message.
    pub fn success(&self, message: &str) {
        let msg = MessagePrefix::Success.format(message);
        self.log(LogLevel::Info, &msg);
    }

    /// Log a validation message.
    pub fn validation(&self, message: &str) {
        let msg = MessagePrefix::Validation.format(message);
        self.log(LogLevel::Info, &msg);
    }

    /// Flush buffered file output.
    pub fn flush(&self) {
        if let Some(writer) = self.file_writer.lock().as_mut() {
            let _ = writer.flush();
        }
    }

    fn format_message(&self, message: &str) -> String {
        if self.config.show_timestamps {
            format!("[{}] {}", Local::now().format("%H:%M:%S"), message)
        } else {
            message.to_string()
        }
    }

    fn output(&self, line: &str) {
        if let Some(writer) = self.file_writer.lock().as_mut() {
            let _ = writeln!(writer, "{}", line);
        }
        if let Some(callback) = self.callback.lock().as_ref() {
            callback(line);
        }
    }
}

impl Drop for TraitLogger {
    fn drop(&mut self) {
        self.flush();
    }
}
