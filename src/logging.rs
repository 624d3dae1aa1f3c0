/// Structured logging for the QA/QC batch service.
///
/// Provides context-rich logging with station identifiers, timestamps,
/// and severity levels. Supports both console output and file-based
/// logging for unattended weekly runs, where the log file is the only
/// record of which stations were skipped and why.

use chrono::Local;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::sync::Mutex;

use crate::model::QcError;

// ---------------------------------------------------------------------------
// Log Levels
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LogLevel::Debug => write!(f, "DEBUG"),
            LogLevel::Info => write!(f, "INFO"),
            LogLevel::Warning => write!(f, "WARN"),
            LogLevel::Error => write!(f, "ERROR"),
        }
    }
}

// ---------------------------------------------------------------------------
// Subsystem Tags
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Store,
    Engine,
    Config,
    System,
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Store => write!(f, "STORE"),
            DataSource::Engine => write!(f, "ENGINE"),
            DataSource::Config => write!(f, "CONFIG"),
            DataSource::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure: the station legitimately has nothing to clean
    /// for this variable (no data, variable not declared).
    Expected,
    /// Unexpected failure: indicates service degradation, a schema drift,
    /// or a connectivity problem worth a human look.
    Unexpected,
    /// Unknown: cannot determine whether this is expected. A station that
    /// stopped transmitting lands here until someone checks on it.
    Unknown,
}

impl fmt::Display for FailureType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureType::Expected => write!(f, "EXPECTED"),
            FailureType::Unexpected => write!(f, "UNEXPECTED"),
            FailureType::Unknown => write!(f, "UNKNOWN"),
        }
    }
}

/// Classifies a per-station cleaning failure for log severity.
pub fn classify_failure(err: &QcError) -> FailureType {
    match err {
        QcError::EmptySeries { .. } | QcError::NoData { .. } => FailureType::Expected,
        QcError::ConfigurationMissing { .. } => FailureType::Expected,
        QcError::CutoffNotFound { .. } => FailureType::Unknown,
        QcError::Store(_) | QcError::Config(_) => FailureType::Unexpected,
    }
}

/// Whether a store failure looks like transient connectivity rather than
/// a schema or data problem. Transient failures are worth one retry at
/// the orchestration boundary; nothing else is.
pub fn is_transient(err: &QcError) -> bool {
    match err {
        QcError::Store(msg) => {
            let msg = msg.to_lowercase();
            msg.contains("connection") || msg.contains("timeout") || msg.contains("timed out")
        }
        _ => false,
    }
}

// ---------------------------------------------------------------------------
// Logger Configuration
// ---------------------------------------------------------------------------

/// Global logger instance
static LOGGER: Mutex<Option<Logger>> = Mutex::new(None);

pub struct Logger {
    /// Minimum log level to display
    min_level: LogLevel,
    /// Optional file path for logging
    log_file: Option<String>,
}

impl Logger {
    /// Initialize the global logger
    pub fn init(min_level: LogLevel, log_file: Option<String>) {
        let logger = Logger { min_level, log_file };
        *LOGGER.lock().unwrap() = Some(logger);
    }

    /// Log a message with the global logger
    fn log(&self, level: LogLevel, source: &DataSource, station: Option<&str>, message: &str) {
        if level < self.min_level {
            return;
        }

        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S");
        let station_part = station.map(|s| format!(" [{}]", s)).unwrap_or_default();
        let log_entry = format!(
            "{} {} {}{}: {}",
            timestamp, level, source, station_part, message
        );

        match level {
            LogLevel::Error | LogLevel::Warning => eprintln!("{}", log_entry),
            _ => println!("{}", log_entry),
        }

        if let Some(ref path) = self.log_file {
            if let Err(e) = Self::append_to_file(path, &log_entry) {
                eprintln!("Failed to write to log file {}: {}", path, e);
            }
        }
    }

    fn append_to_file(path: &str, entry: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        writeln!(file, "{}", entry)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Initialize the global logger
pub fn init_logger(min_level: LogLevel, log_file: Option<&str>) {
    Logger::init(min_level, log_file.map(String::from));
}

/// Log a general informational message
pub fn info(source: DataSource, station: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Info, &source, station, message);
    }
}

/// Log a warning message
pub fn warn(source: DataSource, station: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Warning, &source, station, message);
    }
}

/// Log an error message
pub fn error(source: DataSource, station: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Error, &source, station, message);
    }
}

/// Log a debug message
pub fn debug(source: DataSource, station: Option<&str>, message: &str) {
    if let Some(logger) = LOGGER.lock().unwrap().as_ref() {
        logger.log(LogLevel::Debug, &source, station, message);
    }
}

// ---------------------------------------------------------------------------
// Structured Failure Logging
// ---------------------------------------------------------------------------

/// Log a per-station cleaning failure with automatic classification.
/// Expected failures are routine and stay at debug; unknown ones warn so
/// the weekly log surfaces silent stations; unexpected ones are errors.
pub fn log_station_failure(station: &str, variable: &str, err: &QcError) {
    let failure_type = classify_failure(err);
    let message = format!("{} skipped [{}]: {}", variable, failure_type, err);

    match failure_type {
        FailureType::Expected => debug(DataSource::Engine, Some(station), &message),
        FailureType::Unexpected => error(DataSource::Engine, Some(station), &message),
        FailureType::Unknown => warn(DataSource::Engine, Some(station), &message),
    }
}

// ---------------------------------------------------------------------------
// Batch Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of one batch run over the whole network.
pub fn log_batch_summary(total: usize, cleaned: usize, skipped: usize, failed: usize) {
    let message = format!(
        "Batch complete: {}/{} station-variables cleaned, {} skipped, {} failed",
        cleaned, total, skipped, failed
    );

    if failed == 0 {
        info(DataSource::System, None, &message);
    } else if cleaned == 0 {
        error(DataSource::System, None, &message);
    } else {
        warn(DataSource::System, None, &message);
    }
}
