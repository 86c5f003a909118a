//! Structured logging for the TalsimResult → SOS-T bridge
//!
//! Provides context-rich logging tagged with the conversion stage and,
//! where relevant, the series being processed. Built on `tracing`; console
//! output goes to stderr and an optional append-mode log file receives the
//! same events without ANSI colours.

use std::fmt;
use std::fs::OpenOptions;
use std::str::FromStr;
use std::sync::Mutex;

use tracing::Level;
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::prelude::*;
use tracing_subscriber::fmt as fmt_layer;

use crate::model::ConversionError;

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

impl LogLevel {
    fn as_tracing(self) -> Level {
        match self {
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Info => Level::INFO,
            LogLevel::Warning => Level::WARN,
            LogLevel::Error => Level::ERROR,
        }
    }
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

impl FromStr for LogLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warn" | "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            other => Err(format!("unknown log level '{}'", other)),
        }
    }
}

// ---------------------------------------------------------------------------
// Conversion Stages
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Document,
    Sensor,
    Observation,
    Transport,
    System,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Stage::Document => write!(f, "DOC"),
            Stage::Sensor => write!(f, "SENSOR"),
            Stage::Observation => write!(f, "OBS"),
            Stage::Transport => write!(f, "HTTP"),
            Stage::System => write!(f, "SYS"),
        }
    }
}

// ---------------------------------------------------------------------------
// Failure Classification
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureType {
    /// Expected failure - the data was already inserted by an earlier run
    Expected,
    /// Unexpected failure - broken input, unreachable service, or configuration issue
    Unexpected,
    /// Unknown - the service rejected the request for a reason we don't recognise
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

// ---------------------------------------------------------------------------
// Logger Setup
// ---------------------------------------------------------------------------

/// Install the global subscriber.
///
/// Calling this twice keeps the first subscriber; only opening the log file
/// can fail.
pub fn init_logger(
    min_level: LogLevel,
    log_file: Option<&str>,
    console_timestamps: bool,
) -> std::io::Result<()> {
    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new().create(true).append(true).open(path)?;
            Some(
                fmt_layer::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    let console_layer = fmt_layer::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    let console_layer = if console_timestamps {
        console_layer.boxed()
    } else {
        console_layer.without_time().boxed()
    };

    let _ = tracing_subscriber::registry()
        .with(LevelFilter::from_level(min_level.as_tracing()))
        .with(console_layer)
        .with(file_layer)
        .try_init();
    Ok(())
}

// ---------------------------------------------------------------------------
// Public Logging Functions
// ---------------------------------------------------------------------------

/// Log a general informational message
pub fn info(stage: Stage, series: Option<&str>, message: &str) {
    tracing::info!(stage = %stage, series = series.unwrap_or("-"), "{}", message);
}

/// Log a warning message
pub fn warn(stage: Stage, series: Option<&str>, message: &str) {
    tracing::warn!(stage = %stage, series = series.unwrap_or("-"), "{}", message);
}

/// Log an error message
pub fn error(stage: Stage, series: Option<&str>, message: &str) {
    tracing::error!(stage = %stage, series = series.unwrap_or("-"), "{}", message);
}

/// Log a debug message
pub fn debug(stage: Stage, series: Option<&str>, message: &str) {
    tracing::debug!(stage = %stage, series = series.unwrap_or("-"), "{}", message);
}

// ---------------------------------------------------------------------------
// Failure Classification Helpers
// ---------------------------------------------------------------------------

/// Classify a conversion failure based on the error kind and response text
pub fn classify_failure(err: &ConversionError) -> FailureType {
    match err {
        // Re-running the same TalsimResult hits observations/sensors the
        // SOS already holds.
        ConversionError::InsertFailure { body, .. }
            if body.contains("already")
                || body.contains("still exists")
                || body.contains("Duplicate")
                || body.contains("duplicate") =>
        {
            FailureType::Expected
        }
        ConversionError::InsertFailure { .. } => FailureType::Unknown,
        ConversionError::Transport(_) => FailureType::Unexpected,
        ConversionError::Xml(_)
        | ConversionError::NotFound { .. }
        | ConversionError::MalformedDocument(_)
        | ConversionError::MalformedTimestamp { .. } => FailureType::Unexpected,
    }
}

/// Log a failed stage with automatic classification
pub fn log_failure(stage: Stage, series: Option<&str>, operation: &str, err: &ConversionError) {
    let failure_type = classify_failure(err);
    let message = format!("{} failed [{}]: {}", operation, failure_type, err);

    match failure_type {
        FailureType::Expected => warn(stage, series, &message),
        FailureType::Unexpected | FailureType::Unknown => error(stage, series, &message),
    }
}

// ---------------------------------------------------------------------------
// Run Summary Logging
// ---------------------------------------------------------------------------

/// Log a summary of a conversion run
pub fn log_run_summary(series_total: usize, series_done: usize, observations: usize) {
    let message = format!(
        "Run complete: {}/{} series, {} observations inserted",
        series_done, series_total, observations
    );

    if series_done == series_total {
        info(Stage::System, None, &message);
    } else if series_done == 0 {
        error(Stage::System, None, &message);
    } else {
        warn(Stage::System, None, &message);
    }
}
