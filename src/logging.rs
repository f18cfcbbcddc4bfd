//! Logging setup from the resolved settings.
//!
//! The loader keeps `log_file`, `log_format` and `log_level` as plain text;
//! this module is where their value sets are enforced, when they are turned
//! into a `tracing` subscriber.

use std::fs::OpenOptions;
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Mutex;

use tracing::Subscriber;
use tracing::level_filters::LevelFilter;
use tracing_subscriber::fmt::writer::BoxMakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, Layer, Registry, fmt};

use crate::error::ConfigError;
use crate::settings::Settings;

/// Where log output goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LogTarget {
    Stdout,
    Stderr,
    /// Discard everything.
    Null,
    /// Append to a file, created if missing.
    File(PathBuf),
}

impl From<&str> for LogTarget {
    fn from(value: &str) -> Self {
        match value {
            "stdout" => LogTarget::Stdout,
            "stderr" => LogTarget::Stderr,
            "null" => LogTarget::Null,
            path => LogTarget::File(PathBuf::from(path)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            other => Err(ConfigError::InvalidValue {
                key: "log-format".into(),
                reason: format!("'{other}' is not one of: text, json"),
            }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug,
    Info,
    Warning,
    Error,
    Critical,
}

impl LogLevel {
    /// `tracing` has no critical level; it shares ERROR.
    pub fn as_filter(self) -> LevelFilter {
        match self {
            LogLevel::Debug => LevelFilter::DEBUG,
            LogLevel::Info => LevelFilter::INFO,
            LogLevel::Warning => LevelFilter::WARN,
            LogLevel::Error | LogLevel::Critical => LevelFilter::ERROR,
        }
    }
}

impl FromStr for LogLevel {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "debug" => Ok(LogLevel::Debug),
            "info" => Ok(LogLevel::Info),
            "warning" => Ok(LogLevel::Warning),
            "error" => Ok(LogLevel::Error),
            "critical" => Ok(LogLevel::Critical),
            other => Err(ConfigError::InvalidValue {
                key: "log-level".into(),
                reason: format!("'{other}' is not one of: debug, info, warning, error, critical"),
            }),
        }
    }
}

fn make_writer(target: &LogTarget) -> Result<BoxMakeWriter, ConfigError> {
    let writer = match target {
        LogTarget::Stdout => BoxMakeWriter::new(std::io::stdout),
        LogTarget::Stderr => BoxMakeWriter::new(std::io::stderr),
        LogTarget::Null => BoxMakeWriter::new(std::io::sink),
        LogTarget::File(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|e| ConfigError::LogFile {
                    path: path.clone(),
                    source: e,
                })?;
            BoxMakeWriter::new(Mutex::new(file))
        }
    };
    Ok(writer)
}

/// Build a subscriber for the log settings without installing it.
pub fn build_subscriber(
    settings: &Settings,
) -> Result<Box<dyn Subscriber + Send + Sync>, ConfigError> {
    let format: LogFormat = settings.log_format.parse()?;
    let level: LogLevel = settings.log_level.parse()?;
    let writer = make_writer(&LogTarget::from(settings.log_file.as_str()))?;

    let fmt_layer: Box<dyn Layer<Registry> + Send + Sync> = match format {
        LogFormat::Json => fmt::layer()
            .json()
            .with_target(true)
            .with_writer(writer)
            .boxed(),
        LogFormat::Text => fmt::layer()
            .with_target(true)
            .with_ansi(false)
            .with_writer(writer)
            .boxed(),
    };

    let filter = EnvFilter::builder()
        .with_default_directive(level.as_filter().into())
        .parse_lossy("");
    Ok(Box::new(Registry::default().with(fmt_layer).with(filter)))
}

/// Install the subscriber for `settings` as the global default.
pub fn init_logging(settings: &Settings) -> Result<(), ConfigError> {
    let subscriber = build_subscriber(settings)?;
    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| ConfigError::Logging(e.to_string()))?;

    tracing::debug!(
        log_file = %settings.log_file,
        log_format = %settings.log_format,
        log_level = %settings.log_level,
        "Logging initialized"
    );
    Ok(())
}
