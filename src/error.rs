use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Error binding flags: flag '--{flag}' {reason}")]
    FlagBinding { flag: String, reason: String },

    #[error("Application name cannot be empty!")]
    EmptyAppName,

    #[error(transparent)]
    Args(#[from] clap::Error),

    #[error("Invalid value for '{key}': {reason}")]
    InvalidValue { key: String, reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] confique::Error),

    #[error("Failed to open log file {path}: {source}")]
    LogFile {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to install logger: {0}")]
    Logging(String),
}
