use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum DetectorError {
    /// The input file does not exist.
    #[error("Missing file: {}", .0.display())]
    SourceUnavailable(PathBuf),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Configuration parse error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}

pub type Result<T> = std::result::Result<T, DetectorError>;
