use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to read log file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Log file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Invalid threshold: {0}")]
    InvalidThreshold(String),

    #[error("Aggregation error: {0}")]
    Aggregation(String),
}

pub type Result<T> = std::result::Result<T, Error>;
