use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Failed to fetch CDN ranges: {0}")]
    Fetch(#[from] reqwest::Error),

    #[error("Invalid CIDR range: {0}")]
    InvalidRange(String),

    #[error("No usable ranges in response from {0}")]
    EmptyRangeList(String),

    #[error("CDN range download did not finish within {0:?}")]
    DeadlineExceeded(std::time::Duration),
}

pub type Result<T> = std::result::Result<T, Error>;
