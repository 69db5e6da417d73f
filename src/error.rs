use thiserror::Error;

#[derive(Error, Debug)]
pub enum SummaryError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON deserialization failed: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML deserialization failed: {0}")]
    Toml(#[from] toml::de::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Feed request to {url} failed with status {status}")]
    Feed { url: String, status: u16 },

    #[error("Invalid feed URL '{url}': {message}")]
    FeedUrl { url: String, message: String },

    #[error("Geocoder error: {0}")]
    Geocoder(String),

    #[error("Store error: {0}")]
    Store(String),

    #[error("Unknown dataset: {0}")]
    UnknownDataset(String),
}

impl From<rusqlite::Error> for SummaryError {
    fn from(e: rusqlite::Error) -> Self {
        SummaryError::Store(e.to_string())
    }
}

pub type Result<T> = std::result::Result<T, SummaryError>;
