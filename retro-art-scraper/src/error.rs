/// Errors that can occur while talking to the remote catalog or persisting
/// its results.
#[derive(Debug, thiserror::Error)]
pub enum ScrapeError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate limited by ScreenScraper API")]
    RateLimit,

    #[error("Daily quota exceeded: {0}")]
    QuotaExceeded(String),

    #[error("Invalid credentials: {0}")]
    InvalidCredentials(String),

    #[error("Server error (HTTP {status}): {message}")]
    ServerError { status: u16, message: String },

    #[error("API error: {0}")]
    Api(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON parsing error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Hashing failed: {0}")]
    Hash(String),
}

impl From<retro_art_lib::LibError> for ScrapeError {
    fn from(e: retro_art_lib::LibError) -> Self {
        match e {
            retro_art_lib::LibError::Io(io) => Self::Io(io),
            other => Self::Hash(other.to_string()),
        }
    }
}
