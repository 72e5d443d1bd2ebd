use thiserror::Error;

/// Errors raised by the library-level helpers (scanning, hashing, settings).
#[derive(Debug, Error)]
pub enum LibError {
    /// I/O error while reading the library or a settings file
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// The settings file could not be interpreted
    #[error("Settings error: {0}")]
    Settings(String),

    /// TOML could not be parsed
    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    /// TOML could not be produced
    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    /// A blocking worker task panicked or was cancelled
    #[error("Background task failed: {0}")]
    Task(String),
}

impl LibError {
    pub fn settings(msg: impl Into<String>) -> Self {
        Self::Settings(msg.into())
    }

    pub fn task(msg: impl Into<String>) -> Self {
        Self::Task(msg.into())
    }
}
