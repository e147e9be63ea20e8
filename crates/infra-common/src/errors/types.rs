use thiserror::Error;

/// Result type alias for infrastructure operations
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while setting up logging or loading settings
#[derive(Error, Debug)]
pub enum Error {
    /// Settings could not be read, merged or deserialized
    #[error("Configuration error: {0}")]
    Config(String),

    /// The tracing subscriber could not be installed
    #[error("Logging error: {0}")]
    Logging(String),
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}
