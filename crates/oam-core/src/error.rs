use thiserror::Error;

/// Top-level error type for the OAM tools.
#[derive(Error, Debug)]
pub enum OamError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for OamError {
    fn from(err: config::ConfigError) -> Self {
        OamError::Config(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, OamError>;
