use thiserror::Error;

/// Top-level error type shared by the recall crates.
#[derive(Error, Debug)]
pub enum RecallError {
    #[error("Configuration error: {0}")]
    Config(String),
}

impl From<config::ConfigError> for RecallError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
