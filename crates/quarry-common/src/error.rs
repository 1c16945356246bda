//! Quarry error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum QuarryError {
    #[error("Metadata error: {0}")]
    Metadata(String),

    #[error("Ambiguous handler: query '{query}' already has a handler for {kind} with signature {signature}")]
    AmbiguousHandler {
        query: String,
        kind: String,
        signature: String,
    },

    #[error("Rule error: {0}")]
    Rule(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::ser::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),
}

pub type Result<T> = std::result::Result<T, QuarryError>;
