use thiserror::Error;

/// Top-level error type for the quatuor client.
///
/// Subsystem crates define their own error types; this enum covers the
/// concerns shared by all of them (configuration, parsing of domain values,
/// file I/O).
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum QuatuorError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Unknown chat mode: {0}")]
    UnknownMode(String),

    #[error("Unknown provider: {0}")]
    UnknownProvider(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for QuatuorError {
    fn from(err: toml::de::Error) -> Self {
        QuatuorError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for QuatuorError {
    fn from(err: toml::ser::Error) -> Self {
        QuatuorError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for QuatuorError {
    fn from(err: serde_json::Error) -> Self {
        QuatuorError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for quatuor operations.
pub type Result<T> = std::result::Result<T, QuatuorError>;
