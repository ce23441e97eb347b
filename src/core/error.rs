use thiserror::Error;

/// Custom error types for ntp_sync
///
/// Only two operations in this library can fail: parsing a hexadecimal
/// timestamp string and constructing an exchange result without a message.
/// Degenerate exchange inputs are never errors; they surface as diagnostic
/// notes on the computed result instead.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Format error: {0}")]
    Format(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
}

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// Creates a new format error
    pub fn format(msg: impl Into<String>) -> Self {
        Error::Format(msg.into())
    }

    /// Creates a new invalid argument error
    pub fn invalid_argument(msg: impl Into<String>) -> Self {
        Error::InvalidArgument(msg.into())
    }
}
