//! Error types for qrstudio operations

use thiserror::Error;

/// Result type alias using qrstudio's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for qrstudio operations
#[derive(Error, Debug)]
pub enum Error {
    /// The QR encoder rejected the payload (e.g. too long for the EC level)
    #[error("Failed to encode QR code: {0}")]
    QrEncode(String),

    /// Logo could not be read or decoded
    #[error("Failed to load logo: {0}")]
    LogoLoad(String),

    /// Image processing error
    #[error("Image processing error: {0}")]
    Image(String),

    /// Color string could not be parsed
    #[error("Invalid color '{0}': expected #RGB, #RRGGBB or #RRGGBBAA")]
    InvalidColor(String),

    /// Rendered symbol did not decode back to its payload
    #[error("Verification failed: {0}")]
    Verify(String),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic error
    #[error("{0}")]
    Other(String),
}

impl From<image::ImageError> for Error {
    fn from(e: image::ImageError) -> Self {
        Error::Image(e.to_string())
    }
}

impl From<qrcode::types::QrError> for Error {
    fn from(e: qrcode::types::QrError) -> Self {
        Error::QrEncode(e.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Other(format!("JSON error: {}", e))
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(e: tokio::task::JoinError) -> Self {
        Error::Other(format!("Background task failed: {}", e))
    }
}
