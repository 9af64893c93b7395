//! Error types and handling
//!
//! Common error types used across the application.

use thiserror::Error;

use crate::capture::device::CaptureError;
use crate::encode::EncodeError;
use crate::telemetry::fetch::FetchError;

/// Application-wide error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Capture error: {0}")]
    Capture(#[from] CaptureError),

    #[error("Encode error: {0}")]
    Encode(#[from] EncodeError),

    #[error("Configuration error: {0}")]
    Config(String),
}

/// Result type alias using AppError
pub type AppResult<T> = Result<T, AppError>;
