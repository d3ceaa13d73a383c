//! Error handling and custom error types
//!
//! Provides unified error handling across the thumbnail pipeline using thiserror.

use std::any::Any;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Unsupported input: {0}")]
    UnsupportedInput(String),

    #[error("Invalid event: {0}")]
    InvalidEvent(String),

    #[error("Failed to inspect source image: {0}")]
    Inspect(String),

    #[error("Failed to transform variant '{profile}': {reason}")]
    Transform { profile: String, reason: String },

    #[error("Failed to publish variant '{profile}': {reason}")]
    Publish { profile: String, reason: String },

    #[error("Object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    #[error("S3 error: {0}")]
    Storage(String),

    #[error("Timed out: {0}")]
    Timeout(String),

    #[error("Image processing error: {0}")]
    Image(#[from] image::ImageError),

    #[error("Task panicked: {0}")]
    Panicked(String),

    #[error("Background task failed: {0}")]
    Join(#[from] tokio::task::JoinError),
}

impl Error {
    /// Errors that name a single profile, used for log context.
    pub fn profile(&self) -> Option<&str> {
        match self {
            Error::Transform { profile, .. } | Error::Publish { profile, .. } => Some(profile),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Turn a caught panic payload into an error.
pub(crate) fn from_panic(payload: Box<dyn Any + Send>) -> Error {
    let message = if let Some(msg) = payload.downcast_ref::<&str>() {
        msg.to_string()
    } else if let Some(msg) = payload.downcast_ref::<String>() {
        msg.clone()
    } else {
        "unknown panic payload".to_string()
    };
    Error::Panicked(message)
}
