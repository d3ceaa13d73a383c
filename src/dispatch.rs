//! Event validation and routing
//!
//! Turns an S3 notification into a validated source/destination pair, or
//! declines to act when the object is not a supported image.

use crate::models::{ImageType, Location, S3Event};
use crate::{Error, Result};
use tracing::warn;

/// Validated unit of work.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Job {
    pub source: Location,
    pub destination_bucket: String,
    pub image_type: ImageType,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    Process(Job),
    /// The key has an extension outside the supported set. Not an error.
    Skip { key: String, extension: String },
}

pub struct Dispatcher {
    bucket_suffix: String,
}

impl Dispatcher {
    pub fn new(bucket_suffix: impl Into<String>) -> Self {
        Self {
            bucket_suffix: bucket_suffix.into(),
        }
    }

    pub fn dispatch(&self, event: &S3Event) -> Result<Dispatch> {
        let record = event
            .records
            .first()
            .ok_or_else(|| Error::InvalidEvent("event contains no records".to_string()))?;

        if event.records.len() > 1 {
            warn!(
                "Event contains {} records; only the first is processed",
                event.records.len()
            );
        }

        let source_bucket = record
            .s3
            .bucket
            .name
            .clone()
            .ok_or_else(|| Error::InvalidEvent("record has no bucket name".to_string()))?;
        let raw_key = record
            .s3
            .object
            .key
            .as_deref()
            .ok_or_else(|| Error::InvalidEvent("record has no object key".to_string()))?;
        let source_key = decode_key(raw_key)?;
        let destination_bucket = format!("{}{}", source_bucket, self.bucket_suffix);

        // Writing thumbnails into the source bucket would re-trigger this function.
        if source_bucket == destination_bucket {
            return Err(Error::Configuration(format!(
                "destination bucket must not match source bucket '{}'",
                source_bucket
            )));
        }

        let extension = infer_extension(&source_key).ok_or_else(|| {
            Error::UnsupportedInput(format!("unable to infer image type for key {}", source_key))
        })?;

        let Some(image_type) = ImageType::from_extension(extension) else {
            return Ok(Dispatch::Skip {
                extension: extension.to_string(),
                key: source_key,
            });
        };

        Ok(Dispatch::Process(Job {
            source: Location::new(source_bucket, source_key),
            destination_bucket,
            image_type,
        }))
    }
}

/// Decode an S3 notification key: `+` is a space, the rest is percent-encoded.
pub fn decode_key(raw: &str) -> Result<String> {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|decoded| decoded.into_owned())
        .map_err(|e| {
            Error::InvalidEvent(format!("object key '{}' is not valid UTF-8: {}", raw, e))
        })
}

/// Everything after the final `.`, which may be empty.
fn infer_extension(key: &str) -> Option<&str> {
    key.rsplit_once('.').map(|(_, extension)| extension)
}
