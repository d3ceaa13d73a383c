//! Image probing and resizing
//!
//! Wraps the decoder/encoder behind [`ImageService`] so the pipeline can run
//! against the real `image` crate or an in-memory mock.

pub mod mime;
pub mod mock;
pub mod processor;

pub use mime::{content_type_or_sniffed, detect_image_mime};
pub use mock::MockImageProcessor;
pub use processor::ImageProcessor;

use crate::models::{Dimensions, ImageType};
use crate::Result;
use async_trait::async_trait;
use bytes::Bytes;

#[async_trait]
pub trait ImageService: Send + Sync {
    /// Read the pixel dimensions of an encoded image.
    async fn inspect_size(&self, data: Bytes) -> Result<Dimensions>;

    /// Resize to exactly `target` and re-encode as `image_type`.
    async fn resize(&self, data: Bytes, image_type: ImageType, target: Dimensions)
        -> Result<Bytes>;
}
