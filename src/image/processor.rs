use super::ImageService;
use crate::models::{Dimensions, ImageType};
use crate::{Error, Result};
use async_trait::async_trait;
use bytes::Bytes;
use image::imageops::FilterType;
use image::{DynamicImage, ImageReader};
use std::io::Cursor;
use tracing::debug;

/// [`ImageService`] backed by the `image` crate.
pub struct ImageProcessor {
    filter: FilterType,
}

impl ImageProcessor {
    pub fn new() -> Self {
        Self {
            filter: FilterType::Lanczos3,
        }
    }

    fn inspect_size_sync(data: &[u8]) -> Result<Dimensions> {
        let (width, height) = ImageReader::new(Cursor::new(data))
            .with_guessed_format()
            .map_err(|e| Error::Inspect(format!("Failed to read image header: {}", e)))?
            .into_dimensions()
            .map_err(|e| Error::Inspect(e.to_string()))?;

        Ok(Dimensions::new(width, height))
    }

    fn resize_sync(
        data: &[u8],
        image_type: ImageType,
        target: Dimensions,
        filter: FilterType,
    ) -> Result<Bytes> {
        let decoded = image::load_from_memory(data)?;
        let resized = decoded.resize_exact(target.width, target.height, filter);

        // The JPEG encoder rejects alpha channels.
        let resized = match image_type {
            ImageType::Jpg => DynamicImage::ImageRgb8(resized.to_rgb8()),
            ImageType::Png => resized,
        };

        let mut buf = Vec::new();
        resized.write_to(&mut Cursor::new(&mut buf), image_type.format())?;

        debug!(
            width = target.width,
            height = target.height,
            size = buf.len(),
            format = %image_type,
            "Encoded resized image"
        );

        Ok(Bytes::from(buf))
    }
}

impl Default for ImageProcessor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ImageService for ImageProcessor {
    async fn inspect_size(&self, data: Bytes) -> Result<Dimensions> {
        tokio::task::spawn_blocking(move || Self::inspect_size_sync(&data)).await?
    }

    async fn resize(
        &self,
        data: Bytes,
        image_type: ImageType,
        target: Dimensions,
    ) -> Result<Bytes> {
        let filter = self.filter;
        tokio::task::spawn_blocking(move || Self::resize_sync(&data, image_type, target, filter))
            .await?
    }
}
