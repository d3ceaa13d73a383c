//! Variant generation
//!
//! Produces one resized encoding per size profile. Every profile is resized
//! on its own task; the first failure aborts the whole set.

use crate::error::from_panic;
use crate::image::ImageService;
use crate::models::{Dimensions, ImageType, SizeProfile, SourceImage, Variant};
use crate::{Error, Result};
use bytes::Bytes;
use futures::FutureExt;
use std::collections::{BTreeMap, HashSet};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{debug, info, warn};

/// Scale `source` uniformly so it fits inside the profile's bounding box.
///
/// The scale factor is `min(max_width / width, max_height / height)`. With
/// `allow_upscale` it may exceed 1, so sources smaller than the box are
/// enlarged until one side touches the bound. Results are rounded half away
/// from zero and never drop below 1px.
pub fn fit_within(source: Dimensions, profile: &SizeProfile, allow_upscale: bool) -> Dimensions {
    let width = f64::from(source.width);
    let height = f64::from(source.height);

    let scale = f64::min(
        f64::from(profile.max_width) / width,
        f64::from(profile.max_height) / height,
    );
    let scale = if allow_upscale { scale } else { scale.min(1.0) };

    Dimensions::new(scale_side(width, scale), scale_side(height, scale))
}

fn scale_side(side: f64, scale: f64) -> u32 {
    ((side * scale).round() as u32).max(1)
}

pub struct VariantGenerator {
    image: Arc<dyn ImageService>,
    allow_upscale: bool,
}

impl VariantGenerator {
    pub fn new(image: Arc<dyn ImageService>) -> Self {
        Self {
            image,
            allow_upscale: true,
        }
    }

    pub fn with_upscale(mut self, allow_upscale: bool) -> Self {
        self.allow_upscale = allow_upscale;
        self
    }

    /// Inspect the source once, then resize it for every profile.
    pub async fn generate(
        &self,
        bytes: Bytes,
        content_type: &str,
        image_type: ImageType,
        profiles: &[SizeProfile],
    ) -> Result<BTreeMap<String, Variant>> {
        let dimensions = self.image.inspect_size(bytes.clone()).await?;
        if dimensions.width == 0 || dimensions.height == 0 {
            return Err(Error::Inspect(format!(
                "source has empty dimensions {}x{}",
                dimensions.width, dimensions.height
            )));
        }

        let source = SourceImage {
            bytes,
            content_type: content_type.to_string(),
            dimensions,
        };
        self.generate_from_source(&source, image_type, profiles).await
    }

    pub async fn generate_from_source(
        &self,
        source: &SourceImage,
        image_type: ImageType,
        profiles: &[SizeProfile],
    ) -> Result<BTreeMap<String, Variant>> {
        ensure_unique_names(profiles)?;

        let mut tasks = JoinSet::new();
        for profile in profiles.iter().cloned() {
            let target = fit_within(source.dimensions, &profile, self.allow_upscale);
            if target.width > source.dimensions.width || target.height > source.dimensions.height {
                warn!(
                    "[{}] Upscaling {}x{} source to {}x{}",
                    profile.name,
                    source.dimensions.width,
                    source.dimensions.height,
                    target.width,
                    target.height
                );
            }

            let image = Arc::clone(&self.image);
            let data = source.bytes.clone();
            let content_type = source.content_type.clone();

            tasks.spawn(async move {
                debug!(
                    "[{}] Resizing to {}x{}",
                    profile.name, target.width, target.height
                );
                let bytes = AssertUnwindSafe(image.resize(data, image_type, target))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| Err(from_panic(panic)))
                    .map_err(|e| Error::Transform {
                        profile: profile.name.clone(),
                        reason: e.to_string(),
                    })?;

                Ok::<_, Error>(Variant {
                    profile_name: profile.name,
                    bytes,
                    content_type,
                    dimensions: target,
                })
            });
        }

        // Returning early drops the set, which aborts the remaining siblings.
        let mut variants = BTreeMap::new();
        while let Some(joined) = tasks.join_next().await {
            let variant = joined??;
            info!(
                "[{}] Generated variant {}x{} ({} bytes)",
                variant.profile_name,
                variant.dimensions.width,
                variant.dimensions.height,
                variant.bytes.len()
            );
            variants.insert(variant.profile_name.clone(), variant);
        }

        Ok(variants)
    }
}

fn ensure_unique_names(profiles: &[SizeProfile]) -> Result<()> {
    let mut seen = HashSet::new();
    for profile in profiles {
        if !seen.insert(profile.name.as_str()) {
            return Err(Error::Configuration(format!(
                "Duplicate size profile '{}'",
                profile.name
            )));
        }
    }
    Ok(())
}
