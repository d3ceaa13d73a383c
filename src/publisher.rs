//! Variant publishing
//!
//! Uploads each variant to the destination bucket under
//! `<profile>-<source key>`. Uploads run concurrently and are not
//! transactional: a failure leaves already-written variants in place.

use crate::error::from_panic;
use crate::models::Variant;
use crate::storage::{with_timeout, ObjectStore};
use crate::{Error, Result};
use futures::FutureExt;
use std::collections::BTreeMap;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublishReport {
    pub bucket: String,
    pub keys: Vec<String>,
}

impl PublishReport {
    pub fn count(&self) -> usize {
        self.keys.len()
    }
}

/// Destination key for a variant; downstream consumers rely on this layout.
pub fn variant_key(profile_name: &str, source_key: &str) -> String {
    format!("{}-{}", profile_name, source_key)
}

pub struct Publisher {
    store: Arc<dyn ObjectStore>,
    timeout: Duration,
}

impl Publisher {
    pub fn new(store: Arc<dyn ObjectStore>, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn publish(
        &self,
        destination_bucket: &str,
        source_key: &str,
        variants: &BTreeMap<String, Variant>,
    ) -> Result<PublishReport> {
        let mut tasks = JoinSet::new();

        for (profile_name, variant) in variants {
            let store = Arc::clone(&self.store);
            let bucket = destination_bucket.to_string();
            let key = variant_key(profile_name, source_key);
            let profile = profile_name.clone();
            let body = variant.bytes.clone();
            let content_type = variant.content_type.clone();
            let limit = self.timeout;

            tasks.spawn(async move {
                AssertUnwindSafe(with_timeout(
                    limit,
                    &format!("upload of {}/{}", bucket, key),
                    store.put(&bucket, &key, body, &content_type),
                ))
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| Err(from_panic(panic)))
                .map_err(|e| Error::Publish {
                    profile: profile.clone(),
                    reason: e.to_string(),
                })?;

                info!("[{}] Uploaded {}/{}", profile, bucket, key);
                Ok::<_, Error>(key)
            });
        }

        let mut keys = Vec::with_capacity(variants.len());
        while let Some(joined) = tasks.join_next().await {
            keys.push(joined??);
        }
        keys.sort();

        Ok(PublishReport {
            bucket: destination_bucket.to_string(),
            keys,
        })
    }
}
