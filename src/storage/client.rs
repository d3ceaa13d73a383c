use super::{ObjectStore, StoredObject};
use crate::image::content_type_or_sniffed;
use crate::{Error, Result};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client as S3Client;
use bytes::Bytes;
use tracing::debug;

/// [`ObjectStore`] backed by the AWS S3 SDK.
pub struct S3Store {
    client: S3Client,
}

impl S3Store {
    /// Load credentials and region from the default AWS provider chain.
    ///
    /// A custom `endpoint_url` switches to path-style addressing so
    /// S3-compatible stores (MinIO, LocalStack) work.
    pub async fn new(endpoint_url: Option<String>) -> Result<Self> {
        let shared_config = aws_config::defaults(BehaviorVersion::latest()).load().await;

        let mut builder = aws_sdk_s3::config::Builder::from(&shared_config);
        if let Some(endpoint_url) = endpoint_url {
            builder = builder.endpoint_url(endpoint_url).force_path_style(true);
        }

        Ok(Self::from_client(S3Client::from_conf(builder.build())))
    }

    pub fn from_client(client: S3Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn get(&self, bucket: &str, key: &str) -> Result<StoredObject> {
        let response = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if matches!(e.as_service_error(), Some(se) if se.is_no_such_key()) {
                    Error::NotFound {
                        bucket: bucket.to_string(),
                        key: key.to_string(),
                    }
                } else {
                    Error::Storage(format!("Failed to read object: {}", e))
                }
            })?;

        let declared = response.content_type().map(str::to_string);

        let body = response
            .body
            .collect()
            .await
            .map_err(|e| Error::Storage(format!("Failed to read body: {}", e)))?
            .into_bytes();

        let content_type = content_type_or_sniffed(declared.as_deref(), &body);

        debug!(bucket, key, size = body.len(), %content_type, "Downloaded object");

        Ok(StoredObject { body, content_type })
    }

    async fn put(&self, bucket: &str, key: &str, body: Bytes, content_type: &str) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| Error::Storage(format!("Failed to upload object: {}", e)))?;

        Ok(())
    }
}
