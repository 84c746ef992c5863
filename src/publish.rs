//! Upload of the generated JSON document to the destination bucket.

use crate::errors::{HycomError, Result};
use bytes::Bytes;
use object_store::{aws::AmazonS3Builder, path::Path as ObjectPath, ObjectStore};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, instrument, warn};

/// Object store client bound to one bucket.
pub struct Publisher {
    store: Arc<dyn ObjectStore>,
    bucket: String,
}

impl Publisher {
    /// Wrap an already configured store.
    pub fn new(store: Arc<dyn ObjectStore>, bucket: impl Into<String>) -> Self {
        Self {
            store,
            bucket: bucket.into(),
        }
    }

    /// S3 client for `bucket`, credentials and region taken from the
    /// standard `AWS_*` environment variables.
    pub fn s3(bucket: &str) -> Result<Self> {
        let store = AmazonS3Builder::from_env()
            .with_bucket_name(bucket)
            .build()
            .map_err(|e| {
                HycomError::ConfigError(format!("Failed to create S3 client for '{}': {}", bucket, e))
            })?;
        Ok(Self::new(Arc::new(store), bucket))
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Upload `local_path` as `object_key`, then remove the local copy.
    ///
    /// Store errors are returned untouched; the local file is only removed
    /// after the upload succeeded.
    #[instrument(skip(self), fields(bucket = %self.bucket, key = %object_key))]
    pub async fn publish(&self, local_path: &Path, object_key: &str) -> Result<()> {
        let data = Bytes::from(tokio::fs::read(local_path).await?);
        debug!(size = data.len(), "Uploading object");

        self.store
            .put(&ObjectPath::from(object_key), data.into())
            .await?;
        info!("Uploaded JSON file");

        if let Err(e) = tokio::fs::remove_file(local_path).await {
            warn!(error = %e, path = %local_path.display(), "Could not remove uploaded JSON file");
        }
        Ok(())
    }
}
