//! Object storage backend configuration.

use std::sync::Arc;

use common::error::{BlobError, Result};
use futures::TryStreamExt;
use object_store::aws::AmazonS3Builder;
use object_store::memory::InMemory;
use object_store::path::Path as ObjectPath;
use object_store::ObjectStore;
use serde::{Deserialize, Serialize};
use url::Url;

/// Configuration for the object storage backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ObjectStoreSettings {
    /// In-memory storage (for testing)
    #[default]
    Memory,

    /// S3-compatible storage (AWS S3, MinIO, etc.)
    S3 {
        /// S3 endpoint URL (e.g., "http://localhost:9000" for MinIO)
        endpoint: String,
        /// Access key ID
        access_key: String,
        /// Secret access key
        secret_key: String,
        /// Bucket name
        bucket: String,
        /// Optional region (defaults to "us-east-1")
        region: Option<String>,
    },
}

impl ObjectStoreSettings {
    /// Check required fields without touching the network.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Memory => Ok(()),
            Self::S3 {
                endpoint,
                access_key,
                secret_key,
                bucket,
                ..
            } => {
                for (name, value) in [
                    ("endpoint", endpoint),
                    ("access_key", access_key),
                    ("secret_key", secret_key),
                    ("bucket", bucket),
                ] {
                    if value.trim().is_empty() {
                        return Err(BlobError::invalid(format!("S3 {} must not be empty", name)));
                    }
                }
                let url = Url::parse(endpoint)
                    .map_err(|e| BlobError::invalid(format!("invalid S3 endpoint {}: {}", endpoint, e)))?;
                if url.host_str().is_none() {
                    return Err(BlobError::invalid(format!("S3 endpoint {} has no host", endpoint)));
                }
                Ok(())
            }
        }
    }

    /// Build the underlying store. For S3 the bucket must already exist.
    pub(crate) async fn connect(&self) -> Result<Arc<dyn ObjectStore>> {
        self.validate()?;
        match self {
            Self::Memory => Ok(Arc::new(InMemory::new())),

            Self::S3 {
                endpoint,
                access_key,
                secret_key,
                bucket,
                region,
            } => {
                let store: Arc<dyn ObjectStore> = Arc::new(
                    AmazonS3Builder::new()
                        .with_endpoint(endpoint)
                        .with_access_key_id(access_key)
                        .with_secret_access_key(secret_key)
                        .with_bucket_name(bucket)
                        .with_region(region.as_deref().unwrap_or("us-east-1"))
                        .with_allow_http(endpoint.starts_with("http://"))
                        .build()
                        .map_err(|e| BlobError::invalid(e.to_string()))?,
                );

                check_bucket(store.as_ref(), bucket).await?;
                Ok(store)
            }
        }
    }

    /// Base of the locators produced by `generate_url`.
    pub(crate) fn url_base(&self) -> String {
        match self {
            Self::Memory => "memory://".to_string(),
            Self::S3 {
                endpoint, bucket, ..
            } => format!("{}/{}", endpoint.trim_end_matches('/'), bucket),
        }
    }
}

/// One listing request against the bucket root. A missing bucket is
/// `NotFound`; any other failure keeps its source as a backend error.
async fn check_bucket(store: &dyn ObjectStore, bucket: &str) -> Result<()> {
    let root = ObjectPath::default();
    let mut listing = store.list(Some(&root));
    match listing.try_next().await {
        Ok(_) => Ok(()),
        Err(object_store::Error::NotFound { .. }) => Err(missing_bucket(bucket)),
        // S3 reports an unknown bucket as a generic request error.
        Err(e) if e.to_string().contains("NoSuchBucket") => Err(missing_bucket(bucket)),
        Err(e) => Err(BlobError::backend(e)),
    }
}

fn missing_bucket(bucket: &str) -> BlobError {
    BlobError::NotFound(format!("bucket {}", bucket))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s3(endpoint: &str, bucket: &str) -> ObjectStoreSettings {
        ObjectStoreSettings::S3 {
            endpoint: endpoint.to_string(),
            access_key: "minioadmin".to_string(),
            secret_key: "minioadmin".to_string(),
            bucket: bucket.to_string(),
            region: None,
        }
    }

    #[test]
    fn test_validate() {
        assert!(ObjectStoreSettings::Memory.validate().is_ok());
        assert!(s3("http://localhost:9000", "blobs").validate().is_ok());
        assert!(matches!(
            s3("http://localhost:9000", " ").validate(),
            Err(BlobError::InvalidArgument(_))
        ));
        assert!(matches!(
            s3("not a url", "blobs").validate(),
            Err(BlobError::InvalidArgument(_))
        ));
    }

    #[test]
    fn test_deserialize_tagged() {
        let settings: ObjectStoreSettings = toml::from_str(
            r#"
            type = "s3"
            endpoint = "http://localhost:9000"
            access_key = "a"
            secret_key = "b"
            bucket = "c"
            "#,
        )
        .unwrap();
        assert_eq!(settings.url_base(), "http://localhost:9000/c");
    }

    #[tokio::test]
    async fn test_check_reachable_store() {
        let store = InMemory::new();
        assert!(check_bucket(&store, "blobs").await.is_ok());
        assert!(missing_bucket("blobs").is_not_found());
    }
}
