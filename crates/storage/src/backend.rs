use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use object_store::aws::AmazonS3Builder;
use object_store::local::LocalFileSystem;
use object_store::ObjectStore;
use tracing::{debug, info};

use lakesync_catalog::{ObjectLocation, ServiceError};
use lakesync_core::AwsConfig;

use crate::error::StorageError;

/// Object store access across buckets.
///
/// The engine addresses objects by bucket and key, and the bucket is only
/// known after context resolution, so stores are resolved per location.
pub enum ObjectBackend {
    Local(LocalBackend),
    S3(S3Backend),
}

impl ObjectBackend {
    /// S3 when `local_root` is `None`, otherwise a directory tree where each
    /// bucket is a sub-directory.
    pub fn from_config(aws: &AwsConfig, local_root: Option<&Path>) -> Result<Self, StorageError> {
        match local_root {
            Some(root) => Ok(ObjectBackend::Local(LocalBackend::new(root)?)),
            None => Ok(ObjectBackend::S3(S3Backend::new(aws))),
        }
    }

    pub fn is_remote(&self) -> bool {
        matches!(self, ObjectBackend::S3(_))
    }

    /// The store holding `location` and the object's path inside it.
    pub fn resolve(
        &self,
        location: &ObjectLocation,
    ) -> Result<(Arc<dyn ObjectStore>, object_store::path::Path), StorageError> {
        match self {
            ObjectBackend::Local(b) => Ok((
                b.store.clone(),
                object_store::path::Path::from(format!("{}/{}", location.bucket, location.key)),
            )),
            ObjectBackend::S3(b) => Ok((
                b.store(&location.bucket)?,
                object_store::path::Path::from(location.key.as_str()),
            )),
        }
    }

    /// Fetch a whole object. A missing object is [`ServiceError::NotFound`].
    pub async fn fetch(&self, location: &ObjectLocation) -> Result<Bytes, ServiceError> {
        let (store, path) = self.locate(location)?;

        debug!(location = %location, "Fetching object");
        let result = store
            .get(&path)
            .await
            .map_err(|e| map_store_error(location, e))?;
        result.bytes().await.map_err(|e| map_store_error(location, e))
    }

    /// Object size in bytes. A missing object is [`ServiceError::NotFound`].
    pub async fn size(&self, location: &ObjectLocation) -> Result<usize, ServiceError> {
        let (store, path) = self.locate(location)?;
        let meta = store
            .head(&path)
            .await
            .map_err(|e| map_store_error(location, e))?;
        Ok(meta.size)
    }

    /// Fetch `range` of an object.
    pub async fn fetch_range(
        &self,
        location: &ObjectLocation,
        range: Range<usize>,
    ) -> Result<Bytes, ServiceError> {
        let (store, path) = self.locate(location)?;

        debug!(location = %location, start = range.start, end = range.end, "Fetching object range");
        store
            .get_range(&path, range)
            .await
            .map_err(|e| map_store_error(location, e))
    }

    fn locate(
        &self,
        location: &ObjectLocation,
    ) -> Result<(Arc<dyn ObjectStore>, object_store::path::Path), ServiceError> {
        self.resolve(location)
            .map_err(|e| ServiceError::Service(e.to_string()))
    }
}

fn map_store_error(location: &ObjectLocation, err: object_store::Error) -> ServiceError {
    match err {
        object_store::Error::NotFound { .. } => ServiceError::NotFound(location.to_string()),
        other => ServiceError::Service(format!("{location}: {other}")),
    }
}

/// Local filesystem backend.
pub struct LocalBackend {
    pub store: Arc<dyn ObjectStore>,
    pub root: PathBuf,
}

impl LocalBackend {
    pub fn new(root: &Path) -> Result<Self, StorageError> {
        std::fs::create_dir_all(root)?;
        let canonical = std::fs::canonicalize(root)?;
        let store = LocalFileSystem::new_with_prefix(&canonical)?;
        info!("Storage: local backend at {}", canonical.display());
        Ok(Self {
            store: Arc::new(store),
            root: canonical,
        })
    }
}

/// S3 backend with one client per bucket, built on first use.
pub struct S3Backend {
    aws: AwsConfig,
    stores: Mutex<HashMap<String, Arc<dyn ObjectStore>>>,
}

impl S3Backend {
    pub fn new(aws: &AwsConfig) -> Self {
        Self {
            aws: aws.clone(),
            stores: Mutex::new(HashMap::new()),
        }
    }

    pub fn store(&self, bucket: &str) -> Result<Arc<dyn ObjectStore>, StorageError> {
        if bucket.is_empty() {
            return Err(StorageError::NotConfigured("bucket name is empty".into()));
        }

        let mut stores = self
            .stores
            .lock()
            .map_err(|_| StorageError::NotConfigured("S3 store cache poisoned".into()))?;
        if let Some(store) = stores.get(bucket) {
            return Ok(store.clone());
        }

        let store: Arc<dyn ObjectStore> = Arc::new(self.build(bucket)?);
        stores.insert(bucket.to_string(), store.clone());
        Ok(store)
    }

    fn build(&self, bucket: &str) -> Result<object_store::aws::AmazonS3, StorageError> {
        let aws = &self.aws;
        let mut builder = AmazonS3Builder::new().with_region(&aws.region);

        if let Some(ref key) = aws.access_key_id {
            builder = builder.with_access_key_id(key);
        }
        if let Some(ref secret) = aws.secret_access_key {
            builder = builder.with_secret_access_key(secret);
        }
        if let Some(ref token) = aws.session_token {
            builder = builder.with_token(token);
        }

        match aws.endpoint_url.as_deref().filter(|e| !e.is_empty()) {
            Some(endpoint) => {
                // object_store requires an absolute URL
                let endpoint_url = if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
                    endpoint.to_string()
                } else {
                    format!("https://{endpoint}")
                };
                builder = builder
                    .with_bucket_name(bucket)
                    .with_endpoint(&endpoint_url)
                    .with_allow_http(endpoint_url.starts_with("http://"));
            }
            None => {
                builder = builder.with_url(format!("s3://{bucket}"));
            }
        }

        let store = builder.build()?;
        info!("Storage: S3 backend s3://{} (region: {})", bucket, aws.region);
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn local_backend_maps_bucket_to_directory() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("lake/a")).unwrap();
        std::fs::write(tmp.path().join("lake/a/b.txt"), b"hello").unwrap();

        let backend = ObjectBackend::from_config(&AwsConfig::default(), Some(tmp.path())).unwrap();
        assert!(!backend.is_remote());

        let bytes = backend.fetch(&ObjectLocation::new("lake", "a/b.txt")).await.unwrap();
        assert_eq!(&bytes[..], b"hello");
    }

    #[tokio::test]
    async fn missing_object_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = ObjectBackend::from_config(&AwsConfig::default(), Some(tmp.path())).unwrap();

        let err = backend
            .fetch(&ObjectLocation::new("lake", "nope/missing.parquet"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn size_and_range_reads() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("lake/a")).unwrap();
        std::fs::write(tmp.path().join("lake/a/b.txt"), b"hello world").unwrap();

        let backend = ObjectBackend::from_config(&AwsConfig::default(), Some(tmp.path())).unwrap();
        let location = ObjectLocation::new("lake", "a/b.txt");
        assert_eq!(backend.size(&location).await.unwrap(), 11);

        let tail = backend.fetch_range(&location, 6..11).await.unwrap();
        assert_eq!(&tail[..], b"world");
    }

    #[tokio::test]
    async fn size_of_missing_object_is_not_found() {
        let tmp = tempfile::tempdir().unwrap();
        let backend = ObjectBackend::from_config(&AwsConfig::default(), Some(tmp.path())).unwrap();

        let err = backend
            .size(&ObjectLocation::new("lake", "nope/missing.parquet"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn s3_stores_are_cached_per_bucket() {
        let aws = AwsConfig {
            endpoint_url: Some("http://localhost:4566".into()),
            ..AwsConfig::default()
        };
        let backend = S3Backend::new(&aws);

        let a = backend.store("lake").unwrap();
        let again = backend.store("lake").unwrap();
        let b = backend.store("other").unwrap();
        assert!(Arc::ptr_eq(&a, &again));
        assert!(!Arc::ptr_eq(&a, &b));
        assert!(backend.store("").is_err());
    }
}
