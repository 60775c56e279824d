use thiserror::Error;

/// Failures while constructing a storage backend.
///
/// Read failures on an existing backend are reported through
/// [`lakesync_catalog::ServiceError`] instead.
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("object store error: {0}")]
    ObjectStore(#[from] object_store::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not configured: {0}")]
    NotConfigured(String),
}
