//! Object-store adapters for the catalog engine: partition schemas and the
//! reference-date record, on S3 or a local directory tree.

pub mod backend;
pub mod error;
pub mod reference;
pub mod snapshot;

pub use backend::{LocalBackend, ObjectBackend, S3Backend};
pub use error::StorageError;
pub use reference::CsvReferenceDate;
pub use snapshot::ObjectSnapshotStore;
