//! Seams to the external services the engine drives.
//!
//! Every collaborator is passed in as an `Arc<dyn Trait>` so tests can swap
//! in fakes; the AWS and object-store adapters live in their own crates.

use async_trait::async_trait;
use lakesync_core::{CrawlJob, Day, ScanPolicy};

use crate::error::ServiceError;
use crate::snapshot::ObjectLocation;

/// Reads the schema of one partition object.
#[async_trait]
pub trait SnapshotStore: Send + Sync {
    /// Top-level column names of the object, in schema order.
    ///
    /// Must return [`ServiceError::NotFound`] when the object does not exist.
    async fn read_columns(&self, location: &ObjectLocation) -> Result<Vec<String>, ServiceError>;
}

/// External crawl service (e.g. Glue crawlers).
#[async_trait]
pub trait CrawlService: Send + Sync {
    /// Idempotently set the schema-change and recrawl behavior of a job.
    async fn apply_policy(&self, job_id: &str, policy: ScanPolicy) -> Result<(), ServiceError>;

    /// Trigger a run. Does not wait for it.
    async fn start(&self, job_id: &str) -> Result<(), ServiceError>;

    async fn job_status(&self, job_id: &str) -> Result<CrawlJob, ServiceError>;
}

/// Configuration-backed key/value lookup.
#[async_trait]
pub trait ParameterStore: Send + Sync {
    async fn get(&self, name: &str) -> Result<String, ServiceError>;
}

/// Read-only access to the shared "current processing day" record.
#[async_trait]
pub trait ReferenceDateSource: Send + Sync {
    async fn reference_day(&self, location: &ObjectLocation) -> Result<Day, ServiceError>;
}
