use thiserror::Error;

/// Failure reported by an external collaborator (object store, crawl
/// service, parameter store).
///
/// `NotFound` is the stable "does not exist" signal. `Malformed` covers
/// responses or objects that cannot be decoded; every other failure is
/// folded into `Service`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ServiceError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("malformed response: {0}")]
    Malformed(String),

    #[error("service error: {0}")]
    Service(String),
}

impl ServiceError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ServiceError::NotFound(_))
    }
}

/// Errors produced by the maintenance engine.
#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("invalid invocation: {0}")]
    InvalidInvocation(String),

    #[error("no crawl job registered for table {table} (parameter {parameter})")]
    JobNotMapped { table: String, parameter: String },

    #[error("crawl job {job_id} for table {table} does not exist in the crawl service")]
    JobNotRegistered { table: String, job_id: String },

    #[error("parameter {0} not found")]
    ParameterMissing(String),

    #[error("reference date unavailable: {0}")]
    ReferenceDate(String),

    #[error("no tables configured for group {0}")]
    NoTables(String),

    #[error("snapshot read failed for {table} on {day}: {source}")]
    SnapshotRead {
        table: String,
        day: String,
        #[source]
        source: ServiceError,
    },

    #[error("{context}: {source}")]
    Service {
        context: String,
        #[source]
        source: ServiceError,
    },
}

impl CatalogError {
    /// Systemic misconfiguration: aborts the run instead of being isolated
    /// to one table.
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            CatalogError::InvalidInvocation(_)
                | CatalogError::JobNotMapped { .. }
                | CatalogError::JobNotRegistered { .. }
                | CatalogError::ParameterMissing(_)
                | CatalogError::ReferenceDate(_)
                | CatalogError::NoTables(_)
        )
    }

    pub(crate) fn service(context: impl Into<String>, source: ServiceError) -> Self {
        CatalogError::Service {
            context: context.into(),
            source,
        }
    }
}
