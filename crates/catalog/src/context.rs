//! Run context: which tables, where their partitions live, and which day is
//! "today".

use std::sync::Arc;

use async_trait::async_trait;
use lakesync_core::{Day, ParameterNames, TableName};
use tracing::info;

use crate::error::{CatalogError, ServiceError};
use crate::snapshot::ObjectLocation;
use crate::traits::{ParameterStore, ReferenceDateSource};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunContext {
    pub group: String,
    pub bucket: String,
    /// Key prefix under which `<table>/date=<day>/...` partitions live.
    pub snapshot_root: String,
    /// Configured table set, in configured order. May be empty.
    pub tables: Vec<TableName>,
    pub reference_day: Day,
}

#[async_trait]
pub trait ContextSource: Send + Sync {
    async fn resolve(&self) -> Result<RunContext, CatalogError>;
}

/// Resolves the context from the parameter store and the reference-date record.
pub struct ParameterContext {
    group: String,
    names: ParameterNames,
    reference_key: String,
    params: Arc<dyn ParameterStore>,
    dates: Arc<dyn ReferenceDateSource>,
}

impl ParameterContext {
    pub fn new(
        group: impl Into<String>,
        names: ParameterNames,
        reference_key: impl Into<String>,
        params: Arc<dyn ParameterStore>,
        dates: Arc<dyn ReferenceDateSource>,
    ) -> Self {
        Self {
            group: group.into(),
            names,
            reference_key: reference_key.into(),
            params,
            dates,
        }
    }

    async fn required(&self, name: &str) -> Result<String, CatalogError> {
        match self.params.get(name).await {
            Ok(v) => Ok(v.trim().to_string()),
            Err(ServiceError::NotFound(_)) => Err(CatalogError::ParameterMissing(name.to_string())),
            Err(e) => Err(CatalogError::service(format!("lookup {name}"), e)),
        }
    }
}

#[async_trait]
impl ContextSource for ParameterContext {
    async fn resolve(&self) -> Result<RunContext, CatalogError> {
        let table_list = self.required(&self.names.table_list(&self.group)).await?;
        let bucket = self.required(&self.names.bucket()).await?;
        let conversion_key = self.required(&self.names.conversion_key()).await?;
        if bucket.is_empty() {
            return Err(CatalogError::ParameterMissing(self.names.bucket()));
        }

        let reference = ObjectLocation::new(bucket.clone(), self.reference_key.clone());
        let reference_day = self
            .dates
            .reference_day(&reference)
            .await
            .map_err(|e| CatalogError::ReferenceDate(format!("{reference}: {e}")))?;

        let ctx = RunContext {
            snapshot_root: format!("{}/{}", self.group, conversion_key),
            group: self.group.clone(),
            bucket,
            tables: TableName::parse_list(&table_list),
            reference_day,
        };
        info!(
            group = %ctx.group,
            bucket = %ctx.bucket,
            root = %ctx.snapshot_root,
            tables = ctx.tables.len(),
            reference_day = %ctx.reference_day,
            "Run context resolved"
        );
        Ok(ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{FakeParams, FixedDay};

    fn params() -> Arc<FakeParams> {
        let p = Arc::new(FakeParams::default());
        p.set("/t/common/hr/targettable", "users, groups");
        p.set("/t/common/s3bucket", "lake");
        p.set("/t/common/pipelineconv", "convert");
        p
    }

    fn source(params: Arc<FakeParams>, day: Option<Day>) -> ParameterContext {
        ParameterContext::new(
            "hr",
            ParameterNames::new("/t"),
            "basedatetime/basedatetime.csv",
            params,
            Arc::new(FixedDay::new(day)),
        )
    }

    #[tokio::test]
    async fn resolves_all_parts() {
        let day = Day::parse_canonical("20250121").unwrap();
        let ctx = source(params(), Some(day)).resolve().await.unwrap();

        assert_eq!(ctx.bucket, "lake");
        assert_eq!(ctx.snapshot_root, "hr/convert");
        assert_eq!(ctx.tables, vec![TableName::new("users"), TableName::new("groups")]);
        assert_eq!(ctx.reference_day, day);
    }

    #[tokio::test]
    async fn missing_parameter_is_configuration_error() {
        let p = Arc::new(FakeParams::default());
        p.set("/t/common/hr/targettable", "users");
        let err = source(p, Day::parse_canonical("20250121").ok()).resolve().await.unwrap_err();
        assert!(matches!(err, CatalogError::ParameterMissing(ref name) if name == "/t/common/s3bucket"));
        assert!(err.is_configuration());
    }

    #[tokio::test]
    async fn unreadable_reference_date_is_configuration_error() {
        let err = source(params(), None).resolve().await.unwrap_err();
        assert!(matches!(err, CatalogError::ReferenceDate(_)));
        assert!(err.is_configuration());
    }
}
