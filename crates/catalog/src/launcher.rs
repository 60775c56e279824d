use std::sync::Arc;

use lakesync_core::{ParameterNames, ScanPolicy, TableName};
use tracing::{error, info};

use crate::error::CatalogError;
use crate::traits::{CrawlService, ParameterStore};

/// Applies a scan policy to a table's crawl job and starts it.
pub struct CrawlJobLauncher {
    params: Arc<dyn ParameterStore>,
    crawler: Arc<dyn CrawlService>,
    names: ParameterNames,
}

impl CrawlJobLauncher {
    pub fn new(
        params: Arc<dyn ParameterStore>,
        crawler: Arc<dyn CrawlService>,
        names: ParameterNames,
    ) -> Self {
        Self {
            params,
            crawler,
            names,
        }
    }

    /// Look up the crawl job registered for `table`.
    ///
    /// A missing (or blank) mapping is a configuration error and is never retried.
    pub async fn resolve_job_id(&self, table: &TableName) -> Result<String, CatalogError> {
        let parameter = self.names.crawler(table.as_str());
        match self.params.get(&parameter).await {
            Ok(value) if !value.trim().is_empty() => Ok(value.trim().to_string()),
            Ok(_) => Err(CatalogError::JobNotMapped {
                table: table.to_string(),
                parameter,
            }),
            Err(e) if e.is_not_found() => {
                error!(table = %table, parameter = %parameter, "No crawl job mapped for table");
                Err(CatalogError::JobNotMapped {
                    table: table.to_string(),
                    parameter,
                })
            }
            Err(e) => Err(CatalogError::service(format!("lookup {parameter}"), e)),
        }
    }

    /// Resolve, configure and start the table's crawl job. Returns its id
    /// without waiting for the run to finish.
    pub async fn launch(&self, table: &TableName, policy: ScanPolicy) -> Result<String, CatalogError> {
        let job_id = self.resolve_job_id(table).await?;
        self.start_job(table, &job_id, policy).await?;
        Ok(job_id)
    }

    /// Configure and start an already resolved crawl job.
    pub async fn start_job(
        &self,
        table: &TableName,
        job_id: &str,
        policy: ScanPolicy,
    ) -> Result<(), CatalogError> {
        self.crawler
            .apply_policy(job_id, policy)
            .await
            .map_err(|e| self.classify(table, job_id, "update policy of", e))?;
        info!(
            table = %table,
            job_id = %job_id,
            policy = %policy,
            schema_change = ?policy.schema_change(),
            recrawl = ?policy.recrawl(),
            "Crawl policy applied"
        );

        self.crawler
            .start(job_id)
            .await
            .map_err(|e| self.classify(table, job_id, "start", e))?;
        info!(table = %table, job_id = %job_id, "Crawl job started");

        Ok(())
    }

    fn classify(
        &self,
        table: &TableName,
        job_id: &str,
        action: &str,
        err: crate::error::ServiceError,
    ) -> CatalogError {
        if err.is_not_found() {
            error!(table = %table, job_id = %job_id, "Crawl job does not exist");
            CatalogError::JobNotRegistered {
                table: table.to_string(),
                job_id: job_id.to_string(),
            }
        } else {
            error!(table = %table, job_id = %job_id, error = %err, "Failed to {action} crawl job");
            CatalogError::service(format!("{action} {job_id}"), err)
        }
    }
}
