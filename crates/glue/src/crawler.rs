//! Glue crawlers as the engine's crawl service.

use async_trait::async_trait;
use aws_sdk_glue::types::{
    CrawlerState, DeleteBehavior, LastCrawlStatus, RecrawlBehavior as GlueRecrawl, RecrawlPolicy,
    SchemaChangePolicy, UpdateBehavior,
};
use tracing::{debug, info};

use lakesync_catalog::{CrawlService, ServiceError};
use lakesync_core::{CrawlJob, JobState, LastRunStatus, RecrawlBehavior, ScanPolicy, SchemaChangeBehavior};

pub struct GlueCrawlService {
    client: aws_sdk_glue::Client,
}

impl GlueCrawlService {
    pub fn new(client: aws_sdk_glue::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl CrawlService for GlueCrawlService {
    async fn apply_policy(&self, job_id: &str, policy: ScanPolicy) -> Result<(), ServiceError> {
        let (schema_change, recrawl) = glue_policy(policy);
        debug!(job_id = %job_id, policy = %policy, "Updating crawler policy");

        self.client
            .update_crawler()
            .name(job_id)
            .schema_change_policy(schema_change)
            .recrawl_policy(recrawl)
            .send()
            .await
            .map_err(|e| {
                let not_found = e
                    .as_service_error()
                    .is_some_and(|se| se.is_entity_not_found_exception());
                sdk_error(job_id, not_found, e.to_string())
            })?;
        Ok(())
    }

    async fn start(&self, job_id: &str) -> Result<(), ServiceError> {
        self.client
            .start_crawler()
            .name(job_id)
            .send()
            .await
            .map_err(|e| {
                let service = e.as_service_error();
                if service.is_some_and(|se| se.is_crawler_running_exception()) {
                    return ServiceError::Service(format!("crawler {job_id} is already running"));
                }
                let not_found = service.is_some_and(|se| se.is_entity_not_found_exception());
                sdk_error(job_id, not_found, e.to_string())
            })?;
        info!(job_id = %job_id, "Glue crawler start requested");
        Ok(())
    }

    async fn job_status(&self, job_id: &str) -> Result<CrawlJob, ServiceError> {
        let resp = self
            .client
            .get_crawler()
            .name(job_id)
            .send()
            .await
            .map_err(|e| {
                let not_found = e
                    .as_service_error()
                    .is_some_and(|se| se.is_entity_not_found_exception());
                sdk_error(job_id, not_found, e.to_string())
            })?;

        let crawler = resp
            .crawler()
            .ok_or_else(|| ServiceError::Malformed(format!("GetCrawler returned no crawler for {job_id}")))?;
        Ok(CrawlJob {
            job_id: job_id.to_string(),
            state: job_state(crawler.state()),
            last_run_status: last_run_status(crawler.last_crawl().and_then(|c| c.status())),
        })
    }
}

fn sdk_error(job_id: &str, not_found: bool, message: String) -> ServiceError {
    if not_found {
        ServiceError::NotFound(job_id.to_string())
    } else {
        ServiceError::Service(message)
    }
}

/// Glue schema-change and recrawl policies for a scan policy.
pub fn glue_policy(policy: ScanPolicy) -> (SchemaChangePolicy, RecrawlPolicy) {
    let (update, delete) = match policy.schema_change() {
        SchemaChangeBehavior::LogOnly => (UpdateBehavior::Log, DeleteBehavior::Log),
        SchemaChangeBehavior::UpdateAndDeprecate => {
            (UpdateBehavior::UpdateInDatabase, DeleteBehavior::DeprecateInDatabase)
        }
    };
    let recrawl = match policy.recrawl() {
        RecrawlBehavior::NewFoldersOnly => GlueRecrawl::CrawlNewFoldersOnly,
        RecrawlBehavior::Everything => GlueRecrawl::CrawlEverything,
    };

    (
        SchemaChangePolicy::builder()
            .update_behavior(update)
            .delete_behavior(delete)
            .build(),
        RecrawlPolicy::builder().recrawl_behavior(recrawl).build(),
    )
}

/// STOPPING is still a live run from the engine's point of view.
pub fn job_state(state: Option<&CrawlerState>) -> JobState {
    match state {
        Some(CrawlerState::Ready) => JobState::Ready,
        Some(CrawlerState::Running) | Some(CrawlerState::Stopping) => JobState::Running,
        _ => JobState::Unknown,
    }
}

pub fn last_run_status(status: Option<&LastCrawlStatus>) -> LastRunStatus {
    match status {
        Some(LastCrawlStatus::Succeeded) => LastRunStatus::Succeeded,
        Some(LastCrawlStatus::Failed) => LastRunStatus::Failed,
        Some(LastCrawlStatus::Cancelled) => LastRunStatus::Cancelled,
        _ => LastRunStatus::Unknown,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn incremental_policy_only_logs() {
        let (schema, recrawl) = glue_policy(ScanPolicy::Incremental);
        assert_eq!(schema.update_behavior(), Some(&UpdateBehavior::Log));
        assert_eq!(schema.delete_behavior(), Some(&DeleteBehavior::Log));
        assert_eq!(recrawl.recrawl_behavior(), Some(&GlueRecrawl::CrawlNewFoldersOnly));
    }

    #[test]
    fn full_policy_updates_and_deprecates() {
        let (schema, recrawl) = glue_policy(ScanPolicy::Full);
        assert_eq!(schema.update_behavior(), Some(&UpdateBehavior::UpdateInDatabase));
        assert_eq!(schema.delete_behavior(), Some(&DeleteBehavior::DeprecateInDatabase));
        assert_eq!(recrawl.recrawl_behavior(), Some(&GlueRecrawl::CrawlEverything));
    }

    #[test]
    fn crawler_state_mapping() {
        assert_eq!(job_state(Some(&CrawlerState::Ready)), JobState::Ready);
        assert_eq!(job_state(Some(&CrawlerState::Running)), JobState::Running);
        assert_eq!(job_state(Some(&CrawlerState::Stopping)), JobState::Running);
        assert_eq!(job_state(None), JobState::Unknown);
        assert_eq!(job_state(Some(&CrawlerState::from("PAUSED"))), JobState::Unknown);
    }

    #[test]
    fn last_crawl_mapping() {
        assert_eq!(last_run_status(Some(&LastCrawlStatus::Succeeded)), LastRunStatus::Succeeded);
        assert_eq!(last_run_status(Some(&LastCrawlStatus::Failed)), LastRunStatus::Failed);
        assert_eq!(last_run_status(Some(&LastCrawlStatus::Cancelled)), LastRunStatus::Cancelled);
        assert_eq!(last_run_status(None), LastRunStatus::Unknown);
    }

    #[test]
    fn not_found_flag_selects_error_kind() {
        assert!(sdk_error("crawler-users", true, "EntityNotFoundException".into()).is_not_found());
        assert!(matches!(
            sdk_error("crawler-users", false, "ThrottlingException".into()),
            ServiceError::Service(ref m) if m.contains("Throttling")
        ));
    }
}
