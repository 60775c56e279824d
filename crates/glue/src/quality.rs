//! Glue data-quality ruleset evaluation runs, awaited with the same poller
//! as crawl jobs.

use std::fmt;

use async_trait::async_trait;
use aws_sdk_glue::types::TaskStatusType;
use serde::Serialize;
use tracing::info;

use lakesync_catalog::{wait_all, PollOutcome, PollSettings, Progress, ServiceError, StatusProbe};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunState {
    Starting,
    Running,
    Stopping,
    Stopped,
    Succeeded,
    Failed,
    Timeout,
    NotFound,
    Error,
    Unknown,
}

impl RunState {
    pub fn progress(self) -> Progress {
        match self {
            RunState::Succeeded => Progress::Succeeded,
            RunState::Stopped
            | RunState::Failed
            | RunState::Timeout
            | RunState::NotFound
            | RunState::Error => Progress::Failed,
            RunState::Starting | RunState::Running | RunState::Stopping | RunState::Unknown => {
                Progress::Pending
            }
        }
    }
}

impl From<Option<&TaskStatusType>> for RunState {
    fn from(status: Option<&TaskStatusType>) -> Self {
        match status {
            Some(TaskStatusType::Starting) => RunState::Starting,
            Some(TaskStatusType::Running) => RunState::Running,
            Some(TaskStatusType::Stopping) => RunState::Stopping,
            Some(TaskStatusType::Stopped) => RunState::Stopped,
            Some(TaskStatusType::Succeeded) => RunState::Succeeded,
            Some(TaskStatusType::Failed) => RunState::Failed,
            Some(TaskStatusType::Timeout) => RunState::Timeout,
            _ => RunState::Unknown,
        }
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Starting => "STARTING",
            RunState::Running => "RUNNING",
            RunState::Stopping => "STOPPING",
            RunState::Stopped => "STOPPED",
            RunState::Succeeded => "SUCCEEDED",
            RunState::Failed => "FAILED",
            RunState::Timeout => "TIMEOUT",
            RunState::NotFound => "NOT_FOUND",
            RunState::Error => "ERROR",
            RunState::Unknown => "UNKNOWN",
        };
        f.pad(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DataQualityRun {
    pub run_id: String,
    pub state: RunState,
}

pub struct GlueDataQualityRuns {
    client: aws_sdk_glue::Client,
}

impl GlueDataQualityRuns {
    pub fn new(client: aws_sdk_glue::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl StatusProbe for GlueDataQualityRuns {
    type Status = DataQualityRun;

    fn initial(&self, id: &str) -> DataQualityRun {
        DataQualityRun {
            run_id: id.to_string(),
            state: RunState::Unknown,
        }
    }

    async fn fetch(&self, id: &str) -> Result<DataQualityRun, ServiceError> {
        let resp = self
            .client
            .get_data_quality_ruleset_evaluation_run()
            .run_id(id)
            .send()
            .await
            .map_err(|e| {
                if e.as_service_error().is_some_and(|se| se.is_entity_not_found_exception()) {
                    ServiceError::NotFound(id.to_string())
                } else {
                    ServiceError::Service(e.to_string())
                }
            })?;

        Ok(DataQualityRun {
            run_id: id.to_string(),
            state: RunState::from(resp.status()),
        })
    }

    fn on_error(&self, id: &str, error: &ServiceError) -> DataQualityRun {
        DataQualityRun {
            run_id: id.to_string(),
            state: if error.is_not_found() {
                RunState::NotFound
            } else {
                RunState::Error
            },
        }
    }

    fn progress(&self, run: &DataQualityRun) -> Progress {
        run.state.progress()
    }
}

/// Wait for evaluation runs started elsewhere.
pub async fn wait_for_runs<P>(probe: &P, run_ids: &[String], settings: PollSettings) -> PollOutcome<DataQualityRun>
where
    P: StatusProbe<Status = DataQualityRun> + ?Sized,
{
    let outcome = wait_all(probe, run_ids, settings).await;
    for run in &outcome.statuses {
        info!(run_id = %run.run_id, state = %run.state, "Data quality run settled");
    }
    outcome
}
