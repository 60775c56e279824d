//! Waiting for started crawl jobs.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use lakesync_core::{CrawlJob, JobState, LastRunStatus};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::ServiceError;
use crate::poll::{wait_all, PollSettings, Progress, StatusProbe};
use crate::traits::CrawlService;

/// Aggregate view of every awaited crawl job.
#[derive(Debug, Clone, Serialize)]
pub struct CompletionReport {
    pub jobs: Vec<CrawlJob>,
    /// `false` after a timeout or when any job ended NOT_FOUND / ERROR.
    pub all_ready: bool,
    pub elapsed: Duration,
    pub poll_rounds: u32,
}

impl CompletionReport {
    /// Jobs that did not end READY.
    pub fn degraded(&self) -> impl Iterator<Item = &CrawlJob> {
        self.jobs.iter().filter(|j| j.state != JobState::Ready)
    }
}

impl fmt::Display for CompletionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "crawl completion: all_ready={} rounds={} elapsed={}s",
            self.all_ready,
            self.poll_rounds,
            self.elapsed.as_secs()
        )?;
        for job in &self.jobs {
            writeln!(
                f,
                "  {:<40} state={:<9} last_run={}",
                job.job_id, job.state, job.last_run_status
            )?;
        }
        Ok(())
    }
}

/// Adapts a [`CrawlService`] to the generic poller.
struct CrawlProbe {
    crawler: Arc<dyn CrawlService>,
}

#[async_trait]
impl StatusProbe for CrawlProbe {
    type Status = CrawlJob;

    fn initial(&self, id: &str) -> CrawlJob {
        CrawlJob::unobserved(id)
    }

    async fn fetch(&self, id: &str) -> Result<CrawlJob, ServiceError> {
        self.crawler.job_status(id).await
    }

    fn on_error(&self, id: &str, error: &ServiceError) -> CrawlJob {
        let state = if error.is_not_found() {
            JobState::NotFound
        } else {
            JobState::Error
        };
        CrawlJob {
            job_id: id.to_string(),
            state,
            last_run_status: LastRunStatus::Unknown,
        }
    }

    fn progress(&self, job: &CrawlJob) -> Progress {
        match job.state {
            JobState::Ready => Progress::Succeeded,
            JobState::NotFound | JobState::Error => Progress::Failed,
            JobState::Running | JobState::Unknown => Progress::Pending,
        }
    }
}

/// Polls crawl jobs until they are all READY (or otherwise terminal) or the
/// timeout elapses.
pub struct CompletionPoller {
    probe: CrawlProbe,
}

impl CompletionPoller {
    pub fn new(crawler: Arc<dyn CrawlService>) -> Self {
        Self {
            probe: CrawlProbe { crawler },
        }
    }

    pub async fn wait(&self, job_ids: &[String], settings: PollSettings) -> CompletionReport {
        info!(
            jobs = job_ids.len(),
            interval_ms = settings.interval.as_millis() as u64,
            timeout_secs = settings.timeout.as_secs(),
            "Waiting for crawl jobs"
        );

        let outcome = wait_all(&self.probe, job_ids, settings).await;
        let report = CompletionReport {
            jobs: outcome.statuses,
            all_ready: outcome.all_succeeded,
            elapsed: outcome.elapsed,
            poll_rounds: outcome.rounds,
        };

        for job in &report.jobs {
            if job.state == JobState::Ready {
                info!(job_id = %job.job_id, last_run = %job.last_run_status, "Crawl job ready");
            } else {
                warn!(job_id = %job.job_id, state = %job.state, last_run = %job.last_run_status, "Crawl job not ready");
            }
        }
        report
    }
}
