//! Generic "wait until every job settles" loop.
//!
//! The loop knows nothing about crawlers: a [`StatusProbe`] supplies the
//! status fetch, maps fetch failures into a status, and classifies each
//! status. Crawl completion and data-quality runs both sit on top of it.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use lakesync_core::CrawlConfig;
use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, warn};

use crate::error::ServiceError;

/// Where a job stands from the poller's point of view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Progress {
    Pending,
    Succeeded,
    /// Terminal without success (failed run, missing job, unreadable status).
    Failed,
}

impl Progress {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Progress::Pending)
    }
}

#[async_trait]
pub trait StatusProbe: Send + Sync {
    type Status: Clone + fmt::Debug + Send + Sync;

    /// Placeholder status before the first observation.
    fn initial(&self, id: &str) -> Self::Status;

    async fn fetch(&self, id: &str) -> Result<Self::Status, ServiceError>;

    /// Status recorded when `fetch` fails. Must not abort sibling jobs.
    fn on_error(&self, id: &str, error: &ServiceError) -> Self::Status;

    fn progress(&self, status: &Self::Status) -> Progress;
}

/// Poll cadence and the overall wait budget.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PollSettings {
    pub interval: Duration,
    pub timeout: Duration,
}

impl PollSettings {
    pub fn new(interval: Duration, timeout: Duration) -> Self {
        Self { interval, timeout }
    }
}

impl From<&CrawlConfig> for PollSettings {
    fn from(cfg: &CrawlConfig) -> Self {
        Self::new(cfg.poll_interval(), cfg.timeout())
    }
}

impl Default for PollSettings {
    fn default() -> Self {
        Self::from(&CrawlConfig::default())
    }
}

/// Final observation of every job, in the order the ids were supplied.
#[derive(Debug, Clone)]
pub struct PollOutcome<S> {
    pub statuses: Vec<S>,
    pub all_succeeded: bool,
    pub elapsed: Duration,
    pub rounds: u32,
}

/// Poll `ids` until each is terminal or `settings.timeout` elapses.
///
/// Jobs already terminal are not queried again. After a round that leaves
/// work outstanding, the loop sleeps `min(interval, timeout - elapsed)`, so
/// it returns at or shortly after the timeout and never loops forever.
pub async fn wait_all<P>(probe: &P, ids: &[String], settings: PollSettings) -> PollOutcome<P::Status>
where
    P: StatusProbe + ?Sized,
{
    let start = Instant::now();
    let mut statuses: Vec<P::Status> = ids.iter().map(|id| probe.initial(id)).collect();
    let mut settled = vec![false; ids.len()];
    let mut rounds: u32 = 0;

    loop {
        rounds += 1;

        for (i, id) in ids.iter().enumerate() {
            if settled[i] {
                continue;
            }
            let status = match probe.fetch(id).await {
                Ok(status) => status,
                Err(e) => {
                    warn!(id = %id, error = %e, "Status read failed");
                    probe.on_error(id, &e)
                }
            };
            settled[i] = probe.progress(&status).is_terminal();
            statuses[i] = status;
        }

        let pending = settled.iter().filter(|s| !**s).count();
        debug!(
            round = rounds,
            pending,
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Poll round complete"
        );

        if pending == 0 {
            break;
        }

        let elapsed = start.elapsed();
        if elapsed >= settings.timeout {
            warn!(
                pending,
                elapsed_secs = elapsed.as_secs(),
                timeout_secs = settings.timeout.as_secs(),
                "Timed out waiting for jobs"
            );
            break;
        }

        tokio::time::sleep(settings.interval.min(settings.timeout - elapsed)).await;
    }

    let all_succeeded = statuses
        .iter()
        .all(|s| probe.progress(s) == Progress::Succeeded);

    PollOutcome {
        statuses,
        all_succeeded,
        elapsed: start.elapsed(),
        rounds,
    }
}
