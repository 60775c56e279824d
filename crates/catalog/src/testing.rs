//! In-memory collaborators for tests. Every fake records the calls it
//! receives so tests can assert what reached the outside world.

use std::collections::{HashMap, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;
use lakesync_core::{CrawlJob, Day, JobState, LastRunStatus, ScanPolicy};

use crate::error::ServiceError;
use crate::snapshot::ObjectLocation;
use crate::traits::{CrawlService, ParameterStore, ReferenceDateSource, SnapshotStore};

#[derive(Default)]
pub struct FakeSnapshots {
    objects: Mutex<HashMap<String, Result<Vec<String>, ServiceError>>>,
    reads: Mutex<Vec<String>>,
}

impl FakeSnapshots {
    pub fn put(&self, key: &str, columns: &[&str]) {
        let cols = columns.iter().map(|c| c.to_string()).collect();
        self.objects.lock().unwrap().insert(key.to_string(), Ok(cols));
    }

    pub fn fail(&self, key: &str, error: ServiceError) {
        self.objects.lock().unwrap().insert(key.to_string(), Err(error));
    }

    /// Keys read so far, in order.
    pub fn reads(&self) -> Vec<String> {
        self.reads.lock().unwrap().clone()
    }
}

#[async_trait]
impl SnapshotStore for FakeSnapshots {
    async fn read_columns(&self, location: &ObjectLocation) -> Result<Vec<String>, ServiceError> {
        self.reads.lock().unwrap().push(location.key.clone());
        self.objects
            .lock()
            .unwrap()
            .get(&location.key)
            .cloned()
            .unwrap_or_else(|| Err(ServiceError::NotFound(location.to_string())))
    }
}

/// Crawl service whose job states are scripted per job.
///
/// Each status read pops the next scripted state; the last one repeats.
#[derive(Default)]
pub struct FakeCrawler {
    scripts: Mutex<HashMap<String, VecDeque<Result<CrawlJob, ServiceError>>>>,
    unknown_jobs: Mutex<Vec<String>>,
    failing_starts: Mutex<HashMap<String, ServiceError>>,
    policies: Mutex<Vec<(String, ScanPolicy)>>,
    started: Mutex<Vec<String>>,
    calls: Mutex<Vec<String>>,
}

impl FakeCrawler {
    pub fn script(&self, job_id: &str, states: &[JobState]) {
        let steps = states
            .iter()
            .map(|s| {
                Ok(CrawlJob {
                    job_id: job_id.to_string(),
                    state: *s,
                    last_run_status: if *s == JobState::Ready {
                        LastRunStatus::Succeeded
                    } else {
                        LastRunStatus::Unknown
                    },
                })
            })
            .collect();
        self.scripts.lock().unwrap().insert(job_id.to_string(), steps);
    }

    /// RUNNING for `running_reads` status reads, then READY.
    pub fn job(&self, job_id: &str, running_reads: usize) {
        let mut states = vec![JobState::Running; running_reads];
        states.push(JobState::Ready);
        self.script(job_id, &states);
    }

    /// RUNNING on every status read.
    pub fn stuck(&self, job_id: &str) {
        self.script(job_id, &[JobState::Running]);
    }

    pub fn script_error(&self, job_id: &str, error: ServiceError) {
        self.scripts
            .lock()
            .unwrap()
            .insert(job_id.to_string(), VecDeque::from([Err(error)]));
    }

    /// Job does not exist in the crawl service at all.
    pub fn unregister(&self, job_id: &str) {
        self.unknown_jobs.lock().unwrap().push(job_id.to_string());
    }

    pub fn fail_start(&self, job_id: &str, error: ServiceError) {
        self.failing_starts.lock().unwrap().insert(job_id.to_string(), error);
    }

    /// Every call received, as `policy:<id>:<policy>`, `start:<id>` or `status:<id>`.
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Jobs whose start succeeded, in order.
    pub fn started(&self) -> Vec<String> {
        self.started.lock().unwrap().clone()
    }

    /// The policy last applied to `job_id`.
    pub fn policy_of(&self, job_id: &str) -> Option<ScanPolicy> {
        self.policies
            .lock()
            .unwrap()
            .iter()
            .rev()
            .find(|(id, _)| id == job_id)
            .map(|(_, p)| *p)
    }

    fn is_unknown(&self, job_id: &str) -> bool {
        self.unknown_jobs.lock().unwrap().iter().any(|j| j == job_id)
    }
}

#[async_trait]
impl CrawlService for FakeCrawler {
    async fn apply_policy(&self, job_id: &str, policy: ScanPolicy) -> Result<(), ServiceError> {
        self.calls.lock().unwrap().push(format!("policy:{job_id}:{policy}"));
        if self.is_unknown(job_id) {
            return Err(ServiceError::NotFound(job_id.to_string()));
        }
        self.policies.lock().unwrap().push((job_id.to_string(), policy));
        Ok(())
    }

    async fn start(&self, job_id: &str) -> Result<(), ServiceError> {
        self.calls.lock().unwrap().push(format!("start:{job_id}"));
        if let Some(err) = self.failing_starts.lock().unwrap().get(job_id) {
            return Err(err.clone());
        }
        self.started.lock().unwrap().push(job_id.to_string());
        Ok(())
    }

    async fn job_status(&self, job_id: &str) -> Result<CrawlJob, ServiceError> {
        self.calls.lock().unwrap().push(format!("status:{job_id}"));
        let mut scripts = self.scripts.lock().unwrap();
        let Some(steps) = scripts.get_mut(job_id) else {
            return Err(ServiceError::NotFound(job_id.to_string()));
        };
        if steps.len() > 1 {
            steps.pop_front().unwrap_or_else(|| Err(ServiceError::Service("empty script".into())))
        } else {
            steps
                .front()
                .cloned()
                .unwrap_or_else(|| Err(ServiceError::Service("empty script".into())))
        }
    }
}

#[derive(Default)]
pub struct FakeParams {
    values: Mutex<HashMap<String, String>>,
    lookups: Mutex<Vec<String>>,
}

impl FakeParams {
    pub fn set(&self, name: &str, value: &str) {
        self.values.lock().unwrap().insert(name.to_string(), value.to_string());
    }

    pub fn lookups(&self) -> Vec<String> {
        self.lookups.lock().unwrap().clone()
    }
}

#[async_trait]
impl ParameterStore for FakeParams {
    async fn get(&self, name: &str) -> Result<String, ServiceError> {
        self.lookups.lock().unwrap().push(name.to_string());
        self.values
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(name.to_string()))
    }
}

/// Reference date source with a fixed answer; `None` reads as not found.
pub struct FixedDay {
    day: Option<Day>,
    reads: AtomicUsize,
}

impl FixedDay {
    pub fn new(day: Option<Day>) -> Self {
        Self {
            day,
            reads: AtomicUsize::new(0),
        }
    }

    pub fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ReferenceDateSource for FixedDay {
    async fn reference_day(&self, location: &ObjectLocation) -> Result<Day, ServiceError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        self.day.ok_or_else(|| ServiceError::NotFound(location.to_string()))
    }
}
