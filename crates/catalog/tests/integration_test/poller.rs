//! Completion polling over an in-memory crawl service.

use std::time::{Duration, Instant};

use lakesync_catalog::*;
use lakesync_core::{JobState, LastRunStatus};

use crate::fakes::*;

fn ids(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

#[tokio::test]
async fn test_one_running_job_and_one_ready_job() {
    let lake = Lake::new("");
    lake.crawler.job("slow", 2);
    lake.crawler.job("quick", 0);

    let report = CompletionPoller::new(lake.crawler.clone())
        .wait(&ids(&["slow", "quick"]), fast())
        .await;

    assert!(report.all_ready);
    assert!(report.poll_rounds >= 2);
    assert_eq!(report.jobs[0].job_id, "slow");
    assert_eq!(report.jobs[1].job_id, "quick");
    assert!(report.jobs.iter().all(|j| j.last_run_status == LastRunStatus::Succeeded));
}

#[tokio::test]
async fn test_empty_job_list_completes_in_one_round() {
    let lake = Lake::new("");
    let report = CompletionPoller::new(lake.crawler.clone()).wait(&[], fast()).await;

    assert!(report.all_ready);
    assert_eq!(report.poll_rounds, 1);
    assert!(report.jobs.is_empty());
}

#[tokio::test]
async fn test_missing_job_with_ready_siblings() {
    let lake = Lake::new("");
    lake.crawler.job("a", 0);
    lake.crawler.job("b", 0);

    let report = CompletionPoller::new(lake.crawler.clone())
        .wait(&ids(&["a", "gone", "b"]), fast())
        .await;

    assert_eq!(report.poll_rounds, 1);
    assert!(!report.all_ready);
    assert_eq!(report.jobs[1].state, JobState::NotFound);
    assert_eq!(report.jobs[1].last_run_status, LastRunStatus::Unknown);
}

#[tokio::test]
async fn test_never_ready_job_times_out() {
    let lake = Lake::new("");
    lake.crawler.stuck("stuck");

    let timeout = Duration::from_millis(120);
    let started = Instant::now();
    let report = CompletionPoller::new(lake.crawler.clone())
        .wait(&ids(&["stuck"]), PollSettings::new(Duration::from_millis(25), timeout))
        .await;

    assert!(started.elapsed() >= timeout);
    assert!(report.elapsed >= timeout);
    assert!(!report.all_ready);
    assert_eq!(report.jobs[0].state, JobState::Running);
    assert!(report.poll_rounds >= 2);
}
