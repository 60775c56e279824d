//! End-to-end runs of the maintenance driver over in-memory collaborators.

use lakesync_catalog::*;
use lakesync_core::{JobState, ScanPolicy};

use crate::fakes::*;

#[tokio::test]
async fn test_prevdif_mixes_incremental_and_full() {
    let lake = Lake::new("users,groups,licenses");
    lake.register("users", 0);
    lake.register("groups", 0);
    lake.register("licenses", 0);

    // users: unchanged. groups: a column was dropped. licenses: no partition yesterday.
    lake.lake.put(&key("users", REFERENCE), &["id", "name"]);
    lake.lake.put(&key("users", PREVIOUS), &["name", "id"]);
    lake.lake.put(&key("groups", REFERENCE), &["id", "name", "value"]);
    lake.lake.put(&key("groups", PREVIOUS), &["id", "value"]);
    lake.lake.put(&key("licenses", REFERENCE), &["sku"]);

    let report = lake.driver().run(&Invocation::new("prevdif")).await.unwrap();

    assert_eq!(report.status(), RunStatus::Success);
    assert_eq!(report.mode, "prevdif");
    assert_eq!(report.reference_day, day(REFERENCE));
    assert_eq!(lake.crawler.policy_of("crawler-users"), Some(ScanPolicy::Incremental));
    assert_eq!(lake.crawler.policy_of("crawler-groups"), Some(ScanPolicy::Full));
    assert_eq!(lake.crawler.policy_of("crawler-licenses"), Some(ScanPolicy::Full));

    let groups = report.tables[1].diff.as_ref().unwrap();
    assert_eq!(groups.added.to_vec(), vec!["name"]);
    assert!(groups.removed.is_empty());

    let licenses = report.tables[2].diff.as_ref().unwrap();
    assert!(licenses.target_absent);
    assert_eq!(licenses.added.to_vec(), vec!["sku"]);

    // Launch order follows the configured table order.
    assert_eq!(
        lake.crawler.started(),
        vec!["crawler-users", "crawler-groups", "crawler-licenses"]
    );
    assert!(report.completion.all_ready);
    assert_eq!(report.completion.jobs.len(), 3);
}

#[tokio::test]
async fn test_prevdif_isolates_transient_table_failures() {
    let lake = Lake::new("users,groups");
    lake.register("users", 0);
    lake.register("groups", 0);
    lake.lake.fail(
        &key("users", REFERENCE),
        ServiceError::Service("access denied: lake/users".into()),
    );
    lake.lake.put(&key("groups", REFERENCE), &["id"]);
    lake.lake.put(&key("groups", PREVIOUS), &["id"]);

    let report = lake.driver().run(&Invocation::new("prevdif")).await.unwrap();

    assert_eq!(report.status(), RunStatus::Failed);
    assert_eq!(report.verdict(), serde_json::json!({"status": "failed"}));
    assert!(report.tables[0].error.as_deref().unwrap().contains("access denied"));
    assert!(report.tables[0].job_id.is_none());
    assert_eq!(report.tables[1].job_id.as_deref(), Some("crawler-groups"));

    // The surviving job is still awaited.
    assert_eq!(lake.crawler.started(), vec!["crawler-groups"]);
    assert_eq!(report.completion.jobs.len(), 1);
    assert!(report.completion.all_ready);
}

#[tokio::test]
async fn test_prevdif_start_failure_keeps_diff_in_outcome() {
    let lake = Lake::new("users,groups");
    lake.register("users", 0);
    lake.register("groups", 0);
    lake.crawler
        .fail_start("crawler-users", ServiceError::Service("crawler-users is already running".into()));

    let report = lake.driver().run(&Invocation::new("prevdif")).await.unwrap();

    let users = &report.tables[0];
    assert_eq!(users.policy, Some(ScanPolicy::Full));
    assert!(users.diff.as_ref().unwrap().both_absent());
    assert!(users.error.is_some());
    assert_eq!(report.failed_tables().count(), 1);
    assert_eq!(lake.crawler.started(), vec!["crawler-groups"]);
}

#[tokio::test]
async fn test_prevdif_unmapped_table_aborts_run() {
    let lake = Lake::new("users,groups");
    lake.register("users", 0);

    let err = lake.driver().run(&Invocation::new("prevdif")).await.unwrap_err();

    assert!(matches!(err, CatalogError::JobNotMapped { ref table, .. } if table == "groups"));
    assert!(err.is_configuration());
    // users was mapped but nothing was started for it.
    assert!(lake.crawler.started().is_empty());
    assert!(lake.crawler.calls().is_empty());
}

#[tokio::test]
async fn test_prevdif_unregistered_job_aborts_run() {
    let lake = Lake::new("users");
    lake.register("users", 0);
    lake.crawler.unregister("crawler-users");

    let err = lake.driver().run(&Invocation::new("prevdif")).await.unwrap_err();
    assert!(matches!(err, CatalogError::JobNotRegistered { .. }));
}

#[tokio::test]
async fn test_specdif_diffs_reference_against_explicit_day() {
    let lake = Lake::new("ignored");
    lake.register("users", 0);
    lake.lake.put(&key("users", REFERENCE), &["id", "name"]);
    lake.lake.put(&key("users", "20250105"), &["id", "name", "extra"]);

    let report = lake
        .driver()
        .run(&Invocation::new("specdif").with_table("users").with_target_day("20250105"))
        .await
        .unwrap();

    let diff = report.tables[0].diff.as_ref().unwrap();
    assert!(diff.diff);
    assert!(diff.added.is_empty());
    assert_eq!(diff.removed.to_vec(), vec!["extra"]);
    assert_eq!(report.tables[0].policy, Some(ScanPolicy::Full));
    assert_eq!(lake.lake.reads().len(), 2);
}

#[tokio::test]
async fn test_specdif_without_target_day_makes_no_external_call() {
    let lake = Lake::new("users");
    lake.register("users", 0);

    let err = lake
        .driver()
        .run(&Invocation::new("specdif").with_table("users"))
        .await
        .unwrap_err();

    assert!(matches!(err, CatalogError::InvalidInvocation(_)));
    assert!(err.is_configuration());
    assert!(lake.params.lookups().is_empty());
    assert_eq!(lake.dates.reads(), 0);
    assert!(lake.lake.reads().is_empty());
    assert!(lake.crawler.calls().is_empty());
}

#[tokio::test]
async fn test_fulscan_forces_full_without_reading_snapshots() {
    let lake = Lake::new("users");
    lake.register("users", 1);

    let report = lake
        .driver()
        .run(&Invocation::new("fulscan").with_table("users"))
        .await
        .unwrap();

    assert!(lake.lake.reads().is_empty());
    assert_eq!(lake.crawler.policy_of("crawler-users"), Some(ScanPolicy::Full));
    assert_eq!(report.completion.jobs[0].state, JobState::Ready);
    assert!(report.completion.poll_rounds >= 2);
}

#[tokio::test]
async fn test_missing_bucket_parameter_is_configuration_error() {
    let lake = Lake::new("users");
    let params = std::sync::Arc::new(testing::FakeParams::default());
    params.set("/it/common/hr/targettable", "users");
    let context = ParameterContext::new(
        "hr",
        lakesync_core::ParameterNames::new(PREFIX),
        "basedatetime/basedatetime.csv",
        params,
        lake.dates.clone(),
    );

    let err = context.resolve().await.unwrap_err();
    assert!(matches!(err, CatalogError::ParameterMissing(_)));
    assert_eq!(lake.dates.reads(), 0);
}
