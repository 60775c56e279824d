//! Top-level maintenance run: validate, resolve context, diff and launch per
//! table, then wait for every started crawl job.

use std::sync::Arc;

use lakesync_core::{Day, ScanPolicy, TableName};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::completion::CompletionPoller;
use crate::context::{ContextSource, RunContext};
use crate::diff::SchemaDiffVerifier;
use crate::error::CatalogError;
use crate::invocation::{Invocation, Mode};
use crate::launcher::CrawlJobLauncher;
use crate::poll::PollSettings;
use crate::policy::select_policy;
use crate::report::{MaintenanceReport, TableOutcome};
use crate::snapshot::{SnapshotColumnReader, SnapshotLayout};
use crate::traits::SnapshotStore;

/// A table that could not be launched, with whatever was learned before the
/// failure.
struct TableFailure {
    outcome: TableOutcome,
    error: CatalogError,
}

pub struct MaintenanceDriver {
    context: Arc<dyn ContextSource>,
    snapshots: Arc<dyn SnapshotStore>,
    launcher: CrawlJobLauncher,
    poller: CompletionPoller,
    snapshot_format: String,
    poll: PollSettings,
}

impl MaintenanceDriver {
    pub fn new(
        context: Arc<dyn ContextSource>,
        snapshots: Arc<dyn SnapshotStore>,
        launcher: CrawlJobLauncher,
        poller: CompletionPoller,
    ) -> Self {
        Self {
            context,
            snapshots,
            launcher,
            poller,
            snapshot_format: "parquet".to_string(),
            poll: PollSettings::default(),
        }
    }

    pub fn with_snapshot_format(mut self, format: impl Into<String>) -> Self {
        self.snapshot_format = format.into();
        self
    }

    pub fn with_poll_settings(mut self, settings: PollSettings) -> Self {
        self.poll = settings;
        self
    }

    /// Validate `invocation` and execute it.
    ///
    /// An invalid invocation is rejected before any external call. A
    /// configuration error aborts the run; other per-table failures in
    /// `prevdif` are recorded in the report and the remaining tables proceed.
    pub async fn run(&self, invocation: &Invocation) -> Result<MaintenanceReport, CatalogError> {
        let mode = invocation.validate()?;
        self.run_mode(mode).await
    }

    pub async fn run_mode(&self, mode: Mode) -> Result<MaintenanceReport, CatalogError> {
        let run_id = Uuid::new_v4();
        info!(run_id = %run_id, mode = %mode, "Catalog maintenance started");

        let ctx = self.context.resolve().await?;
        let tables = match &mode {
            Mode::PrevDiff => self.prevdif(&ctx).await?,
            Mode::SpecDiff { table, target_day } => {
                let job_id = self.launcher.resolve_job_id(table).await?;
                let verifier = self.verifier(&ctx);
                let outcome = self
                    .diff_and_launch(&verifier, table, job_id, ctx.reference_day, *target_day)
                    .await
                    .map_err(|f| f.error)?;
                vec![outcome]
            }
            Mode::FullScan { table } => {
                let outcome = self.force_full(table).await.map_err(|f| f.error)?;
                vec![outcome]
            }
        };

        let job_ids: Vec<String> = tables.iter().filter_map(|t| t.job_id.clone()).collect();
        let completion = self.poller.wait(&job_ids, self.poll).await;

        let report = MaintenanceReport {
            run_id,
            mode: mode.name().to_string(),
            reference_day: ctx.reference_day,
            tables,
            completion,
        };

        for failed in report.failed_tables() {
            error!(
                table = %failed.table,
                error = failed.error.as_deref().unwrap_or_default(),
                "Table was not launched"
            );
        }
        info!(
            run_id = %run_id,
            status = %report.status(),
            launched = job_ids.len(),
            all_ready = report.completion.all_ready,
            elapsed_secs = report.completion.elapsed.as_secs(),
            "Catalog maintenance finished"
        );
        Ok(report)
    }

    async fn prevdif(&self, ctx: &RunContext) -> Result<Vec<TableOutcome>, CatalogError> {
        if ctx.tables.is_empty() {
            return Err(CatalogError::NoTables(ctx.group.clone()));
        }

        // Every mapping is resolved before the first crawler is touched, so a
        // missing one aborts the run with nothing started.
        let mut jobs = Vec::with_capacity(ctx.tables.len());
        for table in &ctx.tables {
            match self.launcher.resolve_job_id(table).await {
                Ok(job_id) => jobs.push((table, Ok(job_id))),
                Err(e) if e.is_configuration() => {
                    error!(table = %table, error = %e, "Configuration error, aborting run");
                    return Err(e);
                }
                Err(e) => {
                    warn!(table = %table, error = %e, "Crawl job lookup failed, continuing with the rest");
                    jobs.push((table, Err(e)));
                }
            }
        }

        let verifier = self.verifier(ctx);
        let base_day = ctx.reference_day;
        let target_day = base_day.previous();
        let mut outcomes: Vec<TableOutcome> = Vec::with_capacity(jobs.len());

        for (table, job) in jobs {
            let job_id = match job {
                Ok(job_id) => job_id,
                Err(e) => {
                    outcomes.push(TableOutcome::failed(table.clone(), None, None, e.to_string()));
                    continue;
                }
            };
            match self.diff_and_launch(&verifier, table, job_id, base_day, target_day).await {
                Ok(outcome) => outcomes.push(outcome),
                Err(f) if f.error.is_configuration() => {
                    let orphaned: Vec<&str> = outcomes.iter().filter_map(|o| o.job_id.as_deref()).collect();
                    error!(
                        table = %table,
                        error = %f.error,
                        orphaned = ?orphaned,
                        "Configuration error, aborting run; started crawl jobs are not awaited"
                    );
                    return Err(f.error);
                }
                Err(f) => {
                    warn!(table = %table, error = %f.error, "Table failed, continuing with the rest");
                    outcomes.push(f.outcome);
                }
            }
        }
        Ok(outcomes)
    }

    fn verifier(&self, ctx: &RunContext) -> SchemaDiffVerifier {
        let layout = SnapshotLayout::new(ctx.bucket.clone(), &ctx.snapshot_root, self.snapshot_format.clone());
        SchemaDiffVerifier::new(SnapshotColumnReader::new(self.snapshots.clone(), layout))
    }

    async fn diff_and_launch(
        &self,
        verifier: &SchemaDiffVerifier,
        table: &TableName,
        job_id: String,
        base_day: Day,
        target_day: Day,
    ) -> Result<TableOutcome, TableFailure> {
        let diff = verifier
            .diff(table, base_day, target_day)
            .await
            .map_err(|error| TableFailure {
                outcome: TableOutcome::failed(table.clone(), None, None, error.to_string()),
                error,
            })?;

        let policy = select_policy(&diff);
        match self.launcher.start_job(table, &job_id, policy).await {
            Ok(()) => Ok(TableOutcome::launched(table.clone(), Some(diff), policy, job_id)),
            Err(error) => Err(TableFailure {
                outcome: TableOutcome::failed(table.clone(), Some(diff), Some(policy), error.to_string()),
                error,
            }),
        }
    }

    async fn force_full(&self, table: &TableName) -> Result<TableOutcome, TableFailure> {
        info!(table = %table, "Forcing full scan");
        match self.launcher.launch(table, ScanPolicy::Full).await {
            Ok(job_id) => Ok(TableOutcome::launched(table.clone(), None, ScanPolicy::Full, job_id)),
            Err(error) => Err(TableFailure {
                outcome: TableOutcome::failed(table.clone(), None, Some(ScanPolicy::Full), error.to_string()),
                error,
            }),
        }
    }
}
