use std::fmt;

use lakesync_core::{Day, ScanPolicy, TableName};
use serde::Serialize;
use uuid::Uuid;

use crate::completion::CompletionReport;
use crate::diff::DiffResult;

/// What happened to one table during the launch phase.
#[derive(Debug, Clone, Serialize)]
pub struct TableOutcome {
    pub table: TableName,
    /// `None` for forced full scans.
    pub diff: Option<DiffResult>,
    pub policy: Option<ScanPolicy>,
    pub job_id: Option<String>,
    pub error: Option<String>,
}

impl TableOutcome {
    pub fn launched(table: TableName, diff: Option<DiffResult>, policy: ScanPolicy, job_id: String) -> Self {
        Self {
            table,
            diff,
            policy: Some(policy),
            job_id: Some(job_id),
            error: None,
        }
    }

    pub fn failed(table: TableName, diff: Option<DiffResult>, policy: Option<ScanPolicy>, error: String) -> Self {
        Self {
            table,
            diff,
            policy,
            job_id: None,
            error: Some(error),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RunStatus {
    Success,
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunStatus::Success => write!(f, "success"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

/// Everything one invocation did, built once and returned.
#[derive(Debug, Clone, Serialize)]
pub struct MaintenanceReport {
    pub run_id: Uuid,
    pub mode: String,
    pub reference_day: Day,
    pub tables: Vec<TableOutcome>,
    pub completion: CompletionReport,
}

impl MaintenanceReport {
    /// A run fails when any table could not be launched. Incomplete
    /// completion (timeout, missing job) is reported but does not fail it.
    pub fn status(&self) -> RunStatus {
        if self.tables.iter().any(|t| t.error.is_some()) {
            RunStatus::Failed
        } else {
            RunStatus::Success
        }
    }

    pub fn failed_tables(&self) -> impl Iterator<Item = &TableOutcome> {
        self.tables.iter().filter(|t| t.error.is_some())
    }

    /// `{"status": "success" | "failed"}`
    pub fn verdict(&self) -> serde_json::Value {
        serde_json::json!({ "status": self.status() })
    }
}

impl fmt::Display for MaintenanceReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "catalog maintenance run {} mode={} reference_day={} status={}",
            self.run_id,
            self.mode,
            self.reference_day,
            self.status()
        )?;
        for t in &self.tables {
            let policy = t.policy.map(|p| p.to_string()).unwrap_or_else(|| "-".into());
            match (&t.job_id, &t.error) {
                (_, Some(err)) => writeln!(f, "  {:<30} policy={:<11} FAILED: {}", t.table.as_str(), policy, err)?,
                (Some(job), None) => writeln!(f, "  {:<30} policy={:<11} job={}", t.table.as_str(), policy, job)?,
                (None, None) => writeln!(f, "  {:<30} policy={:<11}", t.table.as_str(), policy)?,
            }
            if let Some(d) = t.diff.as_ref().filter(|d| d.diff) {
                writeln!(f, "  {:<30} added={} removed={}", "", d.added, d.removed)?;
            }
        }
        write!(f, "{}", self.completion)
    }
}
