//! Closed domain types shared by the engine and its adapters.

use std::fmt;

use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

// ── Tables ────────────────────────────────────────────────────

/// Opaque table identifier as it appears in the lake layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableName(String);

impl TableName {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Split a comma separated table list, trimming entries and dropping empties.
    pub fn parse_list(raw: &str) -> Vec<TableName> {
        raw.split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(TableName::new)
            .collect()
    }
}

impl fmt::Display for TableName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TableName {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

// ── Columns ───────────────────────────────────────────────────

/// A set of column names.
///
/// Membership is what matters: two sets with the same names in a different
/// order compare equal. First-seen order is kept so logs and reports list
/// columns the way the schema declares them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnSet(IndexSet<String>);

impl ColumnSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, column: &str) -> bool {
        self.0.contains(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    /// Columns in `self` that are not in `other`, in `self`'s order.
    pub fn difference(&self, other: &ColumnSet) -> ColumnSet {
        Self(self.0.difference(&other.0).cloned().collect())
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.0.iter().cloned().collect()
    }
}

impl<S: Into<String>> FromIterator<S> for ColumnSet {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self(iter.into_iter().map(Into::into).collect())
    }
}

impl fmt::Display for ColumnSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[")?;
        for (i, col) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            f.write_str(col)?;
        }
        write!(f, "]")
    }
}

// ── Scan policy ───────────────────────────────────────────────

/// How the crawler treats schema changes it discovers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemaChangeBehavior {
    /// Updates and deletions are only logged.
    LogOnly,
    /// Updates are applied and deleted objects deprecated in the catalog.
    UpdateAndDeprecate,
}

/// Which partitions the crawler visits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RecrawlBehavior {
    NewFoldersOnly,
    Everything,
}

/// The two valid crawler configurations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScanPolicy {
    Incremental,
    Full,
}

impl ScanPolicy {
    pub fn is_full(self) -> bool {
        matches!(self, ScanPolicy::Full)
    }

    pub fn schema_change(self) -> SchemaChangeBehavior {
        match self {
            ScanPolicy::Incremental => SchemaChangeBehavior::LogOnly,
            ScanPolicy::Full => SchemaChangeBehavior::UpdateAndDeprecate,
        }
    }

    pub fn recrawl(self) -> RecrawlBehavior {
        match self {
            ScanPolicy::Incremental => RecrawlBehavior::NewFoldersOnly,
            ScanPolicy::Full => RecrawlBehavior::Everything,
        }
    }
}

impl fmt::Display for ScanPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScanPolicy::Incremental => write!(f, "incremental"),
            ScanPolicy::Full => write!(f, "full"),
        }
    }
}

// ── Crawl job state ───────────────────────────────────────────

/// Liveness of a crawl job as observed by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum JobState {
    Ready,
    Running,
    /// Status could not be read (other than "not found").
    Error,
    NotFound,
    Unknown,
}

impl JobState {
    /// No further transition is expected within the current run.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Ready | JobState::Error | JobState::NotFound)
    }
}

impl fmt::Display for JobState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            JobState::Ready => "READY",
            JobState::Running => "RUNNING",
            JobState::Error => "ERROR",
            JobState::NotFound => "NOT_FOUND",
            JobState::Unknown => "UNKNOWN",
        };
        f.pad(s)
    }
}

/// Outcome of the job's most recent run, independent of its liveness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LastRunStatus {
    Succeeded,
    Failed,
    Cancelled,
    Unknown,
}

impl fmt::Display for LastRunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            LastRunStatus::Succeeded => "SUCCEEDED",
            LastRunStatus::Failed => "FAILED",
            LastRunStatus::Cancelled => "CANCELLED",
            LastRunStatus::Unknown => "UNKNOWN",
        };
        f.pad(s)
    }
}

/// Snapshot of one crawl job's observable status.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CrawlJob {
    pub job_id: String,
    pub state: JobState,
    pub last_run_status: LastRunStatus,
}

impl CrawlJob {
    /// A job that has been started but not yet observed.
    pub fn unobserved(job_id: impl Into<String>) -> Self {
        Self {
            job_id: job_id.into(),
            state: JobState::Unknown,
            last_run_status: LastRunStatus::Unknown,
        }
    }
}
