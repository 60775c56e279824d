use std::process::ExitCode;

use lakesync_catalog::{CatalogError, MaintenanceReport, RunStatus};

/// Process exit status of one invocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Exit {
    Success = 0,
    Failed = 1,
    Configuration = 2,
    Incomplete = 3,
}

impl Exit {
    pub fn from_report(report: &MaintenanceReport, require_ready: bool) -> Self {
        match report.status() {
            RunStatus::Failed => Exit::Failed,
            RunStatus::Success if require_ready && !report.completion.all_ready => Exit::Incomplete,
            RunStatus::Success => Exit::Success,
        }
    }

    pub fn from_error(err: &CatalogError) -> Self {
        if err.is_configuration() {
            Exit::Configuration
        } else {
            Exit::Failed
        }
    }

    pub fn verdict(self) -> &'static str {
        match self {
            Exit::Success | Exit::Incomplete => "success",
            Exit::Failed | Exit::Configuration => "failed",
        }
    }
}

impl From<Exit> for ExitCode {
    fn from(exit: Exit) -> Self {
        ExitCode::from(exit as u8)
    }
}
