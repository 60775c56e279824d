use lakesync_core::ScanPolicy;

use crate::diff::DiffResult;

/// Any detected difference (including an absent snapshot) needs a full scan.
pub fn select_policy(diff: &DiffResult) -> ScanPolicy {
    if diff.diff {
        ScanPolicy::Full
    } else {
        ScanPolicy::Incremental
    }
}
