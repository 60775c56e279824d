//! Column-set differencing between two dated snapshots of a table.

use lakesync_core::{ColumnSet, Day, TableName};
use serde::Serialize;
use tracing::{info, warn};

use crate::error::CatalogError;
use crate::snapshot::{Snapshot, SnapshotColumnReader};

/// Outcome of comparing a base-day snapshot with a target-day snapshot.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    pub diff: bool,
    /// Present in base, absent in target.
    pub added: ColumnSet,
    /// Present in target, absent in base.
    pub removed: ColumnSet,
    pub base_columns: ColumnSet,
    pub target_columns: ColumnSet,
    pub base_absent: bool,
    pub target_absent: bool,
}

impl DiffResult {
    /// Compare two snapshots.
    ///
    /// An absent side counts as an empty column set and forces `diff`, so an
    /// uncertain state always leads to a full scan.
    pub fn compare(base: Snapshot, target: Snapshot) -> Self {
        let base_absent = base.is_absent();
        let target_absent = target.is_absent();
        let base_columns = into_columns(base);
        let target_columns = into_columns(target);

        let added = base_columns.difference(&target_columns);
        let removed = target_columns.difference(&base_columns);
        let diff = base_absent || target_absent || !added.is_empty() || !removed.is_empty();

        Self {
            diff,
            added,
            removed,
            base_columns,
            target_columns,
            base_absent,
            target_absent,
        }
    }

    /// Neither day has a partition: "changed" with nothing visibly changed.
    pub fn both_absent(&self) -> bool {
        self.base_absent && self.target_absent
    }
}

fn into_columns(snapshot: Snapshot) -> ColumnSet {
    match snapshot {
        Snapshot::Present(columns) => columns,
        Snapshot::Absent => ColumnSet::new(),
    }
}

/// Reads both snapshots of a table and classifies the difference.
pub struct SchemaDiffVerifier {
    reader: SnapshotColumnReader,
}

impl SchemaDiffVerifier {
    pub fn new(reader: SnapshotColumnReader) -> Self {
        Self { reader }
    }

    pub async fn diff(
        &self,
        table: &TableName,
        base_day: Day,
        target_day: Day,
    ) -> Result<DiffResult, CatalogError> {
        let base = self.reader.read(table, base_day).await?;
        let target = self.reader.read(table, target_day).await?;
        let result = DiffResult::compare(base, target);

        if result.both_absent() {
            warn!(
                table = %table,
                base_day = %base_day,
                target_day = %target_day,
                "Both snapshots absent, forcing full scan"
            );
        } else if result.base_absent || result.target_absent {
            warn!(
                table = %table,
                base_day = %base_day,
                target_day = %target_day,
                base_absent = result.base_absent,
                target_absent = result.target_absent,
                "Snapshot absent, treating all columns as new"
            );
        }

        if result.diff {
            warn!(
                table = %table,
                added = %result.added,
                removed = %result.removed,
                "Column drift detected"
            );
        } else {
            info!(table = %table, columns = result.base_columns.len(), "No column drift");
        }

        Ok(result)
    }
}
