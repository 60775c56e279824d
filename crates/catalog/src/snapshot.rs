//! Partition snapshots: where a table's dated object lives and what columns
//! it carries.

use std::fmt;
use std::sync::Arc;

use lakesync_core::{ColumnSet, Day, TableName};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::CatalogError;
use crate::traits::SnapshotStore;

/// A bucket/key pair in the object store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectLocation {
    pub bucket: String,
    pub key: String,
}

impl ObjectLocation {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }
}

impl fmt::Display for ObjectLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s3://{}/{}", self.bucket, self.key)
    }
}

/// Partition layout: `<root>/<table>/date=<YYYYMMDD>/<table>.<format>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SnapshotLayout {
    pub bucket: String,
    root: String,
    pub format: String,
}

impl SnapshotLayout {
    /// Empty segments in `root` (leading, trailing or doubled slashes) are dropped.
    pub fn new(bucket: impl Into<String>, root: &str, format: impl Into<String>) -> Self {
        let root = root
            .split('/')
            .filter(|segment| !segment.is_empty())
            .collect::<Vec<_>>()
            .join("/");
        Self {
            bucket: bucket.into(),
            root,
            format: format.into(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    pub fn location(&self, table: &TableName, day: Day) -> ObjectLocation {
        let file = format!("{table}/date={}/{table}.{}", day.canonical(), self.format);
        let key = if self.root.is_empty() {
            file
        } else {
            format!("{}/{}", self.root, file)
        };
        ObjectLocation::new(self.bucket.clone(), key)
    }
}

/// One table's schema as observed on one day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Snapshot {
    Present(ColumnSet),
    /// No partition exists for that day (first run, or zero rows ingested).
    Absent,
}

impl Snapshot {
    pub fn is_absent(&self) -> bool {
        matches!(self, Snapshot::Absent)
    }
}

/// Reads the column set of dated partitions.
pub struct SnapshotColumnReader {
    store: Arc<dyn SnapshotStore>,
    layout: SnapshotLayout,
}

impl SnapshotColumnReader {
    pub fn new(store: Arc<dyn SnapshotStore>, layout: SnapshotLayout) -> Self {
        Self { store, layout }
    }

    pub fn layout(&self) -> &SnapshotLayout {
        &self.layout
    }

    /// A missing object yields [`Snapshot::Absent`]; any other failure is
    /// returned as [`CatalogError::SnapshotRead`].
    pub async fn read(&self, table: &TableName, day: Day) -> Result<Snapshot, CatalogError> {
        let location = self.layout.location(table, day);
        debug!(table = %table, day = %day, location = %location, "Reading snapshot schema");

        match self.store.read_columns(&location).await {
            Ok(columns) => Ok(Snapshot::Present(columns.into_iter().collect())),
            Err(e) if e.is_not_found() => Ok(Snapshot::Absent),
            Err(source) => Err(CatalogError::SnapshotRead {
                table: table.to_string(),
                day: day.canonical(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ServiceError;
    use crate::testing::FakeSnapshots;

    fn day(s: &str) -> Day {
        Day::parse_canonical(s).unwrap()
    }

    #[test]
    fn layout_builds_partition_key() {
        let layout = SnapshotLayout::new("lake", "hr/convert", "parquet");
        let loc = layout.location(&TableName::new("users"), day("20250121"));
        assert_eq!(loc.bucket, "lake");
        assert_eq!(loc.key, "hr/convert/users/date=20250121/users.parquet");
        assert_eq!(loc.to_string(), "s3://lake/hr/convert/users/date=20250121/users.parquet");
    }

    #[test]
    fn layout_collapses_stray_slashes() {
        let layout = SnapshotLayout::new("lake", "/hr//convert/", "parquet");
        assert_eq!(layout.root(), "hr/convert");
        let loc = layout.location(&TableName::new("t"), day("20250101"));
        assert_eq!(loc.key, "hr/convert/t/date=20250101/t.parquet");

        let bare = SnapshotLayout::new("lake", "", "csv");
        let loc = bare.location(&TableName::new("t"), day("20250101"));
        assert_eq!(loc.key, "t/date=20250101/t.csv");
    }

    #[tokio::test]
    async fn missing_object_is_absent() {
        let store = Arc::new(FakeSnapshots::default());
        let reader = SnapshotColumnReader::new(store, SnapshotLayout::new("lake", "root", "parquet"));
        let snap = reader.read(&TableName::new("users"), day("20250121")).await.unwrap();
        assert!(snap.is_absent());
    }

    #[tokio::test]
    async fn present_object_yields_columns() {
        let store = Arc::new(FakeSnapshots::default());
        store.put("root/users/date=20250121/users.parquet", &["id", "name"]);
        let reader = SnapshotColumnReader::new(store, SnapshotLayout::new("lake", "root", "parquet"));

        let snap = reader.read(&TableName::new("users"), day("20250121")).await.unwrap();
        let expected: ColumnSet = ["id", "name"].into_iter().collect();
        assert_eq!(snap, Snapshot::Present(expected));
    }

    #[tokio::test]
    async fn other_failures_propagate() {
        let store = Arc::new(FakeSnapshots::default());
        store.fail(
            "root/users/date=20250121/users.parquet",
            ServiceError::Service("access denied".into()),
        );
        let reader = SnapshotColumnReader::new(store, SnapshotLayout::new("lake", "root", "parquet"));

        let err = reader.read(&TableName::new("users"), day("20250121")).await.unwrap_err();
        assert!(matches!(err, CatalogError::SnapshotRead { ref table, .. } if table == "users"));
        assert!(!err.is_configuration());
    }
}
