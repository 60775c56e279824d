//! Column names of partition objects, read from the object's own schema.
//!
//! Only the Parquet footer or the CSV header row is fetched; partition
//! bodies are never downloaded.

use std::io::Cursor;
use std::sync::Arc;

use arrow::csv::reader::Format;
use async_trait::async_trait;
use bytes::Bytes;
use parquet::arrow::parquet_to_arrow_schema;
use parquet::file::metadata::ParquetMetaDataReader;
use tracing::debug;

use lakesync_catalog::{ObjectLocation, ServiceError, SnapshotStore};

use crate::backend::ObjectBackend;

/// Metadata length (4 bytes, little endian) followed by the `PAR1` magic.
const PARQUET_FOOTER_LEN: usize = 8;

/// Bytes fetched per round while looking for the end of a CSV header row.
const CSV_HEADER_CHUNK: usize = 64 * 1024;

/// Snapshot store over an [`ObjectBackend`].
///
/// `.csv` objects are read by their header row; everything else is treated
/// as Parquet and read from the file metadata.
pub struct ObjectSnapshotStore {
    backend: Arc<ObjectBackend>,
}

impl ObjectSnapshotStore {
    pub fn new(backend: Arc<ObjectBackend>) -> Self {
        Self { backend }
    }

    async fn parquet_footer(&self, location: &ObjectLocation, size: usize) -> Result<Vec<String>, ServiceError> {
        if size < PARQUET_FOOTER_LEN {
            return Err(malformed(location, "object is smaller than a Parquet footer"));
        }
        let footer_start = size - PARQUET_FOOTER_LEN;
        let tail = self.backend.fetch_range(location, footer_start..size).await?;
        let footer: [u8; PARQUET_FOOTER_LEN] = tail
            .as_ref()
            .try_into()
            .map_err(|_| malformed(location, "short footer read"))?;

        let metadata_len = ParquetMetaDataReader::decode_footer(&footer).map_err(|e| malformed(location, e))?;
        let metadata_start = match footer_start.checked_sub(metadata_len) {
            Some(start) if metadata_len > 0 => start,
            _ => return Err(malformed(location, format!("invalid metadata length {metadata_len}"))),
        };

        let metadata = self
            .backend
            .fetch_range(location, metadata_start..footer_start)
            .await?;
        parquet_columns(&metadata).map_err(|e| malformed(location, e))
    }

    async fn csv_header(&self, location: &ObjectLocation, size: usize) -> Result<Vec<String>, ServiceError> {
        let mut header = Vec::new();
        while header.len() < size {
            let start = header.len();
            let end = (start + CSV_HEADER_CHUNK).min(size);
            let chunk = self.backend.fetch_range(location, start..end).await?;
            header.extend_from_slice(&chunk);

            if let Some(newline) = chunk.iter().position(|b| *b == b'\n') {
                header.truncate(start + newline + 1);
                break;
            }
        }
        csv_columns(Bytes::from(header)).map_err(|e| malformed(location, e))
    }
}

#[async_trait]
impl SnapshotStore for ObjectSnapshotStore {
    async fn read_columns(&self, location: &ObjectLocation) -> Result<Vec<String>, ServiceError> {
        let size = self.backend.size(location).await?;
        let columns = if location.key.ends_with(".csv") {
            self.csv_header(location, size).await?
        } else {
            self.parquet_footer(location, size).await?
        };

        debug!(location = %location, size, columns = columns.len(), "Snapshot schema read");
        Ok(columns)
    }
}

fn malformed(location: &ObjectLocation, err: impl std::fmt::Display) -> ServiceError {
    ServiceError::Malformed(format!("{location}: {err}"))
}

/// Top-level field names from encoded Parquet file metadata.
pub fn parquet_columns(metadata: &[u8]) -> Result<Vec<String>, parquet::errors::ParquetError> {
    let metadata = ParquetMetaDataReader::decode_metadata(metadata)?;
    let file = metadata.file_metadata();
    let schema = parquet_to_arrow_schema(file.schema_descr(), file.key_value_metadata())?;
    Ok(schema.fields().iter().map(|f| f.name().clone()).collect())
}

/// Header names of a CSV object.
pub fn csv_columns(bytes: Bytes) -> Result<Vec<String>, arrow::error::ArrowError> {
    let (schema, _) = Format::default()
        .with_header(true)
        .infer_schema(Cursor::new(bytes), Some(1))?;
    Ok(schema.fields().iter().map(|f| f.name().clone()).collect())
}
