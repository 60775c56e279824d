//! The shared "current processing day" record: a CSV object whose `base`
//! column holds the reference date in its first row.

use std::io::Cursor;
use std::sync::Arc;

use arrow::array::{Array, StringArray};
use arrow::csv::reader::Format;
use arrow::csv::ReaderBuilder;
use arrow::datatypes::{DataType, Field, Schema};
use async_trait::async_trait;
use bytes::Bytes;
use tracing::info;

use lakesync_catalog::{ObjectLocation, ReferenceDateSource, ServiceError};
use lakesync_core::Day;

use crate::backend::ObjectBackend;

pub const REFERENCE_COLUMN: &str = "base";

pub struct CsvReferenceDate {
    backend: Arc<ObjectBackend>,
}

impl CsvReferenceDate {
    pub fn new(backend: Arc<ObjectBackend>) -> Self {
        Self { backend }
    }
}

#[async_trait]
impl ReferenceDateSource for CsvReferenceDate {
    async fn reference_day(&self, location: &ObjectLocation) -> Result<Day, ServiceError> {
        let bytes = self.backend.fetch(location).await?;
        let raw = first_value(bytes, REFERENCE_COLUMN)?;
        let day = Day::parse_lenient(&raw)
            .map_err(|e| ServiceError::Malformed(format!("{location}: {e}")))?;
        info!(location = %location, reference_day = %day, "Reference date read");
        Ok(day)
    }
}

/// First-row value of `column`, read as text.
pub fn first_value(bytes: Bytes, column: &str) -> Result<String, ServiceError> {
    let malformed = |e: arrow::error::ArrowError| ServiceError::Malformed(e.to_string());

    // Infer only the header, then read every field as text so dates are not
    // coerced into Date32.
    let (inferred, _) = Format::default()
        .with_header(true)
        .infer_schema(Cursor::new(bytes.clone()), Some(1))
        .map_err(malformed)?;
    let schema = Schema::new(
        inferred
            .fields()
            .iter()
            .map(|f| Field::new(f.name(), DataType::Utf8, true))
            .collect::<Vec<_>>(),
    );
    let index = schema
        .index_of(column)
        .map_err(|_| ServiceError::Malformed(format!("column '{column}' not present")))?;

    let mut reader = ReaderBuilder::new(Arc::new(schema))
        .with_header(true)
        .build(Cursor::new(bytes))
        .map_err(malformed)?;
    let batch = reader
        .next()
        .transpose()
        .map_err(malformed)?
        .ok_or_else(|| ServiceError::Malformed("no data rows".into()))?;

    let values = batch
        .column(index)
        .as_any()
        .downcast_ref::<StringArray>()
        .ok_or_else(|| ServiceError::Malformed(format!("column '{column}' is not text")))?;
    if values.is_empty() || values.is_null(0) {
        return Err(ServiceError::Malformed(format!("column '{column}' is empty")));
    }
    Ok(values.value(0).trim().to_string())
}
