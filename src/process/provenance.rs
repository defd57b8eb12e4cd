// src/process/provenance.rs

use arrow::array::{ArrayRef, StringArray, TimestampMicrosecondArray};
use arrow::datatypes::{DataType, Field, Schema, TimeUnit};
use arrow::error::ArrowError;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use chrono::{DateTime, Utc};
use std::sync::Arc;

pub const TAXI_TYPE_COL: &str = "taxi_type";
pub const EXTRACTED_AT_COL: &str = "extracted_at";
pub const SOURCE_FILE_COL: &str = "source_file";

/// Lineage for one downloaded file.
#[derive(Debug, Clone, Copy)]
pub struct Provenance<'a> {
    pub taxi_type: &'a str,
    /// When the file was fetched, not the trips' own time.
    pub extracted_at: DateTime<Utc>,
    pub source_file: &'a str,
}

/// Append `taxi_type`, `extracted_at` and `source_file` as the last three
/// columns. Existing columns with those names are replaced.
pub fn tag_batch(batch: &RecordBatch, prov: &Provenance<'_>) -> Result<RecordBatch, ArrowError> {
    let rows = batch.num_rows();
    let reserved = [TAXI_TYPE_COL, EXTRACTED_AT_COL, SOURCE_FILE_COL];

    let mut fields = Vec::with_capacity(batch.num_columns() + 3);
    let mut columns = Vec::with_capacity(batch.num_columns() + 3);
    for (field, column) in batch.schema().fields().iter().zip(batch.columns()) {
        if reserved.contains(&field.name().as_str()) {
            continue;
        }
        fields.push(field.as_ref().clone());
        columns.push(Arc::clone(column));
    }

    fields.push(Field::new(TAXI_TYPE_COL, DataType::Utf8, false));
    columns.push(Arc::new(StringArray::from_iter_values(
        std::iter::repeat(prov.taxi_type).take(rows),
    )) as ArrayRef);

    fields.push(Field::new(
        EXTRACTED_AT_COL,
        DataType::Timestamp(TimeUnit::Microsecond, None),
        false,
    ));
    columns.push(Arc::new(TimestampMicrosecondArray::from_value(
        prov.extracted_at.timestamp_micros(),
        rows,
    )) as ArrayRef);

    fields.push(Field::new(SOURCE_FILE_COL, DataType::Utf8, false));
    columns.push(Arc::new(StringArray::from_iter_values(
        std::iter::repeat(prov.source_file).take(rows),
    )) as ArrayRef);

    let schema = Schema::new_with_metadata(fields, batch.schema().metadata().clone());
    RecordBatch::try_new_with_options(
        Arc::new(schema),
        columns,
        &RecordBatchOptions::new().with_row_count(Some(rows)),
    )
}
