// src/process/decode.rs

use arrow::compute::concat_batches;
use arrow::error::ArrowError;
use arrow::record_batch::{RecordBatch, RecordBatchReader};
use bytes::Bytes;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use tracing::trace;

use crate::error::FetchFailure;

/// Read a whole in-memory Parquet file into a single batch.
pub fn decode_parquet(body: Bytes) -> Result<RecordBatch, FetchFailure> {
    let reader = ParquetRecordBatchReaderBuilder::try_new(body)?.build()?;
    let schema = reader.schema();
    let batches = reader.collect::<Result<Vec<_>, ArrowError>>()?;
    trace!(chunks = batches.len(), "decoded parquet row groups");
    Ok(concat_batches(&schema, &batches)?)
}
