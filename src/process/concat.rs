// src/process/concat.rs

use arrow::array::{new_null_array, ArrayRef};
use arrow::compute::{cast, concat_batches};
use arrow::datatypes::{DataType, Field, Schema, SchemaRef, TimeUnit};
use arrow::error::ArrowError;
use arrow::record_batch::{RecordBatch, RecordBatchOptions};
use std::{collections::HashMap, sync::Arc};
use tracing::debug;

/// Accumulates batches for a row-wise union, keeping their order.
///
/// Monthly files drift: columns appear over time and the same column can be
/// published with a different integer width or as a double. While every
/// batch shares one schema they are kept as-is. Once they disagree, every
/// batch is aligned to the union of columns in first-seen order: gaps become
/// nulls and conflicting types are widened. A batch that cannot be aligned is
/// rejected and leaves the builder untouched.
#[derive(Debug, Default)]
pub struct TableBuilder {
    batches: Vec<RecordBatch>,
    columns: Vec<(String, DataType)>,
    index: HashMap<String, usize>,
    /// Set once batches have been aligned to a unified schema.
    unified: Option<SchemaRef>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.batches.len()
    }

    pub fn is_empty(&self) -> bool {
        self.batches.is_empty()
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    pub fn push(&mut self, batch: RecordBatch) -> Result<(), ArrowError> {
        if self.batches.is_empty() {
            for field in batch.schema_ref().fields() {
                self.index.insert(field.name().clone(), self.columns.len());
                self.columns
                    .push((field.name().clone(), field.data_type().clone()));
            }
            self.batches.push(batch);
            return Ok(());
        }

        if self.unified.is_none()
            && self.batches[0].schema_ref().fields() == batch.schema_ref().fields()
        {
            self.batches.push(batch);
            return Ok(());
        }

        let mut columns = self.columns.clone();
        let mut index = self.index.clone();
        for field in batch.schema_ref().fields() {
            match index.get(field.name()) {
                Some(&i) => {
                    let widened = widen(&columns[i].1, field.data_type()).ok_or_else(|| {
                        ArrowError::SchemaError(format!(
                            "column {:?} is {} here but {} before",
                            field.name(),
                            field.data_type(),
                            columns[i].1
                        ))
                    })?;
                    columns[i].1 = widened;
                }
                None => {
                    index.insert(field.name().clone(), columns.len());
                    columns.push((field.name().clone(), field.data_type().clone()));
                }
            }
        }

        // Align eagerly so that a cast failure rejects this batch only.
        let schema = unified_schema(&columns);
        let aligned = self
            .batches
            .iter()
            .chain(std::iter::once(&batch))
            .map(|b| align(b, &schema))
            .collect::<Result<Vec<_>, _>>()?;

        if self.unified.is_none() {
            debug!(columns = columns.len(), "schemas differ; aligning batches");
        }
        self.batches = aligned;
        self.columns = columns;
        self.index = index;
        self.unified = Some(schema);
        Ok(())
    }

    /// Concatenate everything pushed so far. `None` if nothing was pushed.
    pub fn finish(self) -> Result<Option<RecordBatch>, ArrowError> {
        let Some(first) = self.batches.first() else {
            return Ok(None);
        };
        let schema = self.unified.clone().unwrap_or_else(|| first.schema());
        concat_batches(&schema, &self.batches).map(Some)
    }
}

fn unified_schema(columns: &[(String, DataType)]) -> SchemaRef {
    Arc::new(Schema::new(
        columns
            .iter()
            .map(|(name, dt)| Field::new(name, dt.clone(), true))
            .collect::<Vec<_>>(),
    ))
}

/// (signed, bit width) for integer types.
fn int_width(dt: &DataType) -> Option<(bool, u8)> {
    match dt {
        DataType::Int8 => Some((true, 8)),
        DataType::Int16 => Some((true, 16)),
        DataType::Int32 => Some((true, 32)),
        DataType::Int64 => Some((true, 64)),
        DataType::UInt8 => Some((false, 8)),
        DataType::UInt16 => Some((false, 16)),
        DataType::UInt32 => Some((false, 32)),
        DataType::UInt64 => Some((false, 64)),
        _ => None,
    }
}

fn int_type(signed: bool, bits: u8) -> DataType {
    match (signed, bits) {
        (true, 8) => DataType::Int8,
        (true, 16) => DataType::Int16,
        (true, 32) => DataType::Int32,
        (true, _) => DataType::Int64,
        (false, 8) => DataType::UInt8,
        (false, 16) => DataType::UInt16,
        (false, 32) => DataType::UInt32,
        (false, _) => DataType::UInt64,
    }
}

/// Smallest common type for a column seen as both `a` and `b`.
///
/// Integers keep the wider width (mixed signedness goes to Int64); a float or
/// decimal on either side gives Float64. Nested types only match themselves.
fn widen(a: &DataType, b: &DataType) -> Option<DataType> {
    match (a, b) {
        _ if a == b => Some(a.clone()),
        (DataType::Null, other) | (other, DataType::Null) => Some(other.clone()),
        _ if a.is_nested() || b.is_nested() => None,
        (DataType::Timestamp(_, tz_a), DataType::Timestamp(_, tz_b)) if tz_a == tz_b => {
            Some(DataType::Timestamp(TimeUnit::Microsecond, tz_a.clone()))
        }
        _ => match (int_width(a), int_width(b)) {
            (Some((sa, wa)), Some((sb, wb))) if sa == sb => Some(int_type(sa, wa.max(wb))),
            (Some(_), Some(_)) => Some(DataType::Int64),
            _ if a.is_numeric() && b.is_numeric() => Some(DataType::Float64),
            _ => Some(DataType::Utf8),
        },
    }
}

fn align(batch: &RecordBatch, schema: &SchemaRef) -> Result<RecordBatch, ArrowError> {
    let rows = batch.num_rows();
    let columns = schema
        .fields()
        .iter()
        .map(|field| match batch.column_by_name(field.name()) {
            Some(col) if col.data_type() == field.data_type() => Ok(Arc::clone(col)),
            Some(col) => cast(col, field.data_type()),
            None => Ok(new_null_array(field.data_type(), rows)),
        })
        .collect::<Result<Vec<ArrayRef>, ArrowError>>()?;
    RecordBatch::try_new_with_options(
        Arc::clone(schema),
        columns,
        &RecordBatchOptions::new().with_row_count(Some(rows)),
    )
}
