// Small in-memory trip files for tests.

use arrow::array::{Array, ArrayRef, Float64Array, Int64Array, ListArray};
use arrow::datatypes::{DataType, Field, Int64Type, Schema};
use arrow::record_batch::RecordBatch;
use bytes::Bytes;
use parquet::arrow::ArrowWriter;
use std::sync::Arc;

pub fn trip_batch(vendor_ids: &[i64], distances: &[f64]) -> RecordBatch {
    let schema = Schema::new(vec![
        Field::new("VendorID", DataType::Int64, true),
        Field::new("trip_distance", DataType::Float64, true),
    ]);
    RecordBatch::try_new(
        Arc::new(schema),
        vec![
            Arc::new(Int64Array::from(vendor_ids.to_vec())) as ArrayRef,
            Arc::new(Float64Array::from(distances.to_vec())) as ArrayRef,
        ],
    )
    .expect("fixture batch")
}

pub fn to_parquet(batch: &RecordBatch) -> Bytes {
    let mut buf = Vec::new();
    let mut writer = ArrowWriter::try_new(&mut buf, batch.schema(), None).expect("writer");
    writer.write(batch).expect("write");
    writer.close().expect("close");
    Bytes::from(buf)
}

/// A file whose `VendorID` is a list column, which no flat schema can absorb.
pub fn nested_vendor_parquet() -> Bytes {
    let list = ListArray::from_iter_primitive::<Int64Type, _, _>(vec![Some(vec![Some(9)])]);
    let schema = Schema::new(vec![Field::new(
        "VendorID",
        list.data_type().clone(),
        true,
    )]);
    let batch = RecordBatch::try_new(Arc::new(schema), vec![Arc::new(list) as ArrayRef])
        .expect("nested fixture batch");
    to_parquet(&batch)
}
