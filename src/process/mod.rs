// src/process/mod.rs

pub mod concat;
pub mod decode;
pub mod provenance;

pub use concat::TableBuilder;
pub use decode::decode_parquet;
pub use provenance::{tag_batch, Provenance, EXTRACTED_AT_COL, SOURCE_FILE_COL, TAXI_TYPE_COL};

#[cfg(test)]
pub(crate) mod fixtures;
