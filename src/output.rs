// src/output.rs

use anyhow::{Context, Result};
use parquet::arrow::ArrowWriter;
use parquet::basic::Compression;
use parquet::file::properties::WriterProperties;
use std::{fs, fs::File, path::Path};
use tracing::info;

use crate::ingest::ResultTable;

/// Write the table as one Snappy-compressed Parquet file at `path`.
/// Returns the number of rows written; an empty table writes nothing.
pub fn write_parquet(table: &ResultTable, path: impl AsRef<Path>) -> Result<usize> {
    let path = path.as_ref();
    let Some(batch) = table.batch() else {
        info!(path = %path.display(), "empty table; no file written");
        return Ok(0);
    };

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("creating output directory {:?}", parent))?;
    }

    let file = File::create(path).with_context(|| format!("creating output file {:?}", path))?;
    let props = WriterProperties::builder()
        .set_compression(Compression::SNAPPY)
        .build();
    let mut writer = ArrowWriter::try_new(file, batch.schema(), Some(props))
        .context("creating Arrow writer for trips")?;
    writer.write(batch).context("writing trips batch")?;
    writer.close().context("closing trips writer")?;

    info!(path = %path.display(), rows = batch.num_rows(), "wrote parquet");
    Ok(batch.num_rows())
}
