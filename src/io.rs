//! Reading and writing parquet files as fully materialised tables.
//!
//! These helpers load every input into memory before concatenating; they are
//! meant for merging parquet files whose column sets differ.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use arrow_array::RecordBatch;
use arrow_schema::SchemaRef;
use futures_util::TryStreamExt;
use futures_util::future::try_join_all;
use parquet::arrow::ArrowWriter;
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use parquet::arrow::async_reader::ParquetRecordBatchStreamBuilder;
use parquet::arrow::async_writer::AsyncArrowWriter;
use snafu::prelude::*;
use tokio::io::BufWriter as AsyncBufWriter;
use tracing::{debug, info};

use crate::block::{Table, TabularBlock};
use crate::concat::concat_tables_with_backfill;
use crate::config::ParquetOptions;
use crate::error::{ArrowSnafu, EmptyInputSnafu, IoSnafu, ParquetSnafu, Result};

const WRITE_BUFFER_CAPACITY: usize = 1 << 20;

/// Read a whole parquet file into a table, one chunk per reader batch.
pub fn read_parquet(path: impl AsRef<Path>, options: &ParquetOptions) -> Result<Table> {
    let path = path.as_ref();
    let file = File::open(path).context(IoSnafu { path })?;
    let builder = ParquetRecordBatchReaderBuilder::try_new(file)
        .context(ParquetSnafu)?
        .with_batch_size(options.batch_size);
    let schema = builder.schema().clone();
    let reader = builder.build().context(ParquetSnafu)?;

    let batches = reader.collect::<Result<Vec<_>, _>>().context(ArrowSnafu)?;
    debug!(path = %path.display(), chunks = batches.len(), "read parquet file");
    Table::try_new(schema, batches)
}

/// Async variant of [`read_parquet`].
pub async fn read_parquet_async(path: impl AsRef<Path>, options: &ParquetOptions) -> Result<Table> {
    let path = path.as_ref();
    let file = tokio::fs::File::open(path).await.context(IoSnafu { path })?;
    let builder = ParquetRecordBatchStreamBuilder::new(file)
        .await
        .context(ParquetSnafu)?
        .with_batch_size(options.batch_size);
    let schema = builder.schema().clone();
    let stream = builder.build().context(ParquetSnafu)?;

    let batches: Vec<_> = stream.try_collect().await.context(ParquetSnafu)?;
    debug!(path = %path.display(), chunks = batches.len(), "read parquet file");
    Table::try_new(schema, batches)
}

/// Write every chunk of `block` to a parquet file at `path`.
pub fn write_parquet(
    block: &TabularBlock,
    path: impl AsRef<Path>,
    options: &ParquetOptions,
) -> Result<()> {
    write_batches(block.schema(), block.batches(), path.as_ref(), options)
}

fn write_batches(
    schema: SchemaRef,
    batches: &[RecordBatch],
    path: &Path,
    options: &ParquetOptions,
) -> Result<()> {
    let file = File::create(path).context(IoSnafu { path })?;
    let buffered = BufWriter::with_capacity(WRITE_BUFFER_CAPACITY, file);
    let mut writer = ArrowWriter::try_new(buffered, schema, options.writer_properties.clone())
        .context(ParquetSnafu)?;

    for batch in batches {
        writer.write(batch).context(ParquetSnafu)?;
    }
    writer.close().context(ParquetSnafu)?;
    debug!(path = %path.display(), chunks = batches.len(), "wrote parquet file");
    Ok(())
}

/// Async variant of [`write_parquet`].
pub async fn write_parquet_async(
    block: &TabularBlock,
    path: impl AsRef<Path>,
    options: &ParquetOptions,
) -> Result<()> {
    write_batches_async(block.schema(), block.batches(), path.as_ref(), options).await
}

async fn write_batches_async(
    schema: SchemaRef,
    batches: &[RecordBatch],
    path: &Path,
    options: &ParquetOptions,
) -> Result<()> {
    let file = tokio::fs::File::create(path)
        .await
        .context(IoSnafu { path })?;
    let buffered = AsyncBufWriter::with_capacity(WRITE_BUFFER_CAPACITY, file);
    let mut writer =
        AsyncArrowWriter::try_new(buffered, schema, options.writer_properties.clone())
            .context(ParquetSnafu)?;

    for batch in batches {
        writer.write(batch).await.context(ParquetSnafu)?;
    }
    writer.close().await.context(ParquetSnafu)?;
    debug!(path = %path.display(), chunks = batches.len(), "wrote parquet file");
    Ok(())
}

fn concat_tables(tables: &[Table]) -> Result<Table> {
    let tables: Vec<&Table> = tables.iter().collect();
    concat_tables_with_backfill(&tables)
}

fn log_merged(inputs: usize, merged: &Table, output: &Path) {
    info!(
        inputs,
        rows = merged.num_rows(),
        columns = merged.num_columns(),
        output = %output.display(),
        "merged parquet files with backfill"
    );
}

/// Read `inputs`, concatenate them under their merged schema and write the
/// result to `output`. Returns the merged table.
pub fn concat_parquet_files<P: AsRef<Path>>(
    inputs: &[P],
    output: impl AsRef<Path>,
    options: &ParquetOptions,
) -> Result<Table> {
    ensure!(!inputs.is_empty(), EmptyInputSnafu { what: "parquet files" });

    let tables = inputs
        .iter()
        .map(|path| read_parquet(path, options))
        .collect::<Result<Vec<_>>>()?;
    let merged = concat_tables(&tables)?;

    let output = output.as_ref();
    write_batches(merged.schema(), merged.batches(), output, options)?;
    log_merged(inputs.len(), &merged, output);
    Ok(merged)
}

/// Async variant of [`concat_parquet_files`]; inputs are read concurrently.
pub async fn concat_parquet_files_async<P: AsRef<Path>>(
    inputs: &[P],
    output: impl AsRef<Path>,
    options: &ParquetOptions,
) -> Result<Table> {
    ensure!(!inputs.is_empty(), EmptyInputSnafu { what: "parquet files" });

    let tables = try_join_all(inputs.iter().map(|path| read_parquet_async(path, options))).await?;
    let merged = concat_tables(&tables)?;

    let output = output.as_ref();
    write_batches_async(merged.schema(), merged.batches(), output, options).await?;
    log_merged(inputs.len(), &merged, output);
    Ok(merged)
}
