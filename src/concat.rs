//! Concatenation of blocks whose column sets differ.

use std::sync::Arc;

use arrow::compute::concat_batches;
use arrow_array::RecordBatch;
use snafu::prelude::*;
use tracing::debug;

use crate::block::{BlockKind, Table, TabularBlock};
use crate::error::{ArrowSnafu, EmptyInputSnafu, Result, UnsupportedBlockKindSnafu};
use crate::reconcile::{reconcile_batch, reconcile_table};
use crate::schema::merge_schemas;

/// Concatenate `blocks` under the merged schema of all of them.
///
/// Every block must have the kind of the first one. Each block is reconciled
/// against the merged schema, backfilling the fields it lacks with nulls, and
/// the results are appended in input order. Batches are concatenated into one
/// batch; tables are concatenated by chaining their chunks.
///
/// Arrow does not allow nulls under a non-nullable field, so a non-nullable
/// field that is absent from any input fails with
/// [`Error::NonNullableBackfill`](crate::Error::NonNullableBackfill) instead of
/// being backfilled.
pub fn concat_with_backfill(blocks: &[TabularBlock]) -> Result<TabularBlock> {
    let first = blocks.first().context(EmptyInputSnafu { what: "blocks" })?;
    let expected = first.kind();

    let output = match first {
        TabularBlock::Batch(_) => {
            let batches = blocks
                .iter()
                .enumerate()
                .map(|(index, block)| match block {
                    TabularBlock::Batch(batch) => Ok(batch),
                    other => kind_mismatch(index, expected, other),
                })
                .collect::<Result<Vec<_>>>()?;
            TabularBlock::Batch(concat_batches_with_backfill(&batches)?)
        }
        TabularBlock::Table(_) => {
            let tables = blocks
                .iter()
                .enumerate()
                .map(|(index, block)| match block {
                    TabularBlock::Table(table) => Ok(table),
                    other => kind_mismatch(index, expected, other),
                })
                .collect::<Result<Vec<_>>>()?;
            TabularBlock::Table(concat_tables_with_backfill(&tables)?)
        }
    };

    debug!(
        kind = %expected,
        inputs = blocks.len(),
        rows = output.num_rows(),
        columns = output.num_columns(),
        "concatenated blocks with backfill"
    );
    Ok(output)
}

fn kind_mismatch<T>(index: usize, expected: BlockKind, block: &TabularBlock) -> Result<T> {
    UnsupportedBlockKindSnafu {
        index,
        expected,
        found: block.kind(),
    }
    .fail()
}

/// Merge, reconcile and append record batches into one contiguous batch.
fn concat_batches_with_backfill(batches: &[&RecordBatch]) -> Result<RecordBatch> {
    let merged = Arc::new(merge_schemas(
        batches.iter().map(|batch| batch.schema_ref().as_ref()),
    )?);
    let reconciled = batches
        .iter()
        .map(|batch| reconcile_batch(batch, &merged))
        .collect::<Result<Vec<_>>>()?;
    concat_batches(&merged, &reconciled).context(ArrowSnafu)
}

/// Merge, reconcile and chain the chunks of `tables` into one table.
pub(crate) fn concat_tables_with_backfill(tables: &[&Table]) -> Result<Table> {
    let schemas: Vec<_> = tables.iter().map(|table| table.schema()).collect();
    let merged = Arc::new(merge_schemas(schemas.iter().map(|schema| schema.as_ref()))?);
    let reconciled = tables
        .iter()
        .map(|table| reconcile_table(table, &merged))
        .collect::<Result<Vec<_>>>()?;
    Table::concat(merged, reconciled)
}
