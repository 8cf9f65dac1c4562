//! Tabular blocks: a single record batch or a chunked table.

use std::fmt;

use arrow::compute::concat_batches;
use arrow_array::RecordBatch;
use arrow_schema::SchemaRef;
use snafu::prelude::*;

use crate::error::{ArrowSnafu, EmptyInputSnafu, Result, TableSchemaMismatchSnafu};

/// The two recognised block kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BlockKind {
    Batch,
    Table,
}

impl fmt::Display for BlockKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockKind::Batch => f.write_str("record batch"),
            BlockKind::Table => f.write_str("table"),
        }
    }
}

/// A schema plus an ordered list of record batch chunks sharing its fields.
#[derive(Debug, Clone)]
pub struct Table {
    schema: SchemaRef,
    batches: Vec<RecordBatch>,
}

impl Table {
    /// Create a table, checking that every chunk carries the table's fields.
    pub fn try_new(schema: SchemaRef, batches: Vec<RecordBatch>) -> Result<Self> {
        for (index, batch) in batches.iter().enumerate() {
            ensure!(
                batch.schema().fields() == schema.fields(),
                TableSchemaMismatchSnafu { index }
            );
        }
        Ok(Self { schema, batches })
    }

    /// Create a table from chunks, taking the schema of the first one.
    pub fn from_batches(batches: Vec<RecordBatch>) -> Result<Self> {
        let schema = batches
            .first()
            .map(RecordBatch::schema)
            .context(EmptyInputSnafu { what: "batches" })?;
        Self::try_new(schema, batches)
    }

    /// Chain the chunks of tables that already share `schema`, in order.
    pub fn concat(schema: SchemaRef, tables: impl IntoIterator<Item = Table>) -> Result<Self> {
        let batches = tables.into_iter().flat_map(|table| table.batches).collect();
        Self::try_new(schema, batches)
    }

    pub fn schema(&self) -> SchemaRef {
        self.schema.clone()
    }

    pub fn batches(&self) -> &[RecordBatch] {
        &self.batches
    }

    pub fn num_rows(&self) -> usize {
        self.batches.iter().map(RecordBatch::num_rows).sum()
    }

    pub fn num_columns(&self) -> usize {
        self.schema.fields().len()
    }

    /// Collapse every chunk into one contiguous batch.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        concat_batches(&self.schema, &self.batches).context(ArrowSnafu)
    }
}

/// Either a single record batch or a table.
#[derive(Debug, Clone)]
pub enum TabularBlock {
    Batch(RecordBatch),
    Table(Table),
}

impl TabularBlock {
    pub fn kind(&self) -> BlockKind {
        match self {
            TabularBlock::Batch(_) => BlockKind::Batch,
            TabularBlock::Table(_) => BlockKind::Table,
        }
    }

    pub fn schema(&self) -> SchemaRef {
        match self {
            TabularBlock::Batch(batch) => batch.schema(),
            TabularBlock::Table(table) => table.schema(),
        }
    }

    pub fn num_rows(&self) -> usize {
        match self {
            TabularBlock::Batch(batch) => batch.num_rows(),
            TabularBlock::Table(table) => table.num_rows(),
        }
    }

    pub fn num_columns(&self) -> usize {
        self.schema().fields().len()
    }

    /// `(rows, columns)`
    pub fn shape(&self) -> (usize, usize) {
        (self.num_rows(), self.num_columns())
    }

    /// Chunks making up the block; a batch is its own single chunk.
    pub fn batches(&self) -> &[RecordBatch] {
        match self {
            TabularBlock::Batch(batch) => std::slice::from_ref(batch),
            TabularBlock::Table(table) => table.batches(),
        }
    }

    /// Contiguous view of the block's rows.
    pub fn to_record_batch(&self) -> Result<RecordBatch> {
        match self {
            TabularBlock::Batch(batch) => Ok(batch.clone()),
            TabularBlock::Table(table) => table.to_record_batch(),
        }
    }
}

impl From<RecordBatch> for TabularBlock {
    fn from(batch: RecordBatch) -> Self {
        TabularBlock::Batch(batch)
    }
}

impl From<Table> for TabularBlock {
    fn from(table: Table) -> Self {
        TabularBlock::Table(table)
    }
}
