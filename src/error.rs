//! Error types for schema merging, backfill concatenation and union building.

use std::path::PathBuf;

use arrow_schema::{ArrowError, DataType};
use parquet::errors::ParquetError;
use snafu::prelude::*;

use crate::block::BlockKind;

/// Errors produced by this crate.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
pub enum Error {
    /// An operation that needs at least one input got none.
    #[snafu(display("No {what} supplied, at least one is required"))]
    EmptyInput { what: &'static str },

    /// A block in a concatenation does not have the kind of the first block.
    #[snafu(display("Unsupported block kind at position {index}: expected {expected}, found {found}"))]
    UnsupportedBlockKind {
        index: usize,
        expected: BlockKind,
        found: BlockKind,
    },

    /// An arrow value has no scalar counterpart.
    #[snafu(display("Unsupported value kind: {data_type:?}"))]
    UnsupportedValueKind { data_type: DataType },

    /// A null column could not be cast to the target field type.
    #[snafu(display("Failed to cast null column to {data_type:?} for field `{field}`: {source}"))]
    Cast {
        field: String,
        data_type: DataType,
        source: ArrowError,
    },

    /// A non-nullable field is missing from a block and cannot be filled with nulls.
    #[snafu(display("Field `{field}` is non-nullable and cannot be backfilled with nulls"))]
    NonNullableBackfill { field: String },

    /// A type bucket could not be turned into a single typed array.
    #[snafu(display("Failed to build array for bucket {tag}: {reason}"))]
    BucketArrayConstruction { tag: usize, reason: String },

    /// Arrow rejected the assembled dense union.
    #[snafu(display("Failed to assemble union array: {source}"))]
    UnionAssembly { source: ArrowError },

    /// A table chunk does not carry the table's fields.
    #[snafu(display("Table chunk {index} does not match the table schema"))]
    TableSchemaMismatch { index: usize },

    #[snafu(display("Arrow error: {source}"))]
    Arrow { source: ArrowError },

    #[snafu(display("Parquet error: {source}"))]
    Parquet { source: ParquetError },

    #[snafu(display("IO error on {}: {source}", path.display()))]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_kind_error_names_both_kinds() {
        let error = Error::UnsupportedBlockKind {
            index: 2,
            expected: BlockKind::Batch,
            found: BlockKind::Table,
        };
        let message = error.to_string();
        assert!(message.contains("position 2"));
        assert!(message.contains("record batch"));
        assert!(message.contains("table"));
    }

    #[test]
    fn empty_input_mentions_what_was_missing() {
        let error = Error::EmptyInput { what: "schemas" };
        assert!(error.to_string().contains("schemas"));
    }
}
