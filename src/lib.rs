//! Concatenation of arrow record batches and tables whose column sets differ,
//! and dense union columns built from mixed scalar sequences.
//!
//! [`concat_with_backfill`] merges the schemas of its inputs with
//! [`merge_schemas`], reshapes every input to that schema with
//! [`reconcile_columns`] (missing fields become all-null columns) and appends
//! the results in order.
//!
//! [`partition_by_type`] splits a sequence of [`Scalar`]s into per-kind buckets
//! and [`build_union_array`] turns those buckets into a dense [`UnionArray`]
//! that reads back as the original sequence.
//!
//! [`UnionArray`]: arrow_array::UnionArray

pub mod block;
pub mod concat;
pub mod config;
pub mod error;
pub mod io;
pub mod reconcile;
pub mod schema;
pub mod union;

pub use block::{BlockKind, Table, TabularBlock};
pub use concat::concat_with_backfill;
pub use config::ParquetOptions;
pub use error::{Error, Result};
pub use io::{
    concat_parquet_files, concat_parquet_files_async, read_parquet, read_parquet_async,
    write_parquet, write_parquet_async,
};
pub use reconcile::{backfill_column, build_index_mapping, reconcile_columns};
pub use schema::merge_schemas;
pub use union::{
    Scalar, ScalarKind, Slot, TypeBucket, TypePartition, build_union_array, partition_by_type,
    to_union_array, union_to_scalars,
};
