//! Reshaping a block's columns to match a target schema.

use arrow::compute::cast;
use arrow_array::{ArrayRef, NullArray, RecordBatch, RecordBatchOptions};
use arrow_schema::{Field, Schema, SchemaRef};
use snafu::prelude::*;
use tracing::debug;

use crate::block::{BlockKind, Table, TabularBlock};
use crate::error::{ArrowSnafu, CastSnafu, NonNullableBackfillSnafu, Result};
use crate::schema::FieldKey;

/// Build a one-time column index mapping from a source schema to a target schema.
/// Each entry is `Some(source_index)` if an identical field (name, type and
/// nullability) exists in the source, otherwise `None`.
pub fn build_index_mapping(source_schema: &Schema, target_schema: &Schema) -> Vec<Option<usize>> {
    target_schema
        .fields()
        .iter()
        .map(|target_field| {
            let target_key = FieldKey::of(target_field);
            source_schema
                .fields()
                .iter()
                .position(|source_field| FieldKey::of(source_field) == target_key)
        })
        .collect()
}

/// A column of `rows` nulls cast to the type of `field`.
pub fn backfill_column(field: &Field, rows: usize) -> Result<ArrayRef> {
    ensure!(
        field.is_nullable(),
        NonNullableBackfillSnafu {
            field: field.name().clone()
        }
    );
    cast(&NullArray::new(rows), field.data_type()).context(CastSnafu {
        field: field.name().clone(),
        data_type: field.data_type().clone(),
    })
}

/// Adjust a `RecordBatch` to match `target_schema` using a precomputed index mapping.
fn adjust_with_mapping(
    batch: &RecordBatch,
    target_schema: &SchemaRef,
    mapping: &[Option<usize>],
) -> Result<RecordBatch> {
    let mut new_columns: Vec<ArrayRef> = Vec::with_capacity(mapping.len());

    for (i, maybe_src_idx) in mapping.iter().enumerate() {
        match maybe_src_idx {
            Some(src_idx) => new_columns.push(batch.column(*src_idx).clone()),
            None => new_columns.push(backfill_column(target_schema.field(i), batch.num_rows())?),
        }
    }

    // An explicit row count keeps zero-column targets valid.
    let options = RecordBatchOptions::new().with_row_count(Some(batch.num_rows()));
    RecordBatch::try_new_with_options(target_schema.clone(), new_columns, &options)
        .context(ArrowSnafu)
}

fn log_reconcile(kind: BlockKind, rows: usize, mapping: &[Option<usize>]) {
    let backfilled = mapping.iter().filter(|entry| entry.is_none()).count();
    debug!(kind = %kind, rows, backfilled, "reconciling block columns");
}

/// Reshape one record batch to `target`.
pub(crate) fn reconcile_batch(batch: &RecordBatch, target: &SchemaRef) -> Result<RecordBatch> {
    let mapping = build_index_mapping(batch.schema_ref(), target);
    log_reconcile(BlockKind::Batch, batch.num_rows(), &mapping);
    adjust_with_mapping(batch, target, &mapping)
}

/// Reshape every chunk of a table to `target`.
pub(crate) fn reconcile_table(table: &Table, target: &SchemaRef) -> Result<Table> {
    let mapping = build_index_mapping(&table.schema(), target);
    log_reconcile(BlockKind::Table, table.num_rows(), &mapping);
    let batches = table
        .batches()
        .iter()
        .map(|batch| adjust_with_mapping(batch, target, &mapping))
        .collect::<Result<Vec<_>>>()?;
    Table::try_new(target.clone(), batches)
}

/// Produce a new block whose fields are exactly those of `target`, in order.
///
/// Columns whose field also exists in the block are taken unchanged; every
/// other field is backfilled with an all-null column of the block's row count.
/// A table is reconciled chunk by chunk.
pub fn reconcile_columns(block: &TabularBlock, target: &SchemaRef) -> Result<TabularBlock> {
    match block {
        TabularBlock::Batch(batch) => Ok(TabularBlock::Batch(reconcile_batch(batch, target)?)),
        TabularBlock::Table(table) => Ok(TabularBlock::Table(reconcile_table(table, target)?)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use arrow_array::{Array, BooleanArray, Float64Array, Int32Array, StringArray};
    use arrow_schema::{DataType, UnionFields, UnionMode};

    fn source_batch() -> RecordBatch {
        let schema = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int32, true),
            Field::new("name", DataType::Utf8, true),
        ]));
        RecordBatch::try_new(
            schema,
            vec![
                Arc::new(Int32Array::from(vec![1, 2, 3])),
                Arc::new(StringArray::from(vec![Some("a"), None, Some("c")])),
            ],
        )
        .unwrap()
    }

    #[test]
    fn mapping_matches_on_name_type_and_nullability() {
        let source = source_batch().schema();
        let target = Schema::new(vec![
            Field::new("name", DataType::Utf8, true),
            Field::new("id", DataType::Int64, true),
            Field::new("id", DataType::Int32, true),
        ]);

        let mapping = build_index_mapping(&source, &target);
        assert_eq!(mapping, vec![Some(1), None, Some(0)]);
    }

    #[test]
    fn reconcile_reorders_and_backfills_missing_fields() {
        let target = Arc::new(Schema::new(vec![
            Field::new("name", DataType::Utf8, true),
            Field::new("score", DataType::Float64, true),
            Field::new("id", DataType::Int32, true),
        ]));

        let reconciled = reconcile_columns(&TabularBlock::Batch(source_batch()), &target).unwrap();
        let batch = reconciled.to_record_batch().unwrap();

        assert_eq!(batch.schema(), target);
        assert_eq!(batch.num_rows(), 3);
        let score = batch
            .column(1)
            .as_any()
            .downcast_ref::<Float64Array>()
            .unwrap();
        assert_eq!(score.null_count(), 3);
        assert_eq!(batch.column(2).as_ref(), source_batch().column(0).as_ref());
    }

    #[test]
    fn same_name_different_type_is_backfilled() {
        let target = Arc::new(Schema::new(vec![Field::new("id", DataType::Boolean, true)]));

        let reconciled = reconcile_columns(&TabularBlock::Batch(source_batch()), &target).unwrap();
        let batch = reconciled.to_record_batch().unwrap();
        let ids = batch
            .column(0)
            .as_any()
            .downcast_ref::<BooleanArray>()
            .unwrap();
        assert_eq!(ids.len(), 3);
        assert_eq!(ids.null_count(), 3);
    }

    #[test]
    fn table_is_reconciled_chunk_by_chunk() {
        let table = Table::from_batches(vec![source_batch(), source_batch()]).unwrap();
        let target = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int32, true),
            Field::new("flag", DataType::Boolean, true),
        ]));

        let reconciled = reconcile_columns(&TabularBlock::Table(table), &target).unwrap();
        match reconciled {
            TabularBlock::Table(table) => {
                assert_eq!(table.batches().len(), 2);
                assert_eq!(table.num_rows(), 6);
                assert_eq!(table.schema(), target);
            }
            other => panic!("expected Table, got {:?}", other.kind()),
        }
    }

    #[test]
    fn empty_target_keeps_row_count() {
        let target = Arc::new(Schema::empty());
        let reconciled = reconcile_columns(&TabularBlock::Batch(source_batch()), &target).unwrap();
        assert_eq!(reconciled.shape(), (3, 0));
    }

    #[test]
    fn non_nullable_missing_field_is_rejected() {
        let target = Arc::new(Schema::new(vec![Field::new("age", DataType::Int32, false)]));
        let error = reconcile_columns(&TabularBlock::Batch(source_batch()), &target).unwrap_err();
        assert!(matches!(
            error,
            crate::Error::NonNullableBackfill { ref field } if field == "age"
        ));
    }

    #[test]
    fn backfill_column_casts_nulls_to_field_type() {
        let field = Field::new("tags", DataType::Utf8, true);
        let column = backfill_column(&field, 4).unwrap();
        assert_eq!(column.data_type(), &DataType::Utf8);
        assert_eq!(column.len(), 4);
        assert_eq!(column.null_count(), 4);
    }

    #[test]
    fn backfill_column_reports_uncastable_type() {
        let union_type = DataType::Union(
            UnionFields::new(vec![0], vec![Field::new("int", DataType::Int64, true)]),
            UnionMode::Dense,
        );
        let field = Field::new("u", union_type, true);

        let error = backfill_column(&field, 3).unwrap_err();
        assert!(matches!(error, crate::Error::Cast { ref field, .. } if field == "u"));
    }

    #[test]
    fn reconcile_propagates_cast_failure() {
        let run_ends = Arc::new(Field::new("run_ends", DataType::Int32, false));
        let values = Arc::new(Field::new("values", DataType::Utf8, true));
        let target = Arc::new(Schema::new(vec![
            Field::new("id", DataType::Int32, true),
            Field::new("m", DataType::RunEndEncoded(run_ends, values), true),
        ]));

        let error = reconcile_columns(&TabularBlock::Batch(source_batch()), &target).unwrap_err();
        assert!(matches!(error, crate::Error::Cast { ref field, .. } if field == "m"));
    }
}
