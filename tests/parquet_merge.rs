use std::path::PathBuf;
use std::sync::Arc;

use arrow_array::{Array, Int32Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use rust_backfill_merge::{
    ParquetOptions, TabularBlock, concat_parquet_files, concat_parquet_files_async, read_parquet,
    write_parquet,
};
use tempfile::TempDir;

fn write_inputs(dir: &TempDir) -> Vec<PathBuf> {
    let schema1 = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int32, true),
        Field::new("name", DataType::Utf8, true),
    ]));
    let batch1 = RecordBatch::try_new(
        schema1,
        vec![
            Arc::new(Int32Array::from(vec![1, 2, 3])),
            Arc::new(StringArray::from(vec![
                Some("Alice"),
                Some("Bob"),
                Some("Charlie"),
            ])),
        ],
    )
    .unwrap();

    let schema2 = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int32, true),
        Field::new("age", DataType::Int32, true),
    ]));
    let batch2 = RecordBatch::try_new(
        schema2,
        vec![
            Arc::new(Int32Array::from(vec![4, 5])),
            Arc::new(Int32Array::from(vec![Some(30), None])),
        ],
    )
    .unwrap();

    let paths = vec![dir.path().join("file1.parquet"), dir.path().join("file2.parquet")];
    let options = ParquetOptions::default();
    write_parquet(&TabularBlock::Batch(batch1), &paths[0], &options).unwrap();
    write_parquet(&TabularBlock::Batch(batch2), &paths[1], &options).unwrap();
    paths
}

fn assert_merged(batch: &RecordBatch) {
    let names: Vec<&str> = batch
        .schema_ref()
        .fields()
        .iter()
        .map(|f| f.name().as_str())
        .collect();
    assert_eq!(names, vec!["id", "name", "age"]);
    assert_eq!(batch.num_rows(), 5);

    let name = batch.column_by_name("name").unwrap();
    let age = batch.column_by_name("age").unwrap();
    assert_eq!(name.null_count(), 2);
    assert!(name.is_null(3) && name.is_null(4));
    assert_eq!(age.null_count(), 4);
    assert!(age.is_valid(3));
}

#[test]
fn merges_parquet_files_with_backfill() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = write_inputs(&dir);
    let output = dir.path().join("merged.parquet");

    let merged = concat_parquet_files(&inputs, &output, &ParquetOptions::default()).unwrap();
    assert_merged(&merged.to_record_batch().unwrap());

    let reread = read_parquet(&output, &ParquetOptions::default()).unwrap();
    assert_merged(&reread.to_record_batch().unwrap());
}

#[tokio::test]
async fn merges_parquet_files_with_backfill_async() {
    let dir = tempfile::tempdir().unwrap();
    let inputs = write_inputs(&dir);
    let output = dir.path().join("merged_async.parquet");

    let merged = concat_parquet_files_async(&inputs, &output, &ParquetOptions::default())
        .await
        .unwrap();
    assert_merged(&merged.to_record_batch().unwrap());

    let reread = read_parquet(&output, &ParquetOptions::default()).unwrap();
    assert_merged(&reread.to_record_batch().unwrap());
}
