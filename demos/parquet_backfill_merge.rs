use std::sync::Arc;
use std::time::Instant;

use arrow_array::{Float64Array, Int32Array, RecordBatch, StringArray};
use arrow_schema::{DataType, Field, Schema};
use rust_backfill_merge::{
    ParquetOptions, TabularBlock, concat_parquet_files_async, read_parquet_async,
    write_parquet_async,
};
use tracing_subscriber::EnvFilter;

async fn print_parquet_contents(
    filename: &str,
    title: &str,
    options: &ParquetOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("\n=== {title} ===");
    let table = read_parquet_async(filename, options).await?;
    for batch in table.batches() {
        println!("{batch:#?}");
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let options = ParquetOptions::default();

    // ---- Setup: two parquet files sharing only `id` ----
    let schema1 = Arc::new(Schema::new(vec![
        Field::new("id", DataType::Int32, true),
        Field::new("score", DataType::Float64, true),
        Field::new("name", DataType::Utf8, true),
    ]));
    let batch1 = RecordBatch::try_new(
        schema1,
        vec![
            Arc::new(Int32Array::from(vec![1, 2, 3])),
            Arc::new(Float64Array::from(vec![Some(10.5), None, Some(30.0)])),
            Arc::new(StringArray::from(vec![
                Some("Alice"),
                Some("Bob"),
                Some("Charlie"),
            ])),
        ],
    )?;

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
    )?;

    let block1 = TabularBlock::Batch(batch1);
    let block2 = TabularBlock::Batch(batch2);
    tokio::try_join!(
        write_parquet_async(&block1, "backfill_file1.parquet", &options),
        write_parquet_async(&block2, "backfill_file2.parquet", &options)
    )?;

    tokio::try_join!(
        print_parquet_contents(
            "backfill_file1.parquet",
            "Contents of backfill_file1.parquet",
            &options
        ),
        print_parquet_contents(
            "backfill_file2.parquet",
            "Contents of backfill_file2.parquet",
            &options
        )
    )?;

    // ---- Merge with backfill ----
    let merge_start = Instant::now();
    let merged = concat_parquet_files_async(
        &["backfill_file1.parquet", "backfill_file2.parquet"],
        "backfill_merged.parquet",
        &options,
    )
    .await?;
    let merge_duration = merge_start.elapsed();

    println!(
        "\nMerged {} rows x {} columns into backfill_merged.parquet",
        merged.num_rows(),
        merged.num_columns()
    );
    print_parquet_contents(
        "backfill_merged.parquet",
        "Contents of backfill_merged.parquet",
        &options,
    )
    .await?;

    println!("Merge operation took: {merge_duration:?}");
    Ok(())
}
