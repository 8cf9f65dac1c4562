use rust_backfill_merge::{Scalar, build_union_array, partition_by_type, union_to_scalars};
use tracing_subscriber::EnvFilter;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let values = vec![
        Scalar::Int(1),
        Scalar::Int(2),
        Scalar::Missing,
        Scalar::from("a"),
        Scalar::from("b"),
        Scalar::Float(2.5),
        Scalar::Float(0.75),
        Scalar::from("d"),
        Scalar::from("e"),
        Scalar::Bool(true),
    ];

    let partition = partition_by_type(&values);
    println!("=== Buckets ===");
    for (tag, bucket) in partition.buckets.iter().enumerate() {
        println!("{tag}: {} -> {:?}", bucket.kind, bucket.values);
    }

    println!("\n=== Slots (tag, offset) ===");
    for (index, slot) in partition.slots.iter().enumerate() {
        println!("{index}: ({}, {})", slot.tag, slot.offset);
    }

    let union = build_union_array(&partition)?;
    println!("\n=== Union array ===");
    println!("{union:?}");

    let read_back = union_to_scalars(&union)?;
    println!("\nRound trip matches input: {}", read_back == values);
    Ok(())
}
