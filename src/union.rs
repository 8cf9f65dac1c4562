//! Dense union columns built from sequences of mixed scalar values.
//!
//! A sequence is first partitioned into one bucket per scalar kind, in order of
//! first appearance, recording a `(tag, offset)` slot for every position. The
//! buckets become the union's child arrays, the tags its type ids and the
//! offsets its value offsets, so position `i` reads back as
//! `bucket[tag[i]][offset[i]]`.

use std::fmt;
use std::sync::Arc;

use arrow::buffer::ScalarBuffer;
use arrow_array::cast::AsArray;
use arrow_array::types::{
    Float32Type, Float64Type, Int8Type, Int16Type, Int32Type, Int64Type, UInt8Type, UInt16Type,
    UInt32Type,
};
use arrow_array::{
    Array, ArrayRef, BinaryArray, BooleanArray, Float64Array, Int64Array, NullArray, StringArray,
    UnionArray,
};
use arrow_schema::{DataType, Field, UnionFields};
use snafu::prelude::*;
use tracing::debug;

use crate::error::{
    BucketArrayConstructionSnafu, Result, UnionAssemblySnafu, UnsupportedValueKindSnafu,
};

/// A single value of one of the admissible primitive kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Int(i64),
    Float(f64),
    Bool(bool),
    Text(String),
    Binary(Vec<u8>),
    /// An explicit absence of a value.
    Missing,
}

/// The runtime kind of a [`Scalar`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarKind {
    Int,
    Float,
    Bool,
    Text,
    Binary,
    Missing,
}

impl ScalarKind {
    /// Name of the union child field holding values of this kind.
    pub fn name(self) -> &'static str {
        match self {
            ScalarKind::Int => "int",
            ScalarKind::Float => "float",
            ScalarKind::Bool => "bool",
            ScalarKind::Text => "text",
            ScalarKind::Binary => "binary",
            ScalarKind::Missing => "null",
        }
    }

    /// Arrow type of the array holding a bucket of this kind.
    pub fn data_type(self) -> DataType {
        match self {
            ScalarKind::Int => DataType::Int64,
            ScalarKind::Float => DataType::Float64,
            ScalarKind::Bool => DataType::Boolean,
            ScalarKind::Text => DataType::Utf8,
            ScalarKind::Binary => DataType::Binary,
            ScalarKind::Missing => DataType::Null,
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl Scalar {
    pub fn kind(&self) -> ScalarKind {
        match self {
            Scalar::Int(_) => ScalarKind::Int,
            Scalar::Float(_) => ScalarKind::Float,
            Scalar::Bool(_) => ScalarKind::Bool,
            Scalar::Text(_) => ScalarKind::Text,
            Scalar::Binary(_) => ScalarKind::Binary,
            Scalar::Missing => ScalarKind::Missing,
        }
    }

    /// Read the value at `index` of `array`.
    ///
    /// Null slots, and every slot of a `Null` array, read as [`Scalar::Missing`].
    /// Nested union arrays are followed to the child holding the value.
    pub fn try_from_array(array: &dyn Array, index: usize) -> Result<Self> {
        if array.data_type() == &DataType::Null || array.is_null(index) {
            return Ok(Scalar::Missing);
        }

        let scalar = match array.data_type() {
            DataType::Int8 => Scalar::Int(array.as_primitive::<Int8Type>().value(index).into()),
            DataType::Int16 => Scalar::Int(array.as_primitive::<Int16Type>().value(index).into()),
            DataType::Int32 => Scalar::Int(array.as_primitive::<Int32Type>().value(index).into()),
            DataType::Int64 => Scalar::Int(array.as_primitive::<Int64Type>().value(index)),
            DataType::UInt8 => Scalar::Int(array.as_primitive::<UInt8Type>().value(index).into()),
            DataType::UInt16 => {
                Scalar::Int(array.as_primitive::<UInt16Type>().value(index).into())
            }
            DataType::UInt32 => {
                Scalar::Int(array.as_primitive::<UInt32Type>().value(index).into())
            }
            DataType::Float32 => {
                Scalar::Float(array.as_primitive::<Float32Type>().value(index).into())
            }
            DataType::Float64 => Scalar::Float(array.as_primitive::<Float64Type>().value(index)),
            DataType::Boolean => Scalar::Bool(array.as_boolean().value(index)),
            DataType::Utf8 => Scalar::Text(array.as_string::<i32>().value(index).to_string()),
            DataType::LargeUtf8 => {
                Scalar::Text(array.as_string::<i64>().value(index).to_string())
            }
            DataType::Binary => Scalar::Binary(array.as_binary::<i32>().value(index).to_vec()),
            DataType::LargeBinary => {
                Scalar::Binary(array.as_binary::<i64>().value(index).to_vec())
            }
            DataType::Union(_, _) => {
                let union = array
                    .as_any()
                    .downcast_ref::<UnionArray>()
                    .with_context(|| UnsupportedValueKindSnafu {
                        data_type: array.data_type().clone(),
                    })?;
                let child = union.child(union.type_id(index));
                return Self::try_from_array(child.as_ref(), union.value_offset(index));
            }
            other => {
                return UnsupportedValueKindSnafu {
                    data_type: other.clone(),
                }
                .fail();
            }
        };
        Ok(scalar)
    }
}

impl From<i64> for Scalar {
    fn from(value: i64) -> Self {
        Scalar::Int(value)
    }
}

impl From<f64> for Scalar {
    fn from(value: f64) -> Self {
        Scalar::Float(value)
    }
}

impl From<bool> for Scalar {
    fn from(value: bool) -> Self {
        Scalar::Bool(value)
    }
}

impl From<&str> for Scalar {
    fn from(value: &str) -> Self {
        Scalar::Text(value.to_string())
    }
}

impl From<String> for Scalar {
    fn from(value: String) -> Self {
        Scalar::Text(value)
    }
}

impl From<Vec<u8>> for Scalar {
    fn from(value: Vec<u8>) -> Self {
        Scalar::Binary(value)
    }
}

impl<T: Into<Scalar>> From<Option<T>> for Scalar {
    fn from(value: Option<T>) -> Self {
        value.map_or(Scalar::Missing, Into::into)
    }
}

/// The values of one kind, in their original relative order.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeBucket {
    pub kind: ScalarKind,
    pub values: Vec<Scalar>,
}

/// Where an original position's value lives: bucket index and index within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub tag: usize,
    pub offset: usize,
}

/// Buckets ordered by first occurrence of their kind, plus one slot per position.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TypePartition {
    pub buckets: Vec<TypeBucket>,
    pub slots: Vec<Slot>,
}

impl TypePartition {
    /// Value at original position `index`.
    pub fn get(&self, index: usize) -> Option<&Scalar> {
        let slot = self.slots.get(index)?;
        self.buckets.get(slot.tag)?.values.get(slot.offset)
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

/// Split `values` into per-kind buckets, recording a slot for every position.
pub fn partition_by_type<'a, I>(values: I) -> TypePartition
where
    I: IntoIterator<Item = &'a Scalar>,
{
    let mut partition = TypePartition::default();
    for value in values {
        let kind = value.kind();
        let tag = match partition.buckets.iter().position(|b| b.kind == kind) {
            Some(tag) => tag,
            None => {
                partition.buckets.push(TypeBucket {
                    kind,
                    values: Vec::new(),
                });
                partition.buckets.len() - 1
            }
        };
        let bucket = &mut partition.buckets[tag];
        partition.slots.push(Slot {
            tag,
            offset: bucket.values.len(),
        });
        bucket.values.push(value.clone());
    }
    partition
}

fn collect_bucket<'a, T>(
    tag: usize,
    bucket: &'a TypeBucket,
    extract: impl Fn(&'a Scalar) -> Option<T>,
) -> Result<Vec<T>> {
    bucket
        .values
        .iter()
        .map(|value| {
            extract(value).with_context(|| BucketArrayConstructionSnafu {
                tag,
                reason: format!("{} value in {} bucket", value.kind(), bucket.kind),
            })
        })
        .collect()
}

fn bucket_array(tag: usize, bucket: &TypeBucket) -> Result<ArrayRef> {
    let array: ArrayRef = match bucket.kind {
        ScalarKind::Int => Arc::new(Int64Array::from(collect_bucket(tag, bucket, |v| match v {
            Scalar::Int(i) => Some(*i),
            _ => None,
        })?)),
        ScalarKind::Float => Arc::new(Float64Array::from(collect_bucket(tag, bucket, |v| {
            match v {
                Scalar::Float(f) => Some(*f),
                _ => None,
            }
        })?)),
        ScalarKind::Bool => Arc::new(BooleanArray::from(collect_bucket(tag, bucket, |v| {
            match v {
                Scalar::Bool(b) => Some(*b),
                _ => None,
            }
        })?)),
        ScalarKind::Text => Arc::new(StringArray::from(collect_bucket(tag, bucket, |v| {
            match v {
                Scalar::Text(s) => Some(s.as_str()),
                _ => None,
            }
        })?)),
        ScalarKind::Binary => Arc::new(BinaryArray::from_vec(collect_bucket(
            tag,
            bucket,
            |v| match v {
                Scalar::Binary(b) => Some(b.as_slice()),
                _ => None,
            },
        )?)),
        ScalarKind::Missing => {
            let nulls = collect_bucket(tag, bucket, |v| {
                matches!(v, Scalar::Missing).then_some(())
            })?;
            Arc::new(NullArray::new(nulls.len()))
        }
    };
    Ok(array)
}

/// Build a dense union column from a partition.
///
/// Child `i` holds bucket `i` and is registered under type id `i`.
pub fn build_union_array(partition: &TypePartition) -> Result<UnionArray> {
    ensure!(
        partition.buckets.len() <= i8::MAX as usize,
        BucketArrayConstructionSnafu {
            tag: partition.buckets.len() - 1,
            reason: "too many buckets for i8 type ids",
        }
    );

    let children = partition
        .buckets
        .iter()
        .enumerate()
        .map(|(tag, bucket)| bucket_array(tag, bucket))
        .collect::<Result<Vec<_>>>()?;

    let mut type_ids = Vec::with_capacity(partition.slots.len());
    let mut offsets = Vec::with_capacity(partition.slots.len());
    for slot in &partition.slots {
        let bucket = partition
            .buckets
            .get(slot.tag)
            .context(BucketArrayConstructionSnafu {
                tag: slot.tag,
                reason: "tag does not name a bucket",
            })?;
        ensure!(
            slot.offset < bucket.values.len(),
            BucketArrayConstructionSnafu {
                tag: slot.tag,
                reason: format!(
                    "offset {} outside bucket of {} values",
                    slot.offset,
                    bucket.values.len()
                ),
            }
        );
        // The bucket count was checked against i8 above.
        type_ids.push(slot.tag as i8);
        offsets.push(i32::try_from(slot.offset).ok().context(
            BucketArrayConstructionSnafu {
                tag: slot.tag,
                reason: "offset exceeds i32",
            },
        )?);
    }

    let fields = UnionFields::new(
        0..partition.buckets.len() as i8,
        partition
            .buckets
            .iter()
            .map(|bucket| Field::new(bucket.kind.name(), bucket.kind.data_type(), true)),
    );

    debug!(
        len = type_ids.len(),
        buckets = children.len(),
        "building dense union array"
    );
    UnionArray::try_new(
        fields,
        ScalarBuffer::from(type_ids),
        Some(ScalarBuffer::from(offsets)),
        children,
    )
    .context(UnionAssemblySnafu)
}

/// Partition `values` and build the dense union column in one step.
pub fn to_union_array(values: &[Scalar]) -> Result<UnionArray> {
    build_union_array(&partition_by_type(values))
}

/// Read a union column back into the sequence of scalars it represents.
pub fn union_to_scalars(array: &UnionArray) -> Result<Vec<Scalar>> {
    (0..array.len())
        .map(|index| Scalar::try_from_array(array, index))
        .collect()
}
