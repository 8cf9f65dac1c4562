//! Merging of several schemas into one canonical schema.

use std::collections::{HashMap, HashSet};

use arrow_schema::{DataType, Field, FieldRef, Schema};
use snafu::prelude::*;
use tracing::{debug, warn};

use crate::error::{EmptyInputSnafu, Result};

/// Structural identity of a field: name, data type and nullability.
/// Field-level metadata plays no part.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) struct FieldKey<'a> {
    name: &'a str,
    data_type: &'a DataType,
    nullable: bool,
}

impl<'a> FieldKey<'a> {
    pub(crate) fn of(field: &'a Field) -> Self {
        Self {
            name: field.name(),
            data_type: field.data_type(),
            nullable: field.is_nullable(),
        }
    }
}

/// Merge `schemas` into one schema.
///
/// Fields are deduplicated by name, type and nullability and keep the order
/// of their first occurrence. Schema metadata is merged so that a key seen in
/// a later schema overwrites the value from an earlier one.
///
/// Fields sharing a name but not a type (or nullability) are all kept; such a
/// conflict is logged but not resolved.
pub fn merge_schemas<'a, I>(schemas: I) -> Result<Schema>
where
    I: IntoIterator<Item = &'a Schema>,
{
    let schemas: Vec<&Schema> = schemas.into_iter().collect();
    ensure!(!schemas.is_empty(), EmptyInputSnafu { what: "schemas" });

    let mut seen = HashSet::new();
    let mut fields: Vec<FieldRef> = Vec::new();
    for field in schemas.iter().flat_map(|schema| schema.fields().iter()) {
        if seen.insert(FieldKey::of(field)) {
            fields.push(field.clone());
        }
    }

    let mut metadata = HashMap::new();
    for schema in &schemas {
        for (key, value) in schema.metadata() {
            metadata.insert(key.clone(), value.clone());
        }
    }

    warn_on_name_conflicts(&fields);
    debug!(
        inputs = schemas.len(),
        fields = fields.len(),
        metadata_keys = metadata.len(),
        "merged schemas"
    );

    Ok(Schema::new_with_metadata(fields, metadata))
}

fn warn_on_name_conflicts(fields: &[FieldRef]) {
    let mut first_by_name: HashMap<&str, &Field> = HashMap::new();
    for field in fields {
        match first_by_name.get(field.name().as_str()) {
            Some(first) => warn!(
                field = %field.name(),
                first_type = ?first.data_type(),
                first_nullable = first.is_nullable(),
                other_type = ?field.data_type(),
                other_nullable = field.is_nullable(),
                "merged schema contains conflicting fields with the same name"
            ),
            None => {
                first_by_name.insert(field.name().as_str(), field.as_ref());
            }
        }
    }
}
