//! Fast-access attribute types.
//!
//! Predicate, tensor and reference attributes cannot be fast-access.
//! Offending attributes are reported together, sorted by name.

use std::collections::HashSet;

use schemac_model::{DataType, Schema};

use crate::error::{CompileError, ErrorKind};
use crate::resolve::utils::{attribute_fields, sort_unique};

pub(super) fn validate_fast_access(schema: &Schema) -> Vec<CompileError> {
    let mut offending = HashSet::new();
    for (_, field) in attribute_fields(schema) {
        let Some(attribute) = &field.attribute else {
            continue;
        };
        let incompatible = matches!(
            attribute.value_type,
            DataType::Predicate | DataType::Tensor(_) | DataType::Reference(_)
        );
        if attribute.fast_access && incompatible {
            offending.insert(attribute.name.clone());
        }
    }
    if offending.is_empty() {
        return Vec::new();
    }
    vec![CompileError::schema(
        ErrorKind::IncompatibleAttribute,
        &schema.name,
        format!(
            "The following attributes have a type that is incompatible with fast-access: {}. \
             Predicate, tensor and reference attributes are incompatible with fast-access",
            sort_unique(offending).join(", ")
        ),
    )]
}
