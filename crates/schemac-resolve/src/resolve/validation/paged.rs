//! Paged attributes.

use schemac_model::{DataType, Schema};

use crate::error::{CompileError, ErrorKind};
use crate::resolve::utils::attribute_fields;

pub(super) fn validate_paged(schema: &Schema) -> Vec<CompileError> {
    let mut errors = Vec::new();
    for (name, field) in attribute_fields(schema) {
        let Some(attribute) = &field.attribute else {
            continue;
        };
        if !attribute.paged {
            continue;
        }
        let unsupported = match &attribute.value_type {
            DataType::Predicate => Some("predicate attributes"),
            DataType::Tensor(_) if attribute.fast_rank => Some("fast-rank tensor attributes"),
            _ => None,
        };
        if let Some(kind) = unsupported {
            errors.push(CompileError::field(
                ErrorKind::IncompatibleAttribute,
                &schema.name,
                &name,
                format!("The 'paged' attribute setting is not supported for {}", kind),
            ));
        }
    }
    errors
}
