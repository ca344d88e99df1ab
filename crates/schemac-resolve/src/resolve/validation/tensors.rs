//! Tensor attributes.
//!
//! A fast-search tensor attribute is backed by a dictionary over its mapped
//! dimensions, so it needs at least one.

use schemac_model::{DataType, Schema};

use crate::error::{CompileError, ErrorKind};
use crate::resolve::utils::attribute_fields;

pub(super) fn validate_tensor_attributes(schema: &Schema) -> Vec<CompileError> {
    let mut errors = Vec::new();
    for (name, field) in attribute_fields(schema) {
        let Some(attribute) = &field.attribute else {
            continue;
        };
        let DataType::Tensor(tensor) = &attribute.value_type else {
            continue;
        };
        if attribute.fast_search && !tensor.has_mapped_dimension() {
            errors.push(CompileError::field(
                ErrorKind::IncompatibleAttribute,
                &schema.name,
                &name,
                format!(
                    "An attribute of type '{}' cannot be 'fast-search': it has no mapped dimension",
                    tensor
                ),
            ));
        }
    }
    errors
}
