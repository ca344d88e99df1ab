//! Document reference fields.

use schemac_model::{CollectionType, Schema};

use crate::error::{CompileError, ErrorKind};

pub(super) fn validate_references(schema: &Schema) -> Vec<CompileError> {
    let mut errors = Vec::new();
    for field in schema.fields() {
        if !field.data_type.primitive_base().is_reference() {
            continue;
        }
        let invalid = |reason: &str| {
            CompileError::schema(
                ErrorKind::InvalidSettings,
                &schema.name,
                format!(
                    "The field '{}' is an invalid document reference. {}",
                    field.name, reason
                ),
            )
        };
        match &field.attribute {
            None => errors.push(invalid("The field must be an attribute")),
            Some(attribute) if attribute.collection != CollectionType::Single => {
                errors.push(invalid("The field must be single-value"))
            }
            Some(_) => {}
        }
        if field.has_index() {
            errors.push(invalid("The field cannot be indexed"));
        }
    }
    errors
}
