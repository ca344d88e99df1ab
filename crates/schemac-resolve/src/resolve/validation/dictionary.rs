//! Dictionary settings of attributes.
//!
//! Only numeric and string attributes have a dictionary. A hash dictionary
//! over strings needs cased matching, and an explicit dictionary casing
//! must agree with the field's match casing.

use schemac_model::{Casing, Schema};

use crate::error::{CompileError, ErrorKind};
use crate::resolve::utils::attribute_fields;

fn casing_name(casing: Casing) -> &'static str {
    match casing {
        Casing::Cased => "CASED",
        Casing::Uncased => "UNCASED",
    }
}

pub(super) fn validate_dictionaries(schema: &Schema) -> Vec<CompileError> {
    let mut errors = Vec::new();
    for (name, field) in attribute_fields(schema) {
        let Some(attribute) = &field.attribute else {
            continue;
        };
        let Some(dictionary) = attribute.dictionary else {
            continue;
        };
        let error = |message: String| {
            CompileError::field(ErrorKind::InvalidSettings, &schema.name, &name, message)
        };

        let value_type = &attribute.value_type;
        if value_type.is_numeric() {
            continue;
        }
        if !value_type.is_text() {
            errors.push(error(
                "You can only specify 'dictionary:' for numeric or string fields".to_string(),
            ));
            continue;
        }
        if dictionary.dictionary_type.has_hash() && attribute.casing == Casing::Uncased {
            errors.push(error("hash dictionary require cased match".to_string()));
            continue;
        }
        if let Some(casing) = dictionary.casing {
            if casing != field.matching.casing {
                errors.push(error(format!(
                    "Dictionary casing '{}' does not match field match casing '{}'",
                    casing_name(casing),
                    casing_name(field.matching.casing)
                )));
            }
        }
    }
    errors
}
