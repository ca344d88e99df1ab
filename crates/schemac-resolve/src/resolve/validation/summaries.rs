//! Summary field type consistency.
//!
//! A summary field name denotes one value across all summaries of a
//! schema, so every declaration of it must have the same type.

use indexmap::IndexMap;
use schemac_model::{DataType, Schema};

use crate::error::{CompileError, ErrorKind};

pub(super) fn validate_summary_types(schema: &Schema) -> Vec<CompileError> {
    let mut errors = Vec::new();
    let mut seen: IndexMap<&str, (&DataType, &str)> = IndexMap::new();
    for summary in schema.summaries.values() {
        for field in summary.fields.values() {
            let Some(data_type) = &field.data_type else {
                continue;
            };
            match seen.get(field.name.as_str()) {
                Some((first_type, first_summary)) if *first_type != data_type => {
                    errors.push(CompileError::schema(
                        ErrorKind::SummaryTypeMismatch,
                        &schema.name,
                        format!(
                            "Summary field '{}' has type '{}' in summary '{}' and type '{}' in summary '{}'",
                            field.name, first_type, first_summary, data_type, summary.name
                        ),
                    ));
                }
                Some(_) => {}
                None => {
                    seen.insert(&field.name, (data_type, &summary.name));
                }
            }
        }
    }
    errors
}
