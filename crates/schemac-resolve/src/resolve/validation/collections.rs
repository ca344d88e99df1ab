//! Collection-type restrictions on attributes.
//!
//! - bool and raw attributes are single-value only
//! - struct, map and array-of-struct fields cannot be attributes themselves;
//!   their struct-fields can
//! - predicate attributes need an arity

use schemac_model::{CollectionType, DataType, Schema, SinkKind};

use crate::error::{CompileError, ErrorKind};
use crate::resolve::positions::is_position_type;
use crate::resolve::utils::attribute_fields;

pub(super) fn validate_collections(schema: &Schema) -> Vec<CompileError> {
    let mut errors = Vec::new();
    for (name, field) in attribute_fields(schema) {
        let error = |kind, message: String| {
            CompileError::field(kind, &schema.name, &name, message)
        };

        let attribute_sink = field
            .indexing
            .writes_to(SinkKind::Attribute, &field.name, &field.name);
        if attribute_sink
            && field.data_type.is_composite()
            && !is_position_type(&field.data_type)
        {
            errors.push(error(
                ErrorKind::IncompatibleAttribute,
                format!(
                    "Field of type '{}' cannot be an attribute. Use 'indexing: attribute' on its struct-fields instead",
                    field.data_type
                ),
            ));
            continue;
        }

        let Some(attribute) = &field.attribute else {
            continue;
        };
        let single_only = match attribute.value_type {
            DataType::Bool => Some("bool"),
            DataType::Raw => Some("raw"),
            _ => None,
        };
        if let Some(type_name) = single_only {
            if attribute.collection != CollectionType::Single {
                errors.push(error(
                    ErrorKind::IncompatibleAttribute,
                    format!(
                        "Only single value {} attribute fields are supported",
                        type_name
                    ),
                ));
            }
        }
        if matches!(attribute.value_type, DataType::Predicate)
            && field.index_settings.arity.is_none()
        {
            errors.push(error(
                ErrorKind::InvalidSettings,
                "Missing arity value in predicate field".to_string(),
            ));
        }
    }
    errors
}

#[cfg(test)]
mod tests {
    use super::super::{materialized, script};
    use super::*;
    use schemac_model::{Field, StructType};

    fn validate(field: Field) -> Vec<CompileError> {
        let schema = Schema::new("s")
            .with_struct(StructType::new("elem").with_field(Field::new("name", DataType::String)))
            .with_field(field);
        validate_collections(&materialized(schema))
    }

    fn attribute(name: &str, data_type: DataType) -> Field {
        Field::new(name, data_type).with_indexing(script("attribute"))
    }

    #[test]
    fn test_bool_and_raw_single_value_only() {
        assert!(validate(attribute("b", DataType::Bool)).is_empty());
        let errors = validate(attribute("b", DataType::array(DataType::Bool)));
        assert_eq!(
            errors[0].message,
            "For schema 's', field 'b': Only single value bool attribute fields are supported."
        );
        let errors = validate(attribute("r", DataType::weighted_set(DataType::Raw)));
        assert!(errors[0].message.contains("single value raw"));
    }

    #[test]
    fn test_composite_attribute() {
        let errors = validate(attribute(
            "m",
            DataType::map(DataType::String, DataType::structure("elem")),
        ));
        assert_eq!(errors[0].kind, ErrorKind::IncompatibleAttribute);
        assert!(errors[0].message.contains("map<string,elem>"));
        assert!(validate(attribute("pos", DataType::Position)).is_empty());
    }

    #[test]
    fn test_struct_field_of_array_is_multi_value() {
        let schema = Schema::new("s")
            .with_struct(StructType::new("flags").with_field(Field::new("on", DataType::Bool)))
            .with_field(
                Field::new("items", DataType::array(DataType::structure("flags")))
                    .with_indexing(script("summary"))
                    .with_struct_field(attribute("on", DataType::Bool)),
            );
        let errors = validate_collections(&materialized(schema));
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].kind, ErrorKind::IncompatibleAttribute);
        assert_eq!(
            errors[0].message,
            "For schema 's', field 'items.on': Only single value bool attribute fields are supported."
        );

        let single = Schema::new("s")
            .with_struct(StructType::new("flags").with_field(Field::new("on", DataType::Bool)))
            .with_field(
                Field::new("item", DataType::structure("flags"))
                    .with_indexing(script("summary"))
                    .with_struct_field(attribute("on", DataType::Bool)),
            );
        assert!(validate_collections(&materialized(single)).is_empty());
    }

    #[test]
    fn test_predicate_needs_arity() {
        let errors = validate(attribute("p", DataType::Predicate));
        assert_eq!(
            errors[0].message,
            "For schema 's', field 'p': Missing arity value in predicate field."
        );
        let mut field = attribute("p", DataType::Predicate);
        field.index_settings.arity = Some(8);
        assert!(validate(field).is_empty());
    }
}
