//! Field-set consistency.
//!
//! A field set is searched as one field, so its members must exist and be
//! searched alike. Mixing tensor and non-tensor members is fatal; differing
//! match or normalization settings only give a warning.

use schemac_model::{DataType, FieldSet, Schema};

use crate::error::{CompileError, ErrorKind};
use crate::resolve::utils::quoted_list;

pub(super) fn validate_field_sets(schema: &Schema) -> Vec<CompileError> {
    let mut found = Vec::new();
    for set in schema.field_sets.values() {
        found.extend(validate_field_set(schema, set));
    }
    found
}

fn member_type(schema: &Schema, name: &str) -> Option<DataType> {
    schema
        .field(name)
        .map(|f| f.data_type.clone())
        .or_else(|| schema.imported_field(name).map(|i| i.data_type.clone()))
}

fn validate_field_set(schema: &Schema, set: &FieldSet) -> Vec<CompileError> {
    let mut found = Vec::new();
    let mut tensors = Vec::new();
    let mut others = Vec::new();
    for member in &set.fields {
        match member_type(schema, member) {
            Some(DataType::Tensor(_)) => tensors.push(member.as_str()),
            Some(_) => others.push(member.as_str()),
            None => found.push(CompileError::schema(
                ErrorKind::UnknownField,
                &schema.name,
                format!(
                    "Field '{}' in fieldset '{}' does not exist",
                    member, set.name
                ),
            )),
        }
    }
    if !found.is_empty() {
        return found;
    }
    if !tensors.is_empty() && !others.is_empty() {
        found.push(CompileError::schema(
            ErrorKind::FieldSetMismatch,
            &schema.name,
            format!(
                "Fieldset '{}' mixes tensor fields ({}) with non-tensor fields ({})",
                set.name,
                quoted_list(&tensors),
                quoted_list(&others)
            ),
        ));
        return found;
    }

    let locals: Vec<_> = set
        .fields
        .iter()
        .filter_map(|name| schema.field(name))
        .collect();
    let Some((first, rest)) = locals.split_first() else {
        return found;
    };
    let mut inconsistent = Vec::new();
    if rest.iter().any(|f| f.matching != first.matching) {
        inconsistent.push("match");
    }
    if rest.iter().any(|f| f.normalizing != first.normalizing) {
        inconsistent.push("normalizing");
    }
    if !inconsistent.is_empty() {
        found.push(CompileError::warning(
            ErrorKind::FieldSetMismatch,
            format!(
                "For schema '{}': Fieldset '{}' has inconsistent {} settings. \
                 Queries on the fieldset may give unexpected results",
                schema.name,
                set.name,
                inconsistent.join(" and ")
            ),
        ));
    }
    found
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Severity;
    use schemac_model::{Casing, Field, Normalizing};

    fn tensor() -> DataType {
        DataType::Tensor("tensor(x[4])".parse().unwrap())
    }

    #[test]
    fn test_unknown_member() {
        let schema = Schema::new("s")
            .with_field(Field::new("a", DataType::String))
            .with_field_set("all", &["a", "ghost"]);
        let found = validate_field_sets(&schema);
        assert_eq!(
            found[0].message,
            "For schema 's': Field 'ghost' in fieldset 'all' does not exist."
        );
        assert!(found[0].is_fatal());
    }

    #[test]
    fn test_tensor_mixing_is_fatal() {
        let schema = Schema::new("s")
            .with_field(Field::new("a", DataType::String))
            .with_field(Field::new("t", tensor()))
            .with_field_set("all", &["a", "t"]);
        let found = validate_field_sets(&schema);
        assert_eq!(found[0].kind, ErrorKind::FieldSetMismatch);
        assert!(found[0].is_fatal());
        assert!(found[0].message.contains("tensor fields ('t')"));
    }

    #[test]
    fn test_match_mixing_is_a_warning() {
        let mut cased = Field::new("b", DataType::String);
        cased.matching.casing = Casing::Cased;
        let mut plain = Field::new("c", DataType::String);
        plain.normalizing = Normalizing::None;
        let schema = Schema::new("s")
            .with_field(Field::new("a", DataType::String))
            .with_field(cased)
            .with_field(plain)
            .with_field_set("all", &["a", "b", "c"]);
        let found = validate_field_sets(&schema);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].severity, Severity::Warning);
        assert!(found[0].message.contains("inconsistent match and normalizing settings"));
    }

    #[test]
    fn test_consistent_set() {
        let schema = Schema::new("s")
            .with_field(Field::new("a", DataType::String))
            .with_field(Field::new("b", DataType::String))
            .with_field_set("all", &["a", "b"]);
        assert!(validate_field_sets(&schema).is_empty());
    }
}
