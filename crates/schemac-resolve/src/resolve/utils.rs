//! Utility functions for resolution passes.

use std::collections::HashSet;
use std::hash::Hash;

use schemac_model::{DataType, Field, Schema};

/// Helper to convert a HashSet into a sorted unique Vec.
///
/// Keeps aggregated diagnostics stable across runs.
pub fn sort_unique<T: Ord + Hash + Eq>(set: HashSet<T>) -> Vec<T> {
    let mut vec: Vec<_> = set.into_iter().collect();
    vec.sort();
    vec
}

/// Joins names as `'a', 'b', 'c'`.
pub fn quoted_list<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(|n| format!("'{}'", n.as_ref()))
        .collect::<Vec<_>>()
        .join(", ")
}

/// Resolves a dotted path (`field` or `field.sub.path`) against a schema's
/// own fields, returning the type of the addressed field.
///
/// The `x` and `y` members of a position field are addressable too.
pub fn field_path_type(schema: &Schema, path: &str) -> Option<DataType> {
    if let Some(field) = schema.field(path) {
        return Some(field.data_type.clone());
    }
    let (head, rest) = path.split_once('.')?;
    let field = schema.field(head)?;
    if field.data_type.is_position() && (rest == "x" || rest == "y") {
        return Some(DataType::Int);
    }
    field.struct_field(rest).map(|sub| sub.data_type.clone())
}

/// Every top-level field of a schema, followed by those of its struct
/// sub-fields that carry an attribute.
///
/// Sub-fields are named by their full path, `items.on`.
pub fn attribute_fields(schema: &Schema) -> impl Iterator<Item = (String, &Field)> {
    schema.fields().flat_map(|field| {
        let subs = field
            .struct_fields
            .iter()
            .filter(|(_, sub)| sub.attribute.is_some())
            .map(move |(path, sub)| (format!("{}.{}", field.name, path), sub));
        std::iter::once((field.name.clone(), field)).chain(subs)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemac_model::{Attribute, Casing};

    #[test]
    fn test_sort_unique() {
        let set: HashSet<_> = ["b", "a", "c"].into_iter().collect();
        assert_eq!(sort_unique(set), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_field_paths() {
        let mut map = Field::new("m", DataType::map(DataType::String, DataType::Int));
        map.struct_fields
            .insert("key".into(), Field::new("key", DataType::String));
        let schema = Schema::new("s")
            .with_field(map)
            .with_field(Field::new("pos", DataType::Position));
        assert_eq!(field_path_type(&schema, "m.key"), Some(DataType::String));
        assert_eq!(field_path_type(&schema, "pos.x"), Some(DataType::Int));
        assert_eq!(field_path_type(&schema, "m.value"), None);
        assert_eq!(field_path_type(&schema, "nope"), None);
        assert_eq!(quoted_list(&["a", "b"]), "'a', 'b'");
    }

    #[test]
    fn test_attribute_fields_include_struct_sub_fields() {
        let mut on = Field::new("on", DataType::Bool);
        on.attribute = Some(Attribute::derive(
            "items.on",
            &DataType::array(DataType::Bool),
            &Default::default(),
            Casing::Uncased,
        ));
        let items = Field::new("items", DataType::array(DataType::structure("flags")))
            .with_struct_field(on)
            .with_struct_field(Field::new("off", DataType::Bool));
        let schema = Schema::new("s")
            .with_field(Field::new("title", DataType::String))
            .with_field(items);
        let names: Vec<_> = attribute_fields(&schema).map(|(name, _)| name).collect();
        assert_eq!(names, vec!["title", "items", "items.on"]);
    }
}
