//! Attribute and index materialization.
//!
//! Every `attribute` sink creates an [`Attribute`] on the field it writes
//! to, every `index` sink an [`Index`]. Struct sub-fields with an
//! `attribute` sink of their own get an attribute named by their full path;
//! sub-fields of arrays and maps are stored as arrays.
//!
//! Struct, map and position fields never get an attribute themselves:
//! composite values live in their sub-field attributes and positions in
//! their z-curve companion.

use schemac_model::{Attribute, Casing, DataType, Field, Index, SinkKind};

use crate::error::CompileResult;
use crate::resolve::pipeline::{Pass, SchemaContext};

pub struct MaterializeAttributes;

impl Pass for MaterializeAttributes {
    fn name(&self) -> &'static str {
        "attributes"
    }

    fn run(&self, ctx: &mut SchemaContext<'_>) -> CompileResult<()> {
        let schema = &mut *ctx.schema;
        for field in schema.fields_mut() {
            field.attribute = None;
            field.index = None;
            for sub in field.struct_fields.values_mut() {
                sub.attribute = None;
                sub.index = None;
            }
        }

        let mut attribute_targets: Vec<String> = Vec::new();
        let mut index_targets: Vec<String> = Vec::new();
        for field in schema.fields() {
            for target in field.indexing.sink_targets(SinkKind::Attribute, &field.name) {
                if !attribute_targets.iter().any(|t| t == target) {
                    attribute_targets.push(target.to_string());
                }
            }
            for target in field.indexing.sink_targets(SinkKind::Index, &field.name) {
                if !index_targets.iter().any(|t| t == target) {
                    index_targets.push(target.to_string());
                }
            }
        }

        for target in &attribute_targets {
            if let Some(field) = schema.field_mut(target) {
                field.attribute = derive_attribute(target, field);
            }
        }
        for target in &index_targets {
            if let Some(field) = schema.field_mut(target) {
                field.index = Some(Index {
                    name: target.clone(),
                    stemming: field.stemming,
                    normalizing: field.normalizing,
                    settings: field.index_settings,
                });
            }
        }

        for field in schema.fields_mut() {
            materialize_struct_attributes(field);
        }
        Ok(())
    }
}

/// Casing of a field's attribute: the dictionary's when given, otherwise the match casing.
pub fn attribute_casing(field: &Field) -> Casing {
    field
        .attribute_settings
        .dictionary
        .and_then(|d| d.casing)
        .unwrap_or(field.matching.casing)
}

fn derive_attribute(name: &str, field: &Field) -> Option<Attribute> {
    if field.data_type.is_composite() {
        return None;
    }
    Some(Attribute::derive(
        name,
        &field.data_type,
        &field.attribute_settings,
        attribute_casing(field),
    ))
}

fn materialize_struct_attributes(field: &mut Field) {
    let multi_valued = matches!(
        field.data_type,
        DataType::Array(_) | DataType::WeightedSet(_) | DataType::Map(_, _)
    );
    for (path, sub) in field.struct_fields.iter_mut() {
        let has_sink = sub
            .indexing
            .sink_targets(SinkKind::Attribute, path)
            .next()
            .is_some();
        if !has_sink || sub.data_type.is_composite() {
            continue;
        }
        let data_type = if multi_valued {
            DataType::array(sub.data_type.clone())
        } else {
            sub.data_type.clone()
        };
        let name = format!("{}.{}", field.name, path);
        sub.attribute = Some(Attribute::derive(
            &name,
            &data_type,
            &sub.attribute_settings,
            attribute_casing(sub),
        ));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::pipeline::{run_single_pass, BuildOptions};
    use schemac_model::{
        Application, CollectionType, Dictionary, DictionaryType, IndexingScript, Schema,
        SchemaId,
    };

    fn script(text: &str) -> IndexingScript {
        text.parse().unwrap()
    }

    fn run(schema: Schema) -> Schema {
        let mut app = Application::new().with_schema(schema);
        let (result, _) = run_single_pass(
            &MaterializeAttributes,
            &mut app,
            SchemaId(0),
            &BuildOptions::default(),
        );
        result.unwrap();
        app.schemas.remove(0)
    }

    #[test]
    fn test_attribute_and_index_from_sinks() {
        let schema = run(Schema::new("s")
            .with_field(
                Field::new("tags", DataType::weighted_set(DataType::String))
                    .with_indexing(script("attribute | summary")),
            )
            .with_field(Field::new("title", DataType::String).with_indexing(script("index"))));
        let tags = schema.field("tags").unwrap();
        let attr = tags.attribute.as_ref().unwrap();
        assert_eq!(attr.collection, CollectionType::WeightedSet);
        assert!(!tags.has_index());
        let title = schema.field("title").unwrap();
        assert!(title.has_index());
        assert!(!title.has_attribute());
    }

    #[test]
    fn test_sink_to_other_field() {
        let schema = run(Schema::new("s")
            .with_field(Field::new("counter", DataType::Int))
            .with_field(
                Field::new("extra", DataType::Int)
                    .with_indexing(script("input counter | attribute counter"))
                    .outside_document(),
            ));
        assert!(schema.field("counter").unwrap().has_attribute());
        assert!(!schema.field("extra").unwrap().has_attribute());
    }

    #[test]
    fn test_struct_sub_field_attributes() {
        let mut people = Field::new("people", DataType::array(DataType::structure("person")));
        people.struct_fields.insert(
            "name".into(),
            Field::new("name", DataType::String).with_indexing(script("attribute")),
        );
        people
            .struct_fields
            .insert("age".into(), Field::new("age", DataType::Int));
        let schema = run(Schema::new("s").with_field(people.with_indexing(script("summary"))));
        let people = schema.field("people").unwrap();
        assert!(!people.has_attribute());
        let name = people.struct_fields["name"].attribute.as_ref().unwrap();
        assert_eq!(name.name, "people.name");
        assert_eq!(name.collection, CollectionType::Array);
        assert!(people.struct_fields["age"].attribute.is_none());
    }

    #[test]
    fn test_dictionary_casing_wins() {
        let mut field = Field::new("s", DataType::String).with_indexing(script("attribute"));
        field.attribute_settings.dictionary = Some(Dictionary {
            dictionary_type: DictionaryType::Hash,
            casing: Some(Casing::Cased),
        });
        let schema = run(Schema::new("x").with_field(field));
        let attr = schema.field("s").unwrap().attribute.clone().unwrap();
        assert_eq!(attr.casing, Casing::Cased);
    }

    #[test]
    fn test_position_gets_no_attribute_of_its_own() {
        let schema = run(Schema::new("s")
            .with_field(Field::new("pos", DataType::Position).with_indexing(script("attribute"))));
        assert!(!schema.field("pos").unwrap().has_attribute());
    }
}
