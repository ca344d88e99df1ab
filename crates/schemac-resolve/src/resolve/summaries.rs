//! Summary collection.
//!
//! Builds the `default` summary from the `summary` sinks of every field,
//! checks that every explicit summary field has resolvable sources, and
//! rewrites summary fields showing a position:
//!
//! - a position with an attribute is read from its z-curve attribute, and
//!   gets `<name>.position` and `<name>.distance` companions in the same
//!   summary;
//! - a position without one is shown from its `x` and `y` members.

use schemac_model::{
    distance_summary_field_name, position_of_zcurve, position_summary_field_name,
    zcurve_field_name, DataType, Field, Schema, SinkKind, SummaryField, SummaryTransform,
};

use crate::error::{CompileError, CompileResult, ErrorKind};
use crate::resolve::pipeline::{BuildOptions, Pass, SchemaContext};
use crate::resolve::positions::is_position_type;
use crate::resolve::utils::field_path_type;

pub struct CollectSummaries;

impl Pass for CollectSummaries {
    fn name(&self) -> &'static str {
        "summaries"
    }

    fn enabled(&self, options: &BuildOptions) -> bool {
        !options.documents_only
    }

    fn run(&self, ctx: &mut SchemaContext<'_>) -> CompileResult<()> {
        let schema = &mut *ctx.schema;
        collect_default_summary(schema);
        let names: Vec<String> = schema.summaries.keys().cloned().collect();
        for name in &names {
            resolve_sources(schema, name)?;
            adjust_positions(schema, name);
        }
        Ok(())
    }
}

/// A summary source that shows a position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PositionSource {
    /// The position field, or the alias of an imported position.
    pub position: String,
    /// Attribute holding the z-curve encoded position, if any.
    pub zcurve: Option<String>,
}

/// Recognizes sources naming a position or its z-curve attribute, local or imported.
pub fn position_source(schema: &Schema, source: &str) -> Option<PositionSource> {
    if let Some(field) = schema.field(source) {
        if let Some(position) = field.zcurve_source() {
            return Some(PositionSource {
                position: position.to_string(),
                zcurve: field.has_attribute().then(|| field.name.clone()),
            });
        }
        if !is_position_type(&field.data_type) {
            return None;
        }
        let zcurve = zcurve_field_name(source);
        let has_attribute = schema.field(&zcurve).is_some_and(Field::has_attribute);
        return Some(PositionSource {
            position: source.to_string(),
            zcurve: has_attribute.then_some(zcurve),
        });
    }
    if let Some(imported) = schema.imported_field(source) {
        return imported.is_position().then(|| PositionSource {
            position: source.to_string(),
            zcurve: Some(imported.attribute_name()),
        });
    }
    let position = position_of_zcurve(source)?;
    schema
        .imported_field(position)
        .filter(|imported| imported.is_position())
        .map(|imported| PositionSource {
            position: position.to_string(),
            zcurve: Some(imported.attribute_name()),
        })
}

/// Type of a summary source: a field, a struct or position member, an
/// imported field or one of its nested fields.
pub fn source_type(schema: &Schema, source: &str) -> Option<DataType> {
    if let Some(data_type) = field_path_type(schema, source) {
        return Some(data_type);
    }
    if let Some(imported) = schema.imported_field(source) {
        return Some(imported.data_type.clone());
    }
    if let Some((alias, path)) = source.split_once('.') {
        if let Some(nested) = schema.imported_field(alias).and_then(|i| i.nested(path)) {
            return Some(nested.data_type.clone());
        }
    }
    position_source(schema, source)
        .filter(|p| p.zcurve.as_deref() == Some(source))
        .map(|_| DataType::Long)
}

fn collect_default_summary(schema: &mut Schema) {
    let mut collected: Vec<SummaryField> = Vec::new();
    for field in schema.fields() {
        for target in field.indexing.sink_targets(SinkKind::Summary, &field.name) {
            if collected.iter().any(|f| f.name == target) {
                continue;
            }
            let declared = schema.field(target).unwrap_or(field);
            let options = &declared.summary_options;
            let mut summary_field =
                SummaryField::new(target).with_type(declared.data_type.clone());
            summary_field.explicit_transform = options.transform;
            summary_field.matched_elements_only = options.matched_elements_only;
            summary_field.select_elements_by = options.select_elements_by.clone();
            collected.push(summary_field);
        }
    }
    let default = schema.default_summary_mut();
    for summary_field in collected {
        default.add(summary_field);
    }
}

fn resolve_sources(schema: &mut Schema, summary_name: &str) -> CompileResult<()> {
    let Some(summary) = schema.summaries.get(summary_name) else {
        return Ok(());
    };
    let mut inferred_types = Vec::new();
    for field in summary.fields.values() {
        if field.explicit_transform.is_some_and(SummaryTransform::is_generated) {
            continue;
        }
        let sources: Vec<&str> = if field.sources.is_empty() {
            vec![field.name.as_str()]
        } else {
            field.sources.iter().map(String::as_str).collect()
        };
        let mut types = Vec::with_capacity(sources.len());
        for source in sources {
            let data_type = source_type(schema, source).ok_or_else(|| {
                CompileError::summary(
                    ErrorKind::UnknownField,
                    &schema.name,
                    &summary.location(),
                    format!(
                        "Summary field '{}' refers to unknown source field '{}'",
                        field.name, source
                    ),
                )
            })?;
            types.push(data_type);
        }
        if field.data_type.is_none() && types.len() == 1 {
            inferred_types.push((field.name.clone(), types.remove(0)));
        }
    }

    if let Some(summary) = schema.summaries.get_mut(summary_name) {
        for (name, data_type) in inferred_types {
            if let Some(field) = summary.fields.get_mut(&name) {
                field.data_type = Some(data_type);
            }
        }
    }
    Ok(())
}

fn adjust_positions(schema: &mut Schema, summary_name: &str) {
    let Some(summary) = schema.summaries.get(summary_name) else {
        return;
    };
    let mut rewrites: Vec<(String, Vec<String>)> = Vec::new();
    let mut companions: Vec<SummaryField> = Vec::new();
    for field in summary.fields.values() {
        if field.sources.len() > 1
            || field
                .explicit_transform
                .is_some_and(|t| t != SummaryTransform::Geopos)
        {
            continue;
        }
        let Some(position) = position_source(schema, field.single_source()) else {
            continue;
        };
        match position.zcurve {
            Some(zcurve) => {
                companions.push(
                    SummaryField::new(position_summary_field_name(&position.position))
                        .with_type(DataType::String)
                        .with_source(zcurve.clone())
                        .with_explicit_transform(SummaryTransform::Positions),
                );
                companions.push(
                    SummaryField::new(distance_summary_field_name(&position.position))
                        .with_type(DataType::Int)
                        .with_source(zcurve.clone())
                        .with_explicit_transform(SummaryTransform::Distance),
                );
                rewrites.push((field.name.clone(), vec![zcurve]));
            }
            None => rewrites.push((
                field.name.clone(),
                vec![
                    format!("{}.x", position.position),
                    format!("{}.y", position.position),
                ],
            )),
        }
    }

    let Some(summary) = schema.summaries.get_mut(summary_name) else {
        return;
    };
    for (name, sources) in rewrites {
        if let Some(field) = summary.fields.get_mut(&name) {
            field.sources = sources;
        }
    }
    for companion in companions {
        summary.add(companion);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::attributes::MaterializeAttributes;
    use crate::resolve::imports::ResolveImports;
    use crate::resolve::pipeline::{compile_with, BuildOptions};
    use crate::resolve::positions::SynthesizePositions;
    use crate::resolve::structs::SynthesizeStructFields;
    use schemac_model::{Application, DocumentSummary, IndexingScript, DEFAULT_SUMMARY};

    fn script(text: &str) -> IndexingScript {
        text.parse().unwrap()
    }

    fn make_passes() -> Vec<Box<dyn Pass>> {
        vec![
            Box::new(SynthesizeStructFields),
            Box::new(SynthesizePositions),
            Box::new(MaterializeAttributes),
            Box::new(ResolveImports),
            Box::new(CollectSummaries),
        ]
    }

    fn collect(schema: Schema) -> Result<Schema, CompileError> {
        let app = Application::new().with_schema(schema);
        compile_with(app, &BuildOptions::default(), &make_passes())
            .map(|mut c| c.application.schemas.remove(0))
            .map_err(|f| f.error)
    }

    fn default_field<'a>(schema: &'a Schema, name: &str) -> &'a SummaryField {
        &schema.summaries[DEFAULT_SUMMARY].fields[name]
    }

    #[test]
    fn test_default_summary_from_sinks() {
        let mut title = Field::new("title", DataType::String).with_indexing(script("index | summary"));
        title.summary_options.matched_elements_only = true;
        let schema = collect(
            Schema::new("s")
                .with_field(title)
                .with_field(Field::new("hidden", DataType::Int).with_indexing(script("attribute"))),
        )
        .unwrap();
        let title = default_field(&schema, "title");
        assert_eq!(title.data_type, Some(DataType::String));
        assert!(title.matched_elements_only);
        assert!(!schema.summaries[DEFAULT_SUMMARY].fields.contains_key("hidden"));
    }

    #[test]
    fn test_position_with_attribute_gets_companions() {
        let schema = collect(Schema::new("s").with_field(
            Field::new("my_pos", DataType::Position).with_indexing(script("attribute | summary")),
        ))
        .unwrap();
        assert_eq!(default_field(&schema, "my_pos").sources, vec!["my_pos_zcurve"]);
        let position = default_field(&schema, "my_pos.position");
        assert_eq!(position.explicit_transform, Some(SummaryTransform::Positions));
        assert_eq!(position.sources, vec!["my_pos_zcurve"]);
        let distance = default_field(&schema, "my_pos.distance");
        assert_eq!(distance.explicit_transform, Some(SummaryTransform::Distance));
        assert_eq!(distance.data_type, Some(DataType::Int));
    }

    #[test]
    fn test_position_without_attribute_uses_members() {
        let schema = collect(Schema::new("s").with_field(
            Field::new("my_pos", DataType::Position).with_indexing(script("summary")),
        ))
        .unwrap();
        assert!(schema.field("my_pos_zcurve").is_none());
        assert_eq!(
            default_field(&schema, "my_pos").sources,
            vec!["my_pos.x", "my_pos.y"]
        );
        let default = &schema.summaries[DEFAULT_SUMMARY];
        assert!(!default.fields.contains_key("my_pos.position"));
        assert!(!default.fields.contains_key("my_pos.distance"));
    }

    #[test]
    fn test_explicit_summary_type_from_source() {
        let schema = collect(
            Schema::new("s")
                .with_field(Field::new("title", DataType::String).with_indexing(script("summary")))
                .with_summary(
                    DocumentSummary::new("short")
                        .with_field(SummaryField::new("headline").with_source("title")),
                ),
        )
        .unwrap();
        let headline = &schema.summaries["short"].fields["headline"];
        assert_eq!(headline.data_type, Some(DataType::String));
    }

    #[test]
    fn test_unknown_source_is_fatal() {
        let err = collect(Schema::new("s").with_summary(
            DocumentSummary::new("d").with_field(SummaryField::new("f").with_source("x")),
        ))
        .unwrap_err();
        assert_eq!(err.kind, ErrorKind::UnknownField);
        assert_eq!(
            err.message,
            "For schema 's', document-summary 'd': Summary field 'f' refers to unknown source field 'x'."
        );
    }

    #[test]
    fn test_generated_fields_need_no_source() {
        let schema = Schema::new("s").with_summary(
            DocumentSummary::new("d").with_field(
                SummaryField::new("documentid")
                    .with_explicit_transform(SummaryTransform::DocumentId),
            ),
        );
        assert!(collect(schema).is_ok());
    }

    #[test]
    fn test_collection_is_idempotent() {
        let schema = collect(Schema::new("s").with_field(
            Field::new("my_pos", DataType::Position).with_indexing(script("attribute | summary")),
        ))
        .unwrap();
        let again = collect(schema.clone()).unwrap();
        assert_eq!(again.summaries, schema.summaries);
    }

    #[test]
    fn test_documents_only_skips_summaries() {
        assert!(!CollectSummaries.enabled(&BuildOptions {
            documents_only: true,
            ..BuildOptions::default()
        }));
    }
}
