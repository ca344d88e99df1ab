//! Integration tests for summary transform inference.

mod common;

use common::{compile_err, compile_ok, field, people, person};
use schemac_model::{
    Application, DataType, DocumentSummary, Field, Schema, SummaryField, SummaryTransform,
    DEFAULT_SUMMARY,
};
use schemac_resolve::ErrorKind;

fn make_app(field: Field) -> Application {
    Application::new().with_schema(Schema::new("s").with_struct(person()).with_field(field))
}

fn transform_of(app: Application, summary_field: &str) -> (SummaryTransform, Vec<String>) {
    let compiled = compile_ok(app);
    let schema = compiled.application.by_name("s").unwrap();
    let transform = schema.summaries[DEFAULT_SUMMARY].fields[summary_field].transform;
    let warnings = compiled.warnings.iter().map(|w| w.message.clone()).collect();
    (transform, warnings)
}

fn matched_elements_only(mut field: Field) -> Field {
    field.summary_options.matched_elements_only = true;
    field
}

// ============================================================================
// Composite fields
// ============================================================================

/// Test that an array of structs held entirely in attributes is combined.
#[test]
fn test_struct_array_in_attributes() {
    let (transform, warnings) = transform_of(make_app(people("people", &["name", "age"])), "people");
    assert_eq!(transform, SummaryTransform::AttributeCombiner);
    assert!(warnings.is_empty());
}

/// Test the element filter over attribute-only struct arrays.
#[test]
fn test_struct_array_matched_elements_in_attributes() {
    let field = matched_elements_only(people("people", &["name", "age"]));
    let (transform, warnings) = transform_of(make_app(field), "people");
    assert_eq!(transform, SummaryTransform::MatchedAttributeElementsFilter);
    assert!(warnings.is_empty());
}

/// Test that a partially attribute-backed struct array needs the disk.
#[test]
fn test_struct_array_partly_in_attributes() {
    let (transform, warnings) = transform_of(make_app(people("people", &["name"])), "people");
    assert_eq!(transform, SummaryTransform::None);
    assert_eq!(
        warnings,
        vec![
            "In schema 's', summary class 'default': Field 'people' references non-attribute fields: \
             using this summary will require disk access"
        ]
    );

    let field = matched_elements_only(people("people", &["name"]));
    let (transform, warnings) = transform_of(make_app(field), "people");
    assert_eq!(transform, SummaryTransform::MatchedElementsFilter);
    assert_eq!(warnings.len(), 1);
}

/// Test maps of primitives held in attributes.
#[test]
fn test_primitive_map() {
    let map = field(
        "tags",
        DataType::map(DataType::String, DataType::Int),
        "summary",
    )
    .with_struct_field(field("key", DataType::String, "attribute"))
    .with_struct_field(field("value", DataType::Int, "attribute"));
    let (transform, _) = transform_of(make_app(map), "tags");
    assert_eq!(transform, SummaryTransform::AttributeCombiner);
}

// ============================================================================
// Single values
// ============================================================================

/// Test single values with and without an attribute.
#[test]
fn test_single_values() {
    let (transform, _) = transform_of(make_app(field("year", DataType::Int, "summary | attribute")), "year");
    assert_eq!(transform, SummaryTransform::Attribute);

    let (transform, _) = transform_of(make_app(field("title", DataType::String, "summary | index")), "title");
    assert_eq!(transform, SummaryTransform::None);
}

/// Test that an element filter on a single value is rejected.
#[test]
fn test_element_filter_on_single_value() {
    let field = matched_elements_only(field("title", DataType::String, "summary"));
    let err = compile_err(make_app(field));
    assert_eq!(err.kind, ErrorKind::UnsupportedSummary);
    assert!(err.message.starts_with(
        "For schema 's', summary class 'default': Summary field 'title': \
         'matched-elements-only' is not supported for this field type."
    ));
}

/// Test that `select-elements-by` wins over `matched-elements-only`.
#[test]
fn test_select_elements_by_precedence() {
    let mut field = matched_elements_only(field("title", DataType::String, "summary"));
    field.summary_options.select_elements_by = Some("my_filter".into());
    let err = compile_err(make_app(field));
    assert!(err.message.contains("'select-elements-by' is not supported"));
}

/// Test that explicit summaries of non-attribute fields warn about disk access.
#[test]
fn test_explicit_summary_disk_access() {
    let app = Application::new().with_schema(
        Schema::new("s")
            .with_field(field("title", DataType::String, "index"))
            .with_field(field("year", DataType::Int, "attribute"))
            .with_summary(
                DocumentSummary::new("short")
                    .with_field(SummaryField::new("title"))
                    .with_field(SummaryField::new("year")),
            ),
    );
    let compiled = compile_ok(app);
    let messages: Vec<&str> = compiled.warnings.iter().map(|w| w.message.as_str()).collect();
    assert_eq!(
        messages,
        vec![
            "In schema 's', document-summary 'short': Field 'title' references non-attribute fields: \
             using this summary will require disk access"
        ]
    );

    let short = &compiled.application.by_name("s").unwrap().summaries["short"];
    assert_eq!(short.fields["title"].data_type, Some(DataType::String));
    assert_eq!(short.fields["year"].transform, SummaryTransform::Attribute);
}

/// Test that a summary field with an unknown source is fatal.
#[test]
fn test_unknown_summary_source() {
    let app = Application::new().with_schema(
        Schema::new("s").with_summary(
            DocumentSummary::new("short").with_field(SummaryField::new("missing")),
        ),
    );
    assert_eq!(compile_err(app).kind, ErrorKind::UnknownField);
}
