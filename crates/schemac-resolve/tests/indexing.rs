//! Integration tests for indexing script rewriting.

mod common;

use common::{compile_err, compile_ok, field};
use schemac_model::{Application, DataType, Schema};
use schemac_resolve::ErrorKind;

fn final_script(schema: Schema, field: &str) -> String {
    let compiled = compile_ok(Application::new().with_schema(schema));
    let schema = compiled.application.by_name("s").unwrap();
    schema.final_scripts[field].to_string()
}

/// Test that repeated sinks with equal values are merged into one statement.
#[test]
fn test_equal_sinks_merge() {
    let schema = Schema::new("s").with_field(field(
        "title",
        DataType::String,
        "summary | index; input title | summary",
    ));
    assert_eq!(
        final_script(schema, "title"),
        "input title | summary title | tokenize normalize stem:\"BEST\" | index title"
    );
}

/// Test that sinks receiving different values for one field are rejected.
#[test]
fn test_conflicting_sinks() {
    let app = Application::new().with_schema(Schema::new("s").with_field(field(
        "title",
        DataType::String,
        "attribute; input title | lowercase | attribute",
    )));
    let err = compile_err(app);
    assert_eq!(err.kind, ErrorKind::ConflictingWrite);
    assert!(err
        .message
        .contains("Attempting to assign conflicting values to field 'title'"));
}

/// Test that a field cannot write to another document field.
#[test]
fn test_write_to_other_field() {
    let app = Application::new().with_schema(
        Schema::new("s")
            .with_field(field("a", DataType::Int, "attribute b"))
            .with_field(field("b", DataType::Int, "attribute")),
    );
    assert_eq!(compile_err(app).kind, ErrorKind::IllegalWrite);
}

/// Test that a field outside the document may read a document field.
#[test]
fn test_extra_field_from_document_field() {
    let schema = Schema::new("s")
        .with_field(field("title", DataType::String, "index"))
        .with_field(field("title_sort", DataType::String, "input title | attribute").outside_document());
    assert_eq!(
        final_script(schema, "title_sort"),
        "input title | attribute title_sort"
    );
}

/// Test that predicate fields get their bounds applied before the attribute.
#[test]
fn test_predicate_attribute() {
    let mut predicate = field("filter", DataType::Predicate, "attribute");
    predicate.index_settings.arity = Some(2);
    let script = final_script(Schema::new("s").with_field(predicate), "filter");
    assert_eq!(
        script,
        "input filter | optimize_predicate arity:2 | attribute filter"
    );
}
