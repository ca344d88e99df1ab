//! Integration tests for position fields and their summaries.

mod common;

use common::{compile_ok, field, reference};
use schemac_model::{
    Application, CollectionType, DataType, DocumentSummary, FieldOrigin, Schema, SummaryField,
    SummaryTransform, DEFAULT_SUMMARY,
};

/// Test the artifacts synthesized for a position attribute shown in a summary.
///
/// Verifies:
/// - a `my_pos_zcurve` long attribute outside the document
/// - `my_pos` shown through the z-curve attribute with `geopos`
/// - `my_pos.position` and `my_pos.distance` companions
#[test]
fn test_position_attribute_with_summary() {
    let app = Application::new().with_schema(
        Schema::new("place").with_field(field("my_pos", DataType::Position, "summary | attribute")),
    );
    let compiled = compile_ok(app);
    let schema = compiled.application.by_name("place").unwrap();

    let zcurve = schema.field("my_pos_zcurve").unwrap();
    assert!(!zcurve.in_document);
    assert_eq!(zcurve.origin, FieldOrigin::ZCurveOf("my_pos".into()));
    let attribute = zcurve.attribute.as_ref().unwrap();
    assert_eq!(attribute.value_type, DataType::Long);
    assert_eq!(attribute.collection, CollectionType::Single);
    assert!(schema.field("my_pos").unwrap().attribute.is_none());

    let summary = &schema.summaries[DEFAULT_SUMMARY];
    let shown = &summary.fields["my_pos"];
    assert_eq!(shown.sources, vec!["my_pos_zcurve"]);
    assert_eq!(shown.transform, SummaryTransform::Geopos);

    let position = &summary.fields["my_pos.position"];
    assert_eq!(position.data_type, Some(DataType::String));
    assert_eq!(position.transform, SummaryTransform::Positions);
    let distance = &summary.fields["my_pos.distance"];
    assert_eq!(distance.data_type, Some(DataType::Int));
    assert_eq!(distance.transform, SummaryTransform::Distance);

    assert!(compiled.warnings.is_empty());
}

/// Test that a position without an attribute is shown from its members.
#[test]
fn test_position_summary_without_attribute() {
    let app = Application::new()
        .with_schema(Schema::new("place").with_field(field("my_pos", DataType::Position, "summary")));
    let compiled = compile_ok(app);
    let schema = compiled.application.by_name("place").unwrap();

    assert!(schema.field("my_pos_zcurve").is_none());
    let summary = &schema.summaries[DEFAULT_SUMMARY];
    let shown = &summary.fields["my_pos"];
    assert_eq!(shown.sources, vec!["my_pos.x", "my_pos.y"]);
    assert_eq!(shown.transform, SummaryTransform::None);
    assert!(!summary.fields.contains_key("my_pos.position"));
}

/// Test that an array of positions gets an array z-curve attribute.
#[test]
fn test_position_array() {
    let app = Application::new().with_schema(Schema::new("place").with_field(field(
        "stops",
        DataType::array(DataType::Position),
        "attribute",
    )));
    let compiled = compile_ok(app);
    let schema = compiled.application.by_name("place").unwrap();
    let attribute = schema.field("stops_zcurve").unwrap().attribute.as_ref().unwrap();
    assert_eq!(attribute.value_type, DataType::Long);
    assert_eq!(attribute.collection, CollectionType::Array);
}

/// Test that an imported position reads the target's z-curve attribute.
#[test]
fn test_imported_position_summary() {
    let app = Application::new()
        .with_schema(
            Schema::new("visit")
                .with_field(reference("venue", "venue"))
                .with_import("venue.location", "my_pos")
                .with_summary(
                    DocumentSummary::new("short").with_field(SummaryField::new("my_pos")),
                ),
        )
        .with_schema(
            Schema::new("venue").with_field(field("location", DataType::Position, "attribute")),
        );
    let compiled = compile_ok(app);
    let visit = compiled.application.by_name("visit").unwrap();

    let imported = visit.imported_field("my_pos").unwrap();
    assert!(imported.is_position());
    assert_eq!(imported.attribute_name(), "my_pos_zcurve");

    let short = &visit.summaries["short"];
    assert_eq!(short.fields["my_pos"].sources, vec!["my_pos_zcurve"]);
    assert_eq!(short.fields["my_pos"].transform, SummaryTransform::Geopos);
    assert_eq!(
        short.fields["my_pos.distance"].transform,
        SummaryTransform::Distance
    );
    assert!(compiled.warnings.is_empty());
}
