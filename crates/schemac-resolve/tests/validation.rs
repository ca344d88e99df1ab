//! Integration tests for attribute validation of struct sub-fields.

mod common;

use common::{compile_err, compile_ok, field, people, person};
use schemac_model::{Application, DataType, Field, Schema, StructType};
use schemac_resolve::ErrorKind;

/// `struct flags { on: bool }`
fn flags() -> StructType {
    StructType::new("flags").with_field(Field::new("on", DataType::Bool))
}

fn make_app(field: Field) -> Application {
    Application::new().with_schema(
        Schema::new("s")
            .with_struct(flags())
            .with_struct(person())
            .with_field(field),
    )
}

/// Test that a bool attribute under an array of structs is rejected like a
/// top-level `array<bool>` attribute.
#[test]
fn test_bool_struct_field_in_array() {
    let items = field("items", DataType::array(DataType::structure("flags")), "summary")
        .with_struct_field(field("on", DataType::Bool, "attribute"));
    let err = compile_err(make_app(items));
    assert_eq!(err.kind, ErrorKind::IncompatibleAttribute);
    assert_eq!(
        err.message,
        "For schema 's', field 'items.on': Only single value bool attribute fields are supported."
    );
}

/// Test that the same sub-field under a plain struct stays single-valued.
#[test]
fn test_bool_struct_field_in_plain_struct() {
    let item = field("item", DataType::structure("flags"), "summary")
        .with_struct_field(field("on", DataType::Bool, "attribute"));
    let compiled = compile_ok(make_app(item));
    let schema = compiled.application.by_name("s").unwrap();
    let on = &schema.field("item").unwrap().struct_fields["on"];
    assert!(on.attribute.is_some());
}

/// Test that string attributes under an array of structs still compile.
#[test]
fn test_string_struct_fields_in_array() {
    compile_ok(make_app(people("people", &["name"])));
}
