//! Shared builders for the pipeline integration tests.

#![allow(dead_code)]

use schemac_model::{Application, DataType, Field, IndexingScript, StructType};
use schemac_resolve::{compile, BuildOptions, CompileError, CompiledApplication};

pub fn script(text: &str) -> IndexingScript {
    text.parse().expect("valid indexing script")
}

pub fn field(name: &str, data_type: DataType, indexing: &str) -> Field {
    Field::new(name, data_type).with_indexing(script(indexing))
}

pub fn reference(name: &str, document: &str) -> Field {
    field(name, DataType::reference(document), "attribute")
}

/// `struct person { name: string, age: int }`
pub fn person() -> StructType {
    StructType::new("person")
        .with_field(Field::new("name", DataType::String))
        .with_field(Field::new("age", DataType::Int))
}

/// An `array<person>` field whose listed sub-fields are attributes.
pub fn people(name: &str, attributes: &[&str]) -> Field {
    let mut people = field(name, DataType::array(DataType::structure("person")), "summary");
    for sub in attributes {
        people = people.with_struct_field(field(sub, DataType::String, "attribute"));
    }
    people
}

pub fn compile_ok(app: Application) -> CompiledApplication {
    match compile(app, &BuildOptions::default()) {
        Ok(compiled) => compiled,
        Err(failure) => panic!("compilation failed: {}", failure),
    }
}

pub fn compile_err(app: Application) -> CompileError {
    match compile(app, &BuildOptions::default()) {
        Ok(_) => panic!("compilation unexpectedly succeeded"),
        Err(failure) => failure.error,
    }
}
