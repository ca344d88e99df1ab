//! Struct-field synthesis.
//!
//! Struct, array-of-struct and map fields get their complete sub-field tree
//! materialized from the document's struct declarations, keyed by path
//! relative to the field (`name`, `key`, `value`, `value.name`, ...).
//! Settings declared on a sub-field (`struct-field name { indexing: attribute }`)
//! are kept; its type always comes from the struct declaration.

use indexmap::IndexMap;
use schemac_model::{DataType, Field, StructType};

use crate::error::{CompileError, CompileResult, ErrorKind};
use crate::resolve::pipeline::{Pass, SchemaContext};

pub struct SynthesizeStructFields;

impl Pass for SynthesizeStructFields {
    fn name(&self) -> &'static str {
        "struct-fields"
    }

    fn run(&self, ctx: &mut SchemaContext<'_>) -> CompileResult<()> {
        let schema_name = ctx.schema.name.clone();
        let structs = ctx.schema.document.structs.clone();
        for field in ctx.schema.fields_mut() {
            synthesize_struct_fields(&schema_name, &structs, field)?;
        }
        Ok(())
    }
}

/// Rebuilds `field.struct_fields` from the struct declarations.
pub fn synthesize_struct_fields(
    schema: &str,
    structs: &IndexMap<String, StructType>,
    field: &mut Field,
) -> CompileResult<()> {
    let mut expander = Expander {
        schema,
        field: &field.name,
        structs,
        stack: Vec::new(),
        paths: Vec::new(),
    };
    match &field.data_type {
        DataType::Struct(name) => expander.expand(name, "")?,
        DataType::Array(inner) | DataType::WeightedSet(inner) => {
            if let DataType::Struct(name) = inner.as_ref() {
                expander.expand(name, "")?;
            }
        }
        DataType::Map(key, value) => {
            expander.paths.push(("key".to_string(), key.as_ref().clone()));
            expander
                .paths
                .push(("value".to_string(), value.as_ref().clone()));
            if let DataType::Struct(name) = value.as_ref() {
                expander.expand(name, "value.")?;
            }
        }
        _ => {}
    }
    let paths = expander.paths;
    if paths.is_empty() {
        return Ok(());
    }

    let mut declared = std::mem::take(&mut field.struct_fields);
    let mut synthesized = IndexMap::with_capacity(paths.len());
    for (path, data_type) in paths {
        let sub = match declared.shift_remove(&path) {
            Some(mut sub) => {
                sub.name = path.clone();
                sub.data_type = data_type;
                sub
            }
            None => Field::new(path.clone(), data_type),
        };
        synthesized.insert(path, sub);
    }
    if let Some(unknown) = declared.keys().next() {
        return Err(CompileError::field(
            ErrorKind::UnknownField,
            schema,
            &field.name,
            format!(
                "Struct field '{}' does not exist in type '{}'",
                unknown, field.data_type
            ),
        ));
    }
    field.struct_fields = synthesized;
    Ok(())
}

struct Expander<'a> {
    schema: &'a str,
    field: &'a str,
    structs: &'a IndexMap<String, StructType>,
    stack: Vec<String>,
    paths: Vec<(String, DataType)>,
}

impl Expander<'_> {
    fn expand(&mut self, struct_name: &str, prefix: &str) -> CompileResult<()> {
        if self.stack.iter().any(|s| s == struct_name) {
            return Err(CompileError::field(
                ErrorKind::RecursiveStruct,
                self.schema,
                self.field,
                format!("Struct type '{}' contains itself", struct_name),
            ));
        }
        let structs = self.structs;
        let declaration = structs.get(struct_name).ok_or_else(|| {
            CompileError::field(
                ErrorKind::UnknownStruct,
                self.schema,
                self.field,
                format!("Struct type '{}' is not declared", struct_name),
            )
        })?;

        self.stack.push(struct_name.to_string());
        for sub in declaration.fields.values() {
            let path = format!("{}{}", prefix, sub.name);
            self.paths.push((path.clone(), sub.data_type.clone()));
            if let Some(inner) = sub.data_type.struct_name() {
                self.expand(inner, &format!("{}.", path))?;
            }
        }
        self.stack.pop();
        Ok(())
    }
}
