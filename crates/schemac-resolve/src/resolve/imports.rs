//! Imported-field resolution.
//!
//! Each `import field <ref>.<target> as <alias>` directive is resolved
//! against the schema its reference field points at. That schema has
//! already been processed, so a target that is itself an import is followed
//! through the target's resolved table; chains of any length end at a field
//! declared in some ancestor schema.
//!
//! Leaf targets must be plain attributes. Struct and map targets import
//! every sub-field that is an attribute, keyed by sub-path.

use indexmap::IndexMap;
use schemac_model::{
    zcurve_field_name, Attribute, CollectionType, DataType, DocumentReference, Field,
    FieldLocation, ImportDirective, ImportTarget, ImportedField, ImportedShape, OtherSchemas,
    Schema, SchemaId,
};
use tracing::debug;

use crate::error::{CompileError, CompileResult, ErrorKind};
use crate::resolve::pipeline::{Pass, SchemaContext};
use crate::resolve::positions::is_position_type;

pub struct ResolveImports;

impl Pass for ResolveImports {
    fn name(&self) -> &'static str {
        "imports"
    }

    fn run(&self, ctx: &mut SchemaContext<'_>) -> CompileResult<()> {
        ctx.schema.imported_fields.clear();
        let directives = ctx.schema.import_directives.clone();
        for directive in &directives {
            if ctx.schema.imported_fields.contains_key(&directive.alias) {
                return Err(CompileError::import(
                    ErrorKind::DuplicateImport,
                    &ctx.schema.name,
                    &directive.alias,
                    format!("Field already imported as '{}'", directive.alias),
                ));
            }
            let imported = resolve_import(ctx.schema, ctx.others, directive)?;
            debug!(
                schema = %ctx.schema.name,
                alias = %directive.alias,
                ultimate = %imported.ultimate.path,
                "resolved imported field"
            );
            ctx.schema
                .imported_fields
                .insert(directive.alias.clone(), imported);
        }
        Ok(())
    }
}

/// Splits `<ref>.<target>`; anything but exactly one `.` is rejected.
fn parse_reference_spec(spec: &str) -> Option<(&str, &str)> {
    let (reference, target) = spec.split_once('.')?;
    if reference.is_empty() || target.is_empty() || target.contains('.') {
        return None;
    }
    Some((reference, target))
}

/// Resolves one directive of `schema`.
pub fn resolve_import(
    schema: &Schema,
    others: OtherSchemas<'_>,
    directive: &ImportDirective,
) -> CompileResult<ImportedField> {
    let alias = directive.alias.as_str();
    let fail = |kind, message: String| CompileError::import(kind, &schema.name, alias, message);

    let (reference_name, target_name) =
        parse_reference_spec(&directive.reference_spec).ok_or_else(|| {
            fail(
                ErrorKind::InvalidReferenceSpec,
                format!(
                    "Illegal field reference spec '{}': Does not include a single '.'",
                    directive.reference_spec
                ),
            )
        })?;

    let reference = schema
        .document_references
        .iter()
        .find(|r| r.field == reference_name)
        .ok_or_else(|| {
            fail(
                ErrorKind::UnknownReferenceField,
                format!("Reference field '{}' not found", reference_name),
            )
        })?;

    let target = others.get(reference.target).ok_or_else(|| {
        fail(
            ErrorKind::Internal,
            format!(
                "Reference field '{}' points at a schema that is not available",
                reference_name
            ),
        )
    })?;

    let resolver = TargetResolver {
        schema: &schema.name,
        alias,
        reference,
        target_id: reference.target,
    };

    if let Some(imported) = target.imported_field(target_name) {
        return Ok(resolver.reimport(imported, alias));
    }
    match target.field(target_name) {
        Some(field) => resolver.declared(target, field),
        None => Err(resolver.error(ErrorKind::UnknownImportTarget, target_name, "Not found")),
    }
}

struct TargetResolver<'a> {
    schema: &'a str,
    alias: &'a str,
    reference: &'a DocumentReference,
    target_id: SchemaId,
}

impl TargetResolver<'_> {
    fn error(&self, kind: ErrorKind, target: &str, reason: &str) -> CompileError {
        CompileError::import(
            kind,
            self.schema,
            self.alias,
            format!(
                "Field '{}' via reference field '{}': {}",
                target, self.reference.field, reason
            ),
        )
    }

    /// Multi-hop: the target schema imported the field itself.
    fn reimport(&self, imported: &ImportedField, name: &str) -> ImportedField {
        let shape = match &imported.shape {
            ImportedShape::Leaf { attribute, zcurve } => ImportedShape::Leaf {
                attribute: attribute.clone(),
                zcurve: *zcurve,
            },
            ImportedShape::Composite { fields } => ImportedShape::Composite {
                fields: fields
                    .iter()
                    .map(|(path, nested)| {
                        let nested = self.reimport(nested, &format!("{}.{}", name, path));
                        (path.clone(), nested)
                    })
                    .collect(),
            },
        };
        ImportedField {
            name: name.to_string(),
            reference: self.reference.clone(),
            target: ImportTarget::Imported(FieldLocation::new(self.target_id, &imported.name)),
            ultimate: imported.ultimate.clone(),
            data_type: imported.data_type.clone(),
            shape,
        }
    }

    fn declared(&self, target: &Schema, field: &Field) -> CompileResult<ImportedField> {
        let location = FieldLocation::new(self.target_id, &field.name);
        let shape = if is_position_type(&field.data_type) {
            let attribute = target
                .field(&zcurve_field_name(&field.name))
                .and_then(|companion| companion.attribute.clone())
                .ok_or_else(|| self.not_an_attribute(&field.name))?;
            ImportedShape::Leaf {
                attribute,
                zcurve: true,
            }
        } else if field.data_type.is_composite() {
            ImportedShape::Composite {
                fields: self.struct_leaves(field)?,
            }
        } else {
            let attribute = self.leaf_attribute(&field.name, field)?;
            ImportedShape::Leaf {
                attribute,
                zcurve: false,
            }
        };
        Ok(ImportedField {
            name: self.alias.to_string(),
            reference: self.reference.clone(),
            target: ImportTarget::Field(location.clone()),
            ultimate: location,
            data_type: field.data_type.clone(),
            shape,
        })
    }

    fn struct_leaves(&self, field: &Field) -> CompileResult<IndexMap<String, ImportedField>> {
        let mut fields = IndexMap::new();
        for (path, sub) in field.leaf_struct_fields() {
            if sub.attribute.is_none() {
                continue;
            }
            let target_path = format!("{}.{}", field.name, path);
            let attribute = self.leaf_attribute(&target_path, sub)?;
            let location = FieldLocation::new(self.target_id, &target_path);
            fields.insert(
                path.clone(),
                ImportedField {
                    name: format!("{}.{}", self.alias, path),
                    reference: self.reference.clone(),
                    target: ImportTarget::Field(location.clone()),
                    ultimate: location,
                    data_type: attribute_data_type(&attribute),
                    shape: ImportedShape::Leaf {
                        attribute,
                        zcurve: false,
                    },
                },
            );
        }
        if fields.is_empty() {
            return Err(self.error(
                ErrorKind::UnsupportedImport,
                &field.name,
                "Is not a struct containing an attribute field",
            ));
        }
        Ok(fields)
    }

    fn leaf_attribute(&self, name: &str, field: &Field) -> CompileResult<Attribute> {
        let attribute = field
            .attribute
            .clone()
            .ok_or_else(|| self.not_an_attribute(name))?;
        if field.has_index() {
            return Err(self.error(
                ErrorKind::UnsupportedImport,
                name,
                "Is an index field. Not supported",
            ));
        }
        if matches!(field.data_type, DataType::Predicate) {
            return Err(self.error(
                ErrorKind::UnsupportedImport,
                name,
                "Is of type 'predicate'. Not supported",
            ));
        }
        Ok(attribute)
    }

    fn not_an_attribute(&self, name: &str) -> CompileError {
        self.error(
            ErrorKind::UnsupportedImport,
            name,
            "Is not an attribute field. Only attribute fields supported",
        )
    }
}

/// The value type an attribute exposes, collection included.
pub fn attribute_data_type(attribute: &Attribute) -> DataType {
    let value = attribute.value_type.clone();
    match attribute.collection {
        CollectionType::Single => value,
        CollectionType::Array => DataType::array(value),
        CollectionType::WeightedSet => DataType::weighted_set(value),
    }
}
