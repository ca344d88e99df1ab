//! Document references and imported fields.
//!
//! A reference-typed field links a document to a document of another type.
//! Through such a link a schema may import attribute fields of the target
//! schema under a local alias. Imports chain: a child may import a field
//! that its parent itself imported from a grandparent.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::datatype::{zcurve_field_name, DataType};
use crate::field::Attribute;

/// Stable handle of a schema in an [`Application`](crate::Application).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SchemaId(pub usize);

impl SchemaId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// An `import field <ref>.<target> as <alias>` directive, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportDirective {
    /// The `<ref>.<target>` part.
    pub reference_spec: String,
    pub alias: String,
}

impl ImportDirective {
    pub fn new(reference_spec: impl Into<String>, alias: impl Into<String>) -> Self {
        Self {
            reference_spec: reference_spec.into(),
            alias: alias.into(),
        }
    }
}

/// A reference field together with the schema its documents point to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentReference {
    pub field: String,
    pub target: SchemaId,
}

/// A field, or a struct sub-field addressed by dotted path, in some schema.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldLocation {
    pub schema: SchemaId,
    pub path: String,
}

impl FieldLocation {
    pub fn new(schema: SchemaId, path: impl Into<String>) -> Self {
        Self {
            schema,
            path: path.into(),
        }
    }
}

/// What an imported field points at in the reference's target schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "location", rename_all = "snake_case")]
pub enum ImportTarget {
    /// A field declared in the target schema.
    Field(FieldLocation),
    /// A field the target schema itself imported.
    Imported(FieldLocation),
}

impl ImportTarget {
    pub fn location(&self) -> &FieldLocation {
        match self {
            ImportTarget::Field(loc) | ImportTarget::Imported(loc) => loc,
        }
    }

    pub fn is_imported(&self) -> bool {
        matches!(self, ImportTarget::Imported(_))
    }
}

/// A resolved imported field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportedField {
    /// Local name: the alias, or `alias.subpath` for nested fields.
    pub name: String,
    pub reference: DocumentReference,
    pub target: ImportTarget,
    /// The declared field at the end of the import chain.
    pub ultimate: FieldLocation,
    pub data_type: DataType,
    pub shape: ImportedShape,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ImportedShape {
    /// A single attribute.
    Leaf {
        attribute: Attribute,
        /// The target is a position; the import reads its zcurve attribute.
        #[serde(default)]
        zcurve: bool,
    },
    /// A struct or map field; only attribute sub-fields are imported.
    Composite {
        fields: IndexMap<String, ImportedField>,
    },
}

impl ImportedField {
    pub fn is_composite(&self) -> bool {
        matches!(self.shape, ImportedShape::Composite { .. })
    }

    pub fn is_position(&self) -> bool {
        matches!(self.shape, ImportedShape::Leaf { zcurve: true, .. })
    }

    pub fn attribute(&self) -> Option<&Attribute> {
        match &self.shape {
            ImportedShape::Leaf { attribute, .. } => Some(attribute),
            ImportedShape::Composite { .. } => None,
        }
    }

    /// Local name of the attribute holding this field's value.
    pub fn attribute_name(&self) -> String {
        if self.is_position() {
            zcurve_field_name(&self.name)
        } else {
            self.name.clone()
        }
    }

    /// Nested imported fields keyed by sub-path; empty for leaves.
    pub fn nested_fields(&self) -> Option<&IndexMap<String, ImportedField>> {
        match &self.shape {
            ImportedShape::Composite { fields } => Some(fields),
            ImportedShape::Leaf { .. } => None,
        }
    }

    /// Looks up a nested imported field by its sub-path (`value.name`).
    pub fn nested(&self, path: &str) -> Option<&ImportedField> {
        self.nested_fields().and_then(|fields| fields.get(path))
    }

    /// Every leaf reachable from this field, including itself when it is one.
    pub fn leaves(&self) -> Vec<&ImportedField> {
        match &self.shape {
            ImportedShape::Leaf { .. } => vec![self],
            ImportedShape::Composite { fields } => {
                fields.values().flat_map(ImportedField::leaves).collect()
            }
        }
    }
}
