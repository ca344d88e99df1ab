//! Schemas and the application-wide schema arena.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::field::Field;
use crate::imported::{DocumentReference, ImportDirective, ImportedField, SchemaId};
use crate::indexing::IndexingScript;
use crate::rank::{RankProfile, DEFAULT_RANK_PROFILE};
use crate::summary::{DocumentSummary, DEFAULT_SUMMARY};

/// A struct type declared inside a document type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructType {
    pub name: String,
    #[serde(default)]
    pub fields: IndexMap<String, Field>,
}

impl StructType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: IndexMap::new(),
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.fields.insert(field.name.clone(), field);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentType {
    pub name: String,
    #[serde(default)]
    pub inherits: Vec<String>,
    #[serde(default)]
    pub structs: IndexMap<String, StructType>,
    #[serde(default)]
    pub fields: IndexMap<String, Field>,
}

impl DocumentType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inherits: Vec::new(),
            structs: IndexMap::new(),
            fields: IndexMap::new(),
        }
    }
}

/// A named group of fields searched together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldSet {
    pub name: String,
    pub fields: Vec<String>,
}

/// The compiled model of one document type.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schema {
    pub name: String,
    pub document: DocumentType,
    /// Fields declared outside the document block.
    #[serde(default)]
    pub extra_fields: IndexMap<String, Field>,
    #[serde(default)]
    pub summaries: IndexMap<String, DocumentSummary>,
    #[serde(default)]
    pub field_sets: IndexMap<String, FieldSet>,
    #[serde(default)]
    pub rank_profiles: IndexMap<String, RankProfile>,
    /// Import directives as the parser captured them.
    #[serde(default)]
    pub import_directives: Vec<ImportDirective>,

    /// Resolved imports, keyed by alias.
    #[serde(default)]
    pub imported_fields: IndexMap<String, ImportedField>,
    /// One entry per reference field of the document.
    #[serde(default)]
    pub document_references: Vec<DocumentReference>,
    /// Canonical indexing script per field, after rewriting.
    #[serde(default)]
    pub final_scripts: IndexMap<String, IndexingScript>,
}

impl Schema {
    /// Creates a schema whose document type has the same name.
    pub fn new(name: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            document: DocumentType::new(name.clone()),
            name,
            extra_fields: IndexMap::new(),
            summaries: IndexMap::new(),
            field_sets: IndexMap::new(),
            rank_profiles: IndexMap::new(),
            import_directives: Vec::new(),
            imported_fields: IndexMap::new(),
            document_references: Vec::new(),
            final_scripts: IndexMap::new(),
        }
    }

    pub fn with_field(mut self, field: Field) -> Self {
        self.add_field(field);
        self
    }

    pub fn with_struct(mut self, struct_type: StructType) -> Self {
        self.document
            .structs
            .insert(struct_type.name.clone(), struct_type);
        self
    }

    pub fn with_import(mut self, reference_spec: &str, alias: &str) -> Self {
        self.import_directives
            .push(ImportDirective::new(reference_spec, alias));
        self
    }

    pub fn with_summary(mut self, summary: DocumentSummary) -> Self {
        self.summaries.insert(summary.name.clone(), summary);
        self
    }

    pub fn with_rank_profile(mut self, profile: RankProfile) -> Self {
        self.rank_profiles.insert(profile.name.clone(), profile);
        self
    }

    pub fn with_field_set(mut self, name: &str, fields: &[&str]) -> Self {
        self.field_sets.insert(
            name.to_string(),
            FieldSet {
                name: name.to_string(),
                fields: fields.iter().map(|f| f.to_string()).collect(),
            },
        );
        self
    }

    pub fn inheriting(mut self, parent: impl Into<String>) -> Self {
        self.document.inherits.push(parent.into());
        self
    }

    /// Adds a field to the document block, or to the extra fields when it is
    /// declared outside the document.
    pub fn add_field(&mut self, field: Field) {
        if field.in_document {
            self.document.fields.insert(field.name.clone(), field);
        } else {
            self.extra_fields.insert(field.name.clone(), field);
        }
    }

    /// Looks up a document or extra field by name.
    pub fn field(&self, name: &str) -> Option<&Field> {
        self.document
            .fields
            .get(name)
            .or_else(|| self.extra_fields.get(name))
    }

    pub fn field_mut(&mut self, name: &str) -> Option<&mut Field> {
        match self.document.fields.get_mut(name) {
            Some(field) => Some(field),
            None => self.extra_fields.get_mut(name),
        }
    }

    /// Document fields first, then extra fields, each in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = &Field> {
        self.document
            .fields
            .values()
            .chain(self.extra_fields.values())
    }

    pub fn fields_mut(&mut self) -> impl Iterator<Item = &mut Field> {
        self.document
            .fields
            .values_mut()
            .chain(self.extra_fields.values_mut())
    }

    pub fn field_names(&self) -> Vec<String> {
        self.fields().map(|f| f.name.clone()).collect()
    }

    pub fn imported_field(&self, name: &str) -> Option<&ImportedField> {
        self.imported_fields.get(name)
    }

    /// The `default` summary, created on first use.
    pub fn default_summary_mut(&mut self) -> &mut DocumentSummary {
        self.summaries
            .entry(DEFAULT_SUMMARY.to_string())
            .or_insert_with(|| DocumentSummary::new(DEFAULT_SUMMARY))
    }

    pub fn ensure_default_rank_profile(&mut self) {
        self.rank_profiles
            .entry(DEFAULT_RANK_PROFILE.to_string())
            .or_insert_with(|| RankProfile::new(DEFAULT_RANK_PROFILE));
    }
}

/// All schemas of an application, addressed by [`SchemaId`].
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Application {
    pub schemas: Vec<Schema>,
}

impl Application {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_schema(mut self, schema: Schema) -> Self {
        self.add(schema);
        self
    }

    pub fn add(&mut self, schema: Schema) -> SchemaId {
        self.schemas.push(schema);
        SchemaId(self.schemas.len() - 1)
    }

    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }

    pub fn get(&self, id: SchemaId) -> Option<&Schema> {
        self.schemas.get(id.0)
    }

    pub fn get_mut(&mut self, id: SchemaId) -> Option<&mut Schema> {
        self.schemas.get_mut(id.0)
    }

    pub fn ids(&self) -> impl Iterator<Item = SchemaId> {
        (0..self.schemas.len()).map(SchemaId)
    }

    pub fn iter(&self) -> impl Iterator<Item = (SchemaId, &Schema)> {
        self.schemas.iter().enumerate().map(|(i, s)| (SchemaId(i), s))
    }

    /// Finds a schema by schema name.
    pub fn schema_id(&self, name: &str) -> Option<SchemaId> {
        self.schemas
            .iter()
            .position(|s| s.name == name)
            .map(SchemaId)
    }

    /// Finds the schema owning the named document type.
    pub fn by_document(&self, document: &str) -> Option<SchemaId> {
        self.schemas
            .iter()
            .position(|s| s.document.name == document)
            .map(SchemaId)
    }

    pub fn by_name(&self, name: &str) -> Option<&Schema> {
        self.schema_id(name).and_then(|id| self.get(id))
    }

    /// Splits the arena into the schema being processed and read-only
    /// access to all the others.
    pub fn split_mut(&mut self, id: SchemaId) -> Option<(&mut Schema, OtherSchemas<'_>)> {
        if id.0 >= self.schemas.len() {
            return None;
        }
        let (before, rest) = self.schemas.split_at_mut(id.0);
        let (current, after) = rest.split_first_mut()?;
        Some((
            current,
            OtherSchemas {
                before,
                after,
                split: id.0,
            },
        ))
    }
}

/// Read-only view of every schema except the one currently being processed.
#[derive(Debug, Clone, Copy)]
pub struct OtherSchemas<'a> {
    before: &'a [Schema],
    after: &'a [Schema],
    split: usize,
}

impl<'a> OtherSchemas<'a> {
    /// Returns `None` for unknown ids and for the schema being processed.
    pub fn get(&self, id: SchemaId) -> Option<&'a Schema> {
        match id.0.cmp(&self.split) {
            std::cmp::Ordering::Less => self.before.get(id.0),
            std::cmp::Ordering::Equal => None,
            std::cmp::Ordering::Greater => self.after.get(id.0 - self.split - 1),
        }
    }
}
