//! Fields and their materializations.
//!
//! A [`Field`] starts out as the parser left it: a name, a data type, a raw
//! indexing script and the declared settings blocks. The resolve passes
//! fill in the materialized parts ([`Attribute`], [`Index`], synthesized
//! struct sub-fields) in place.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::datatype::DataType;
use crate::indexing::IndexingScript;
use crate::summary::SummaryTransform;

/// Stemming mode applied when tokenizing for an index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Stemming {
    None,
    #[default]
    Best,
    Shortest,
    Multiple,
}

impl Stemming {
    pub fn name(self) -> &'static str {
        match self {
            Stemming::None => "NONE",
            Stemming::Best => "BEST",
            Stemming::Shortest => "SHORTEST",
            Stemming::Multiple => "MULTIPLE",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_uppercase().as_str() {
            "NONE" => Some(Stemming::None),
            "BEST" => Some(Stemming::Best),
            "SHORTEST" => Some(Stemming::Shortest),
            "MULTIPLE" => Some(Stemming::Multiple),
            _ => None,
        }
    }
}

/// How query terms are matched against the field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    #[default]
    Text,
    Word,
    Exact,
    Prefix,
    Gram,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Casing {
    #[default]
    Uncased,
    Cased,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Matching {
    #[serde(default, rename = "type")]
    pub match_type: MatchType,
    #[serde(default)]
    pub casing: Casing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Normalizing {
    #[default]
    Accent,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DictionaryType {
    Btree,
    Hash,
    BtreeAndHash,
}

impl DictionaryType {
    pub fn has_hash(self) -> bool {
        matches!(self, DictionaryType::Hash | DictionaryType::BtreeAndHash)
    }
}

/// Explicit `dictionary` control on an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Dictionary {
    #[serde(rename = "type")]
    pub dictionary_type: DictionaryType,
    #[serde(default)]
    pub casing: Option<Casing>,
}

/// The declared `attribute { ... }` settings block of a field.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AttributeSettings {
    pub fast_search: bool,
    pub fast_rank: bool,
    pub fast_access: bool,
    pub paged: bool,
    pub mutable: bool,
    pub dictionary: Option<Dictionary>,
}

/// Shape of the values stored in an attribute.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionType {
    Single,
    Array,
    WeightedSet,
}

impl CollectionType {
    pub fn of(data_type: &DataType) -> Self {
        match data_type {
            DataType::Array(_) => CollectionType::Array,
            DataType::WeightedSet(_) => CollectionType::WeightedSet,
            _ => CollectionType::Single,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            CollectionType::Single => "single",
            CollectionType::Array => "array",
            CollectionType::WeightedSet => "weightedset",
        }
    }
}

/// A materialized attribute: the field's value kept in memory for sorting,
/// grouping, ranking and attribute-backed summaries.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attribute {
    pub name: String,
    /// Type of a single stored value, collection wrapper removed.
    pub value_type: DataType,
    pub collection: CollectionType,
    pub fast_search: bool,
    pub fast_rank: bool,
    pub fast_access: bool,
    pub paged: bool,
    pub mutable: bool,
    pub dictionary: Option<Dictionary>,
    pub casing: Casing,
}

impl Attribute {
    /// Derives an attribute for `name` of type `data_type` with the declared settings applied.
    pub fn derive(name: &str, data_type: &DataType, settings: &AttributeSettings, casing: Casing) -> Self {
        Self {
            name: name.to_string(),
            value_type: data_type.primitive_base().clone(),
            collection: CollectionType::of(data_type),
            fast_search: settings.fast_search,
            fast_rank: settings.fast_rank,
            fast_access: settings.fast_access,
            paged: settings.paged,
            mutable: settings.mutable,
            dictionary: settings.dictionary,
            casing,
        }
    }
}

/// Declared `index { ... }` settings, used by predicate fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexSettings {
    pub arity: Option<u32>,
    pub lower_bound: Option<i64>,
    pub upper_bound: Option<i64>,
}

/// A materialized inverted index on a field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Index {
    pub name: String,
    pub stemming: Stemming,
    pub normalizing: Normalizing,
    pub settings: IndexSettings,
}

/// Field-level summary directives (`summary: matched-elements-only`, ...).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SummaryOptions {
    pub matched_elements_only: bool,
    pub select_elements_by: Option<String>,
    pub transform: Option<SummaryTransform>,
}

/// Where a field came from.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldOrigin {
    #[default]
    Declared,
    /// Synthesized zcurve attribute of the named position field.
    ZCurveOf(String),
}

/// A document field, extra field, or struct sub-field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub data_type: DataType,
    #[serde(default)]
    pub indexing: IndexingScript,
    #[serde(default)]
    pub attribute_settings: AttributeSettings,
    #[serde(default)]
    pub index_settings: IndexSettings,
    #[serde(default)]
    pub matching: Matching,
    #[serde(default)]
    pub normalizing: Normalizing,
    #[serde(default)]
    pub stemming: Stemming,
    #[serde(default)]
    pub summary_options: SummaryOptions,
    /// Sub-fields of struct, array-of-struct and map fields, keyed by their
    /// path relative to this field (`key`, `value`, `value.name`, ...).
    #[serde(default)]
    pub struct_fields: IndexMap<String, Field>,
    #[serde(default = "default_in_document")]
    pub in_document: bool,
    #[serde(default)]
    pub origin: FieldOrigin,
    #[serde(default)]
    pub attribute: Option<Attribute>,
    #[serde(default)]
    pub index: Option<Index>,
}

fn default_in_document() -> bool {
    true
}

impl Field {
    pub fn new(name: impl Into<String>, data_type: DataType) -> Self {
        Self {
            name: name.into(),
            data_type,
            indexing: IndexingScript::default(),
            attribute_settings: AttributeSettings::default(),
            index_settings: IndexSettings::default(),
            matching: Matching::default(),
            normalizing: Normalizing::default(),
            stemming: Stemming::default(),
            summary_options: SummaryOptions::default(),
            struct_fields: IndexMap::new(),
            in_document: true,
            origin: FieldOrigin::Declared,
            attribute: None,
            index: None,
        }
    }

    /// Sets the raw indexing script.
    pub fn with_indexing(mut self, script: IndexingScript) -> Self {
        self.indexing = script;
        self
    }

    pub fn with_attribute_settings(mut self, settings: AttributeSettings) -> Self {
        self.attribute_settings = settings;
        self
    }

    pub fn with_struct_field(mut self, field: Field) -> Self {
        self.struct_fields.insert(field.name.clone(), field);
        self
    }

    pub fn outside_document(mut self) -> Self {
        self.in_document = false;
        self
    }

    pub fn has_attribute(&self) -> bool {
        self.attribute.is_some()
    }

    pub fn has_index(&self) -> bool {
        self.index.is_some()
    }

    /// Looks up a sub-field by its dotted path relative to this field.
    pub fn struct_field(&self, path: &str) -> Option<&Field> {
        self.struct_fields.get(path)
    }

    /// Leaf sub-fields: those that have no sub-fields of their own.
    pub fn leaf_struct_fields(&self) -> impl Iterator<Item = (&String, &Field)> {
        self.struct_fields.iter().filter(move |(path, _)| {
            let prefix = format!("{}.", path);
            !self.struct_fields.keys().any(|other| other.starts_with(&prefix))
        })
    }

    pub fn zcurve_source(&self) -> Option<&str> {
        match &self.origin {
            FieldOrigin::ZCurveOf(position) => Some(position),
            FieldOrigin::Declared => None,
        }
    }
}
