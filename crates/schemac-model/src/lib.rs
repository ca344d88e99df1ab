// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Schema graph model for schemac
//!
//! This crate contains the in-memory model of a search application's
//! schemas: document types, fields, attributes, indexes, summaries,
//! document references and imported fields. The parser produces an
//! unresolved model; `schemac-resolve` mutates it in place into the
//! resolved model consumed by config generators.

pub mod datatype;
pub mod field;
pub mod imported;
pub mod indexing;
pub mod rank;
pub mod schema;
pub mod summary;

pub use datatype::{
    distance_summary_field_name, position_of_zcurve, position_summary_field_name,
    zcurve_field_name, DataType, DimensionKind, TensorDimension, TensorType,
};
pub use field::{
    Attribute, AttributeSettings, Casing, CollectionType, Dictionary, DictionaryType, Field,
    FieldOrigin, Index, IndexSettings, MatchType, Matching, Normalizing, Stemming, SummaryOptions,
};
pub use imported::{
    DocumentReference, FieldLocation, ImportDirective, ImportTarget, ImportedField,
    ImportedShape, SchemaId,
};
pub use indexing::{IndexingScript, ScriptParseError, SinkKind, Stage, Statement};
pub use rank::{FieldRankSettings, RankFunction, RankProfile, DEFAULT_RANK_PROFILE};
pub use schema::{Application, DocumentType, FieldSet, OtherSchemas, Schema, StructType};
pub use summary::{DocumentSummary, SummaryField, SummaryTransform, DEFAULT_SUMMARY};
