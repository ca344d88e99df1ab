//! Document summaries: the named result records returned with query hits.

use std::fmt;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::datatype::DataType;

/// Name of the summary every schema has, collecting all `summary` sinks.
pub const DEFAULT_SUMMARY: &str = "default";

/// How a summary field's value is materialized from its source fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SummaryTransform {
    #[default]
    None,
    Attribute,
    AttributeCombiner,
    MatchedElementsFilter,
    MatchedAttributeElementsFilter,
    Geopos,
    Positions,
    Distance,
    Copy,
    DynamicTeaser,
    Tokens,
    AttributeTokens,
    DocumentId,
    SummaryFeatures,
    RankFeatures,
}

impl SummaryTransform {
    pub fn name(self) -> &'static str {
        match self {
            SummaryTransform::None => "none",
            SummaryTransform::Attribute => "attribute",
            SummaryTransform::AttributeCombiner => "attribute-combiner",
            SummaryTransform::MatchedElementsFilter => "matched-elements-filter",
            SummaryTransform::MatchedAttributeElementsFilter => {
                "matched-attribute-elements-filter"
            }
            SummaryTransform::Geopos => "geopos",
            SummaryTransform::Positions => "positions",
            SummaryTransform::Distance => "distance",
            SummaryTransform::Copy => "copy",
            SummaryTransform::DynamicTeaser => "dynamic-teaser",
            SummaryTransform::Tokens => "tokens",
            SummaryTransform::AttributeTokens => "attribute-tokens",
            SummaryTransform::DocumentId => "document-id",
            SummaryTransform::SummaryFeatures => "summary-features",
            SummaryTransform::RankFeatures => "rank-features",
        }
    }

    /// Transforms that filter collection elements by what matched the query.
    pub fn is_element_filter(self) -> bool {
        matches!(
            self,
            SummaryTransform::MatchedElementsFilter
                | SummaryTransform::MatchedAttributeElementsFilter
        )
    }

    /// Transforms whose value is read from attributes rather than the stored document.
    pub fn is_attribute_backed(self) -> bool {
        matches!(
            self,
            SummaryTransform::Attribute
                | SummaryTransform::AttributeCombiner
                | SummaryTransform::MatchedAttributeElementsFilter
                | SummaryTransform::Geopos
                | SummaryTransform::Positions
                | SummaryTransform::Distance
                | SummaryTransform::AttributeTokens
        )
    }

    /// Transforms computed by the search backend without reading any field.
    pub fn is_generated(self) -> bool {
        matches!(
            self,
            SummaryTransform::DocumentId
                | SummaryTransform::SummaryFeatures
                | SummaryTransform::RankFeatures
        )
    }
}

impl fmt::Display for SummaryTransform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// One field of a document summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryField {
    pub name: String,
    /// Declared type; filled from the source field when left out.
    #[serde(default)]
    pub data_type: Option<DataType>,
    /// Source fields; an empty list means the field named like this summary field.
    #[serde(default)]
    pub sources: Vec<String>,
    /// Transform named explicitly in the declaration.
    #[serde(default)]
    pub explicit_transform: Option<SummaryTransform>,
    #[serde(default)]
    pub matched_elements_only: bool,
    #[serde(default)]
    pub select_elements_by: Option<String>,
    /// Inferred transform.
    #[serde(default)]
    pub transform: SummaryTransform,
}

impl SummaryField {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
            sources: Vec::new(),
            explicit_transform: None,
            matched_elements_only: false,
            select_elements_by: None,
            transform: SummaryTransform::None,
        }
    }

    pub fn with_source(mut self, source: impl Into<String>) -> Self {
        self.sources.push(source.into());
        self
    }

    pub fn with_type(mut self, data_type: DataType) -> Self {
        self.data_type = Some(data_type);
        self
    }

    pub fn with_explicit_transform(mut self, transform: SummaryTransform) -> Self {
        self.explicit_transform = Some(transform);
        self
    }

    pub fn matched_elements_only(mut self) -> Self {
        self.matched_elements_only = true;
        self
    }

    /// The source field, or this field's own name when no source is declared.
    pub fn single_source(&self) -> &str {
        self.sources.first().map(String::as_str).unwrap_or(&self.name)
    }

    /// True when the field only renames another field.
    pub fn is_alias(&self) -> bool {
        self.sources.len() == 1 && self.sources[0] != self.name
    }
}

/// A named summary class.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub name: String,
    #[serde(default)]
    pub inherits: Vec<String>,
    /// Declared as reading from disk, which silences disk-access warnings.
    #[serde(default)]
    pub from_disk: bool,
    #[serde(default)]
    pub fields: IndexMap<String, SummaryField>,
}

impl DocumentSummary {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inherits: Vec::new(),
            from_disk: false,
            fields: IndexMap::new(),
        }
    }

    pub fn with_field(mut self, field: SummaryField) -> Self {
        self.add(field);
        self
    }

    pub fn add(&mut self, field: SummaryField) {
        self.fields.insert(field.name.clone(), field);
    }

    pub fn is_default(&self) -> bool {
        self.name == DEFAULT_SUMMARY
    }

    /// Location string used in diagnostics.
    pub fn location(&self) -> String {
        if self.is_default() {
            "summary class 'default'".to_string()
        } else {
            format!("document-summary '{}'", self.name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transform_names_are_kebab_case() {
        assert_eq!(SummaryTransform::AttributeCombiner.name(), "attribute-combiner");
        let json = serde_json::to_string(&SummaryTransform::MatchedAttributeElementsFilter).unwrap();
        assert_eq!(json, "\"matched-attribute-elements-filter\"");
    }

    #[test]
    fn test_single_source_defaults_to_own_name() {
        let field = SummaryField::new("title");
        assert_eq!(field.single_source(), "title");
        assert!(!field.is_alias());
        let alias = SummaryField::new("headline").with_source("title");
        assert_eq!(alias.single_source(), "title");
        assert!(alias.is_alias());
    }
}
