//! Rank profiles, as far as schema validation is concerned.
//!
//! Ranking expressions themselves are opaque strings here.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Name of the profile every schema has.
pub const DEFAULT_RANK_PROFILE: &str = "default";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankFunction {
    pub name: String,
    #[serde(default)]
    pub expression: String,
}

/// Per-field `rank` settings inside a profile.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct FieldRankSettings {
    /// `rank: filter`
    pub filter: bool,
    /// `filter-threshold: <n>`
    pub filter_threshold: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankProfile {
    pub name: String,
    #[serde(default)]
    pub inherits: Vec<String>,
    #[serde(default)]
    pub functions: IndexMap<String, RankFunction>,
    #[serde(default)]
    pub field_settings: IndexMap<String, FieldRankSettings>,
}

impl RankProfile {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            inherits: Vec::new(),
            functions: IndexMap::new(),
            field_settings: IndexMap::new(),
        }
    }

    pub fn inheriting(mut self, parent: impl Into<String>) -> Self {
        self.inherits.push(parent.into());
        self
    }

    pub fn with_function(mut self, name: impl Into<String>, expression: impl Into<String>) -> Self {
        let name = name.into();
        self.functions.insert(
            name.clone(),
            RankFunction {
                name,
                expression: expression.into(),
            },
        );
        self
    }

    pub fn with_field_settings(mut self, field: impl Into<String>, settings: FieldRankSettings) -> Self {
        self.field_settings.insert(field.into(), settings);
        self
    }
}
