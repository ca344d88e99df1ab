//! Reserved names.
//!
//! Document types cannot be named like query-language keywords. Rank
//! functions named like built-in rank features shadow them, which is
//! allowed but reported.

use schemac_model::Schema;

use crate::error::{CompileError, ErrorKind};

/// Query-language keywords.
const RESERVED_DOCUMENT_NAMES: &[&str] = &[
    "alias", "all", "and", "any", "as", "asc", "ascending", "by", "contains", "desc",
    "descending", "each", "false", "from", "group", "index", "limit", "matches", "not", "null",
    "offset", "or", "order", "output", "phrase", "range", "rank", "select", "sddocname",
    "source", "sources", "summary", "timeout", "true", "uri", "weightedset", "where", "with",
];

/// Built-in rank features.
const RESERVED_RANK_FUNCTIONS: &[&str] = &[
    "age",
    "attribute",
    "bm25",
    "closeness",
    "distance",
    "elementCompleteness",
    "fieldLength",
    "fieldMatch",
    "fieldTermMatch",
    "firstPhase",
    "freshness",
    "itemRawScore",
    "matchCount",
    "matches",
    "nativeAttributeMatch",
    "nativeFieldMatch",
    "nativeProximity",
    "nativeRank",
    "now",
    "query",
    "random",
    "rawScore",
    "secondPhase",
    "term",
    "termDistance",
    "textSimilarity",
];

pub fn is_reserved_document_name(name: &str) -> bool {
    RESERVED_DOCUMENT_NAMES.contains(&name.to_ascii_lowercase().as_str())
}

pub fn is_reserved_rank_function(name: &str) -> bool {
    RESERVED_RANK_FUNCTIONS.contains(&name)
}

pub(super) fn validate_document_name(schema: &Schema) -> Vec<CompileError> {
    let name = &schema.document.name;
    if !is_reserved_document_name(name) {
        return Vec::new();
    }
    vec![CompileError::schema(
        ErrorKind::ReservedName,
        &schema.name,
        format!("Document name '{}' is a reserved name", name),
    )]
}

pub(super) fn validate_rank_functions(schema: &Schema) -> Vec<CompileError> {
    let mut warnings = Vec::new();
    for profile in schema.rank_profiles.values() {
        for function in profile.functions.keys() {
            if is_reserved_rank_function(function) {
                warnings.push(CompileError::warning(
                    ErrorKind::ReservedName,
                    format!(
                        "Function '{}' in rank profile '{}' has a reserved name. \
                         This might mean that the function shadows the built-in function with the same name.",
                        function, profile.name
                    ),
                ));
            }
        }
    }
    warnings
}
