//! Per-field rank settings of rank profiles.
//!
//! Settings must name an existing field, and `rank: filter` excludes
//! `filter-threshold`.

use schemac_model::Schema;

use crate::error::{CompileError, ErrorKind};

pub(super) fn validate_rank_filters(schema: &Schema) -> Vec<CompileError> {
    let mut errors = Vec::new();
    for profile in schema.rank_profiles.values() {
        for (field, settings) in &profile.field_settings {
            if schema.field(field).is_none() && schema.imported_field(field).is_none() {
                errors.push(CompileError::schema(
                    ErrorKind::UnknownField,
                    &schema.name,
                    format!(
                        "rank-profile '{}' has rank settings for unknown field '{}'",
                        profile.name, field
                    ),
                ));
                continue;
            }
            if settings.filter && settings.filter_threshold.is_some() {
                errors.push(CompileError::schema(
                    ErrorKind::InvalidSettings,
                    &schema.name,
                    format!(
                        "rank-profile '{}': field '{}' cannot have both 'rank: filter' and 'filter-threshold'",
                        profile.name, field
                    ),
                ));
            }
        }
    }
    errors
}
