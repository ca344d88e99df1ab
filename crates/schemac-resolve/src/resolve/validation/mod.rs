//! Consistency validation of a resolved schema.
//!
//! Each submodule is one independent check over the resolved schema. Checks
//! never mutate the schema; they return the diagnostics they found, fatal
//! or not.
//!
//! # What These Passes Do
//!
//! 1. **Field validation** - document name, references, dictionaries,
//!    collection types, tensors, paged and fast-access attributes, and the
//!    rank settings of every profile
//! 2. **Summary validation** - field-set consistency and summary field types
//!
//! # Pipeline Position
//!
//! ```text
//! ... → Indexing → Field Validation → Transforms → Summary Validation
//!                  ^^^^^^^^^^^^^^^^                ^^^^^^^^^^^^^^^^^^
//! ```
//!
//! Both passes only run with [`BuildOptions::validate`]. Checks that read
//! summaries or rank profiles are skipped with
//! [`BuildOptions::documents_only`].

use crate::error::{CompileError, CompileResult, Diagnostics};
use crate::resolve::pipeline::{BuildOptions, Pass, SchemaContext};

mod collections;
mod dictionary;
mod fast_access;
mod fieldsets;
mod paged;
mod rank_filters;
mod references;
mod reserved;
mod summaries;
mod tensors;

pub use reserved::{is_reserved_document_name, is_reserved_rank_function};

pub struct ValidateFields;

impl Pass for ValidateFields {
    fn name(&self) -> &'static str {
        "validate-fields"
    }

    fn enabled(&self, options: &BuildOptions) -> bool {
        options.validate
    }

    fn run(&self, ctx: &mut SchemaContext<'_>) -> CompileResult<()> {
        let schema = &*ctx.schema;
        let mut found = Vec::new();
        found.extend(reserved::validate_document_name(schema));
        found.extend(references::validate_references(schema));
        found.extend(dictionary::validate_dictionaries(schema));
        found.extend(collections::validate_collections(schema));
        found.extend(tensors::validate_tensor_attributes(schema));
        found.extend(paged::validate_paged(schema));
        found.extend(fast_access::validate_fast_access(schema));
        if !ctx.options.documents_only {
            found.extend(rank_filters::validate_rank_filters(schema));
            found.extend(reserved::validate_rank_functions(schema));
        }
        report(ctx.diagnostics, found)
    }
}

pub struct ValidateSummaries;

impl Pass for ValidateSummaries {
    fn name(&self) -> &'static str {
        "validate-summaries"
    }

    fn enabled(&self, options: &BuildOptions) -> bool {
        options.validate
    }

    fn run(&self, ctx: &mut SchemaContext<'_>) -> CompileResult<()> {
        let schema = &*ctx.schema;
        let mut found = fieldsets::validate_field_sets(schema);
        if !ctx.options.documents_only {
            found.extend(summaries::validate_summary_types(schema));
        }
        report(ctx.diagnostics, found)
    }
}

/// Records the non-fatal diagnostics and fails with the first fatal one.
fn report(sink: &mut Diagnostics, found: Vec<CompileError>) -> CompileResult<()> {
    let mut fatal = None;
    for diagnostic in found {
        if diagnostic.is_fatal() {
            fatal.get_or_insert(diagnostic);
        } else {
            sink.push(diagnostic);
        }
    }
    match fatal {
        Some(error) => Err(error),
        None => Ok(()),
    }
}

/// Materializes struct fields, positions and attributes, as the passes
/// before validation would.
#[cfg(test)]
pub(super) fn materialized(schema: schemac_model::Schema) -> schemac_model::Schema {
    use crate::resolve::attributes::MaterializeAttributes;
    use crate::resolve::pipeline::run_single_pass;
    use crate::resolve::positions::SynthesizePositions;
    use crate::resolve::structs::SynthesizeStructFields;
    use schemac_model::{Application, SchemaId};

    let mut app = Application::new().with_schema(schema);
    let passes: [&dyn Pass; 3] = [&SynthesizeStructFields, &SynthesizePositions, &MaterializeAttributes];
    for pass in passes {
        let (result, _) = run_single_pass(pass, &mut app, SchemaId(0), &BuildOptions::default());
        result.unwrap();
    }
    app.schemas.remove(0)
}

/// Parses an indexing script.
#[cfg(test)]
pub(super) fn script(text: &str) -> schemac_model::IndexingScript {
    text.parse().unwrap()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn test_report_keeps_warnings_and_first_error() {
        let mut sink = Diagnostics::new();
        let found = vec![
            CompileError::warning(ErrorKind::ReservedName, "w"),
            CompileError::new(ErrorKind::InvalidSettings, "first"),
            CompileError::new(ErrorKind::InvalidSettings, "second"),
        ];
        let err = report(&mut sink, found).unwrap_err();
        assert_eq!(err.message, "first");
        assert_eq!(sink.len(), 1);
    }
}
