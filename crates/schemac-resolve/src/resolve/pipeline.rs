//! Compiler pipeline for schemac.
//!
//! This module orchestrates the resolution and validation passes that turn
//! the parser's unresolved [`Application`] into a fully resolved one.
//!
//! # Order
//!
//! ```text
//! inheritance → references → processing order
//!     → per schema, in processing order:
//!       struct fields → positions → attributes → imports → summaries
//!       → indexing scripts → field validation → transforms → summary validation
//! ```
//!
//! Schemas are processed so that every schema referenced by another is
//! complete before the referencing schema resolves its imports. The first
//! fatal diagnostic aborts the whole build; warnings accumulate.

use std::fmt;

use schemac_model::{Application, OtherSchemas, Schema, SchemaId};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CompileError, CompileResult, Diagnostics, ErrorKind, Severity};
use crate::resolve::attributes::MaterializeAttributes;
use crate::resolve::imports::ResolveImports;
use crate::resolve::indexing::RewriteIndexing;
use crate::resolve::inheritance::flatten_inheritance;
use crate::resolve::ordering::{link_references, processing_order};
use crate::resolve::positions::SynthesizePositions;
use crate::resolve::structs::SynthesizeStructFields;
use crate::resolve::summaries::CollectSummaries;
use crate::resolve::transforms::InferTransforms;
use crate::resolve::validation::{ValidateFields, ValidateSummaries};

/// Build flags shared by every pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BuildOptions {
    /// Run the consistency validators.
    pub validate: bool,
    /// Only the document types are needed; skip summary and rank passes.
    pub documents_only: bool,
    /// Fail the build if any warning was reported.
    pub warnings_as_errors: bool,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            validate: true,
            documents_only: false,
            warnings_as_errors: false,
        }
    }
}

/// Everything a pass may touch while processing one schema.
pub struct SchemaContext<'a> {
    pub id: SchemaId,
    pub schema: &'a mut Schema,
    /// All other schemas; those referenced by `schema` are already processed.
    pub others: OtherSchemas<'a>,
    pub diagnostics: &'a mut Diagnostics,
    pub options: &'a BuildOptions,
}

/// One per-schema compiler pass.
pub trait Pass {
    fn name(&self) -> &'static str;

    /// Whether the pass runs under `options`.
    fn enabled(&self, _options: &BuildOptions) -> bool {
        true
    }

    fn run(&self, ctx: &mut SchemaContext<'_>) -> CompileResult<()>;
}

/// The per-schema passes, in execution order.
pub fn default_passes() -> Vec<Box<dyn Pass>> {
    vec![
        Box::new(SynthesizeStructFields),
        Box::new(SynthesizePositions),
        Box::new(MaterializeAttributes),
        Box::new(ResolveImports),
        Box::new(CollectSummaries),
        Box::new(RewriteIndexing),
        Box::new(ValidateFields),
        Box::new(InferTransforms),
        Box::new(ValidateSummaries),
    ]
}

/// A successfully compiled application.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledApplication {
    pub application: Application,
    /// Non-fatal diagnostics, in the order they were reported.
    pub warnings: Vec<CompileError>,
    /// Order in which the schemas were processed.
    pub order: Vec<SchemaId>,
}

/// A failed build: the fatal diagnostic and everything reported before it.
#[derive(Debug, Clone, PartialEq)]
pub struct BuildFailure {
    pub error: CompileError,
    pub warnings: Vec<CompileError>,
}

impl fmt::Display for BuildFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for BuildFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Compiles an application with the default pass list.
///
/// This is the main entry point of the resolve crate. Compiling the
/// returned application again yields the same application.
pub fn compile(
    application: Application,
    options: &BuildOptions,
) -> Result<CompiledApplication, BuildFailure> {
    compile_with(application, options, &default_passes())
}

/// Compiles an application with an explicit pass list.
pub fn compile_with(
    mut application: Application,
    options: &BuildOptions,
    passes: &[Box<dyn Pass>],
) -> Result<CompiledApplication, BuildFailure> {
    let mut diagnostics = Diagnostics::new();

    let order = match run_passes(&mut application, options, passes, &mut diagnostics) {
        Ok(order) => order,
        Err(error) => {
            return Err(BuildFailure {
                error,
                warnings: diagnostics.into_vec(),
            })
        }
    };

    if options.warnings_as_errors {
        let first = diagnostics.warnings().next().cloned();
        let count = diagnostics.warnings().count();
        if let Some(first) = first {
            let mut error = first;
            error.severity = Severity::Error;
            let error = error.with_note(format!("{} warning(s) treated as errors", count));
            return Err(BuildFailure {
                error,
                warnings: diagnostics.into_vec(),
            });
        }
    }

    Ok(CompiledApplication {
        application,
        warnings: diagnostics.into_vec(),
        order,
    })
}

fn run_passes(
    application: &mut Application,
    options: &BuildOptions,
    passes: &[Box<dyn Pass>],
    diagnostics: &mut Diagnostics,
) -> CompileResult<Vec<SchemaId>> {
    // 1. Merge inherited document members, summaries and rank profiles
    flatten_inheritance(application)?;

    // 2. Reference graph: link references, then order (fails on cycles)
    link_references(application)?;
    let order = processing_order(application)?;
    info!(
        order = ?order
            .iter()
            .filter_map(|id| application.get(*id).map(|s| s.name.as_str()))
            .collect::<Vec<_>>(),
        "schema processing order"
    );

    // 3. Per-schema passes
    for &id in &order {
        let (schema, others) = application.split_mut(id).ok_or_else(|| {
            CompileError::new(
                ErrorKind::Internal,
                format!("Schema id {} out of range", id.index()),
            )
        })?;
        let mut ctx = SchemaContext {
            id,
            schema,
            others,
            diagnostics: &mut *diagnostics,
            options,
        };
        for pass in passes {
            if !pass.enabled(options) {
                continue;
            }
            debug!(pass = pass.name(), schema = %ctx.schema.name, "running pass");
            pass.run(&mut ctx)?;
        }
    }

    Ok(order)
}

/// Runs a single pass on one schema of `app`.
#[cfg(test)]
pub(crate) fn run_single_pass(
    pass: &dyn Pass,
    app: &mut Application,
    id: SchemaId,
    options: &BuildOptions,
) -> (CompileResult<()>, Diagnostics) {
    let mut diagnostics = Diagnostics::new();
    let result = match app.split_mut(id) {
        Some((schema, others)) => {
            let mut ctx = SchemaContext {
                id,
                schema,
                others,
                diagnostics: &mut diagnostics,
                options,
            };
            pass.run(&mut ctx)
        }
        None => Err(CompileError::new(ErrorKind::Internal, "no such schema")),
    };
    (result, diagnostics)
}
