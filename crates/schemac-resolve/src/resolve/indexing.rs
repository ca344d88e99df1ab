//! Indexing script rewriting.
//!
//! Turns each field's raw indexing script into its final form:
//!
//! 1. every statement reads an explicit `input` (the field itself inside
//!    the document; some document field outside it)
//! 2. every sink names its output field
//! 3. text fields get `tokenize` before their `index` sink and predicate
//!    fields get `optimize_predicate` before their `attribute` sink
//! 4. sinks writing the same value to the same output are merged; writing
//!    different values is an error
//!
//! The final scripts are stored in [`Schema::final_scripts`]; the raw
//! scripts are left alone.

use schemac_model::{
    DataType, Field, IndexingScript, MatchType, Normalizing, Schema, SinkKind, Stage, Statement,
    Stemming,
};

use tracing::debug;

use crate::error::{CompileError, CompileResult, ErrorKind};
use crate::resolve::pipeline::{Pass, SchemaContext};

pub struct RewriteIndexing;

impl Pass for RewriteIndexing {
    fn name(&self) -> &'static str {
        "indexing"
    }

    fn run(&self, ctx: &mut SchemaContext<'_>) -> CompileResult<()> {
        let schema = &*ctx.schema;
        let mut finals = Vec::new();
        for field in schema.fields() {
            if field.indexing.is_empty() {
                continue;
            }
            let script = rewrite_script(schema, field)?;
            debug!(schema = %schema.name, field = %field.name, %script, "final indexing script");
            finals.push((field.name.clone(), script));
        }
        ctx.schema.final_scripts.clear();
        ctx.schema.final_scripts.extend(finals);
        Ok(())
    }
}

/// Computes the final script of one field.
pub fn rewrite_script(schema: &Schema, field: &Field) -> CompileResult<IndexingScript> {
    let rewriter = Rewriter { schema, field };
    let mut written: Vec<((SinkKind, String), Vec<Stage>)> = Vec::new();
    let mut statements = Vec::with_capacity(field.indexing.statements.len());
    for raw in &field.indexing.statements {
        let mut statement = rewriter.with_input(raw)?;
        rewriter.name_sinks(&mut statement);
        rewriter.check_writes(raw, &statement)?;
        rewriter.insert_tokenize(&mut statement);
        rewriter.insert_optimize_predicate(&mut statement);
        rewriter.merge_sinks(raw, &mut statement, &mut written)?;
        if statement.stages.iter().any(Stage::is_sink) {
            statements.push(statement);
        }
    }
    Ok(IndexingScript::new(statements))
}

struct Rewriter<'a> {
    schema: &'a Schema,
    field: &'a Field,
}

impl Rewriter<'_> {
    fn error(&self, kind: ErrorKind, message: String) -> CompileError {
        CompileError::field(kind, &self.schema.name, &self.field.name, message)
    }

    fn with_input(&self, raw: &Statement) -> CompileResult<Statement> {
        let mut statement = raw.clone();
        match raw.input_field() {
            None if self.field.in_document => {
                statement.stages.insert(0, Stage::input(&self.field.name));
            }
            None => {
                return Err(self.error(
                    ErrorKind::IllegalInput,
                    format!(
                        "Indexing expression '{}' must start with an 'input' stage outside the document",
                        raw
                    ),
                ))
            }
            Some(input) if self.field.in_document => {
                if input != self.field.name {
                    return Err(self.error(
                        ErrorKind::IllegalInput,
                        format!(
                            "Indexing expression '{}' attempts to read from a field other than '{}'",
                            raw, self.field.name
                        ),
                    ));
                }
            }
            Some(input) => {
                if !self.schema.document.fields.contains_key(input) {
                    return Err(self.error(
                        ErrorKind::UnknownField,
                        format!(
                            "Indexing expression '{}' reads unknown document field '{}'",
                            raw, input
                        ),
                    ));
                }
            }
        }
        Ok(statement)
    }

    fn name_sinks(&self, statement: &mut Statement) {
        for stage in &mut statement.stages {
            match stage {
                Stage::Index { field } | Stage::Attribute { field } | Stage::Summary { field } => {
                    if field.is_none() {
                        *field = Some(self.field.name.clone());
                    }
                }
                _ => {}
            }
        }
    }

    /// Outputs other than the field itself: mutable attributes and the field's z-curve.
    fn check_writes(&self, raw: &Statement, statement: &Statement) -> CompileResult<()> {
        for (kind, target) in statement.sinks() {
            let target = target.unwrap_or(&self.field.name);
            if target == self.field.name {
                continue;
            }
            let allowed = self.schema.field(target).is_some_and(|output| {
                output.zcurve_source() == Some(self.field.name.as_str())
                    || (kind == SinkKind::Attribute && output.attribute_settings.mutable)
            });
            if !allowed {
                return Err(self.error(
                    ErrorKind::IllegalWrite,
                    format!(
                        "Indexing expression '{}' attempts to write to a field other than '{}'",
                        raw, self.field.name
                    ),
                ));
            }
        }
        Ok(())
    }

    fn insert_tokenize(&self, statement: &mut Statement) {
        let mut i = 0;
        while i < statement.stages.len() {
            if let Some((SinkKind::Index, Some(target))) = statement.stages[i].as_sink() {
                let tokenized = statement.stages[..i].iter().any(Stage::is_tokenize);
                let stage = if tokenized {
                    None
                } else {
                    self.schema.field(target).and_then(tokenize_stage)
                };
                if let Some(stage) = stage {
                    statement.stages.insert(i, stage);
                    i += 1;
                }
            }
            i += 1;
        }
    }

    fn insert_optimize_predicate(&self, statement: &mut Statement) {
        if !matches!(self.field.data_type, DataType::Predicate) {
            return;
        }
        let settings = self.field.index_settings;
        let mut i = 0;
        while i < statement.stages.len() {
            let is_attribute = matches!(statement.stages[i].as_sink(), Some((SinkKind::Attribute, _)));
            let optimized = statement.stages[..i]
                .iter()
                .any(|s| matches!(s, Stage::OptimizePredicate { .. }));
            if is_attribute && !optimized {
                statement.stages.insert(
                    i,
                    Stage::OptimizePredicate {
                        arity: settings.arity,
                        lower_bound: settings.lower_bound,
                        upper_bound: settings.upper_bound,
                    },
                );
                i += 1;
            }
            i += 1;
        }
    }

    fn merge_sinks(
        &self,
        raw: &Statement,
        statement: &mut Statement,
        written: &mut Vec<((SinkKind, String), Vec<Stage>)>,
    ) -> CompileResult<()> {
        let mut kept = Vec::with_capacity(statement.stages.len());
        for (i, stage) in statement.stages.iter().enumerate() {
            let Some((kind, Some(target))) = stage.as_sink() else {
                kept.push(stage.clone());
                continue;
            };
            let chain = value_chain(&statement.stages[..i], kind);
            match written
                .iter()
                .find(|((k, t), _)| *k == kind && t == target)
            {
                Some((_, previous)) => {
                    if !chains_equal(previous, &chain) {
                        return Err(self.error(
                            ErrorKind::ConflictingWrite,
                            format!(
                                "For expression '{}': Attempting to assign conflicting values to field '{}'",
                                raw, target
                            ),
                        ));
                    }
                }
                None => {
                    written.push(((kind, target.to_string()), chain));
                    kept.push(stage.clone());
                }
            }
        }
        statement.stages = kept;
        Ok(())
    }
}

fn tokenize_stage(field: &Field) -> Option<Stage> {
    if !field.data_type.primitive_base().is_text() {
        return None;
    }
    let stem = match field.matching.match_type {
        MatchType::Word | MatchType::Exact => None,
        _ if field.stemming == Stemming::None => None,
        _ => Some(field.stemming),
    };
    Some(Stage::Tokenize {
        normalize: field.normalizing == Normalizing::Accent,
        stem,
    })
}

/// Stages producing the value a sink receives. Tokenization only
/// annotates text for the index, so other sinks ignore it.
fn value_chain(prefix: &[Stage], kind: SinkKind) -> Vec<Stage> {
    prefix
        .iter()
        .filter(|s| !s.is_sink())
        .filter(|s| kind == SinkKind::Index || !s.is_tokenize())
        .cloned()
        .collect()
}

fn chains_equal(a: &[Stage], b: &[Stage]) -> bool {
    a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.output_equal(y))
}
