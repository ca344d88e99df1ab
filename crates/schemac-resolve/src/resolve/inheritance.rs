//! Inheritance flattening.
//!
//! Document types, document-summaries and rank profiles may inherit from
//! others. Inheritance is flattened once, before any other pass: each child
//! receives copies of every inherited member it does not declare itself.
//! Inherited members come first, in parent order, followed by the child's
//! own members in declaration order; a member declared in both is the
//! child's. Flattening an already flattened application changes nothing.

use indexmap::IndexMap;
use schemac_model::{Application, Schema};

use crate::error::{CompileError, CompileResult, ErrorKind};

/// Flattens document, summary and rank-profile inheritance in place.
pub fn flatten_inheritance(app: &mut Application) -> CompileResult<()> {
    flatten_documents(app)?;
    for schema in &mut app.schemas {
        flatten_summaries(schema)?;
        flatten_rank_profiles(schema)?;
    }
    Ok(())
}

// =============================================================================
// Document types
// =============================================================================

fn flatten_documents(app: &mut Application) -> CompileResult<()> {
    let mut parents = Vec::with_capacity(app.len());
    for schema in &app.schemas {
        let mut ids = Vec::new();
        for parent in &schema.document.inherits {
            let id = app.by_document(parent).ok_or_else(|| {
                CompileError::new(
                    ErrorKind::UnknownDocumentType,
                    format!(
                        "Document type '{}' inherits unknown document type '{}'",
                        schema.document.name, parent
                    ),
                )
            })?;
            ids.push(id.index());
        }
        parents.push(ids);
    }

    let order = linearize(&parents).map_err(|cycle| {
        let names: Vec<&str> = cycle
            .iter()
            .map(|&i| app.schemas[i].document.name.as_str())
            .collect();
        CompileError::new(
            ErrorKind::InheritanceCycle,
            format!("Inheritance cycle for document types: {}", names.join(" -> ")),
        )
    })?;

    for child in order {
        if parents[child].is_empty() {
            continue;
        }
        let mut structs = Vec::new();
        let mut fields = Vec::new();
        for &parent in &parents[child] {
            let document = &app.schemas[parent].document;
            structs.extend(document.structs.iter().map(|(k, v)| (k.clone(), v.clone())));
            fields.extend(document.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        let document = &mut app.schemas[child].document;
        merge_inherited(&mut document.structs, structs);
        merge_inherited(&mut document.fields, fields);
    }
    Ok(())
}

// =============================================================================
// Summaries and rank profiles
// =============================================================================

fn flatten_summaries(schema: &mut Schema) -> CompileResult<()> {
    let parents = parent_indices(&schema.summaries, |s| &s.inherits, |child, parent| {
        CompileError::schema(
            ErrorKind::UnknownParent,
            &schema.name,
            format!(
                "document-summary '{}' inherits unknown document-summary '{}'",
                child, parent
            ),
        )
    })?;
    let order = linearize(&parents).map_err(|cycle| {
        inheritance_cycle(schema, &schema.summaries, &cycle, "document-summary")
    })?;

    for child in order {
        let mut inherited = Vec::new();
        for &parent in &parents[child] {
            let summary = &schema.summaries[parent];
            inherited.extend(summary.fields.iter().map(|(k, v)| (k.clone(), v.clone())));
        }
        merge_inherited(&mut schema.summaries[child].fields, inherited);
    }
    Ok(())
}

fn flatten_rank_profiles(schema: &mut Schema) -> CompileResult<()> {
    schema.ensure_default_rank_profile();
    let parents = parent_indices(&schema.rank_profiles, |p| &p.inherits, |child, parent| {
        CompileError::schema(
            ErrorKind::UnknownParent,
            &schema.name,
            format!(
                "rank-profile '{}' inherits unknown rank-profile '{}'",
                child, parent
            ),
        )
    })?;
    let order = linearize(&parents).map_err(|cycle| {
        inheritance_cycle(schema, &schema.rank_profiles, &cycle, "rank-profile")
    })?;

    for child in order {
        let mut functions = Vec::new();
        let mut settings = Vec::new();
        for &parent in &parents[child] {
            let profile = &schema.rank_profiles[parent];
            functions.extend(profile.functions.iter().map(|(k, v)| (k.clone(), v.clone())));
            settings.extend(
                profile
                    .field_settings
                    .iter()
                    .map(|(k, v)| (k.clone(), v.clone())),
            );
        }
        let profile = &mut schema.rank_profiles[child];
        merge_inherited(&mut profile.functions, functions);
        merge_inherited(&mut profile.field_settings, settings);
    }
    Ok(())
}

fn parent_indices<T>(
    members: &IndexMap<String, T>,
    inherits: impl Fn(&T) -> &Vec<String>,
    unknown: impl Fn(&str, &str) -> CompileError,
) -> CompileResult<Vec<Vec<usize>>> {
    members
        .iter()
        .map(|(name, member)| {
            inherits(member)
                .iter()
                .map(|parent| {
                    members
                        .get_index_of(parent.as_str())
                        .ok_or_else(|| unknown(name.as_str(), parent.as_str()))
                })
                .collect::<CompileResult<Vec<usize>>>()
        })
        .collect()
}

fn inheritance_cycle<T>(
    schema: &Schema,
    members: &IndexMap<String, T>,
    cycle: &[usize],
    what: &str,
) -> CompileError {
    let names: Vec<&str> = cycle
        .iter()
        .filter_map(|&i| members.get_index(i).map(|(name, _)| name.as_str()))
        .collect();
    CompileError::schema(
        ErrorKind::InheritanceCycle,
        &schema.name,
        format!("{} inheritance cycle: {}", what, names.join(" -> ")),
    )
}

// =============================================================================
// Helpers
// =============================================================================

/// Prepends inherited members the child does not declare itself.
fn merge_inherited<T>(own: &mut IndexMap<String, T>, inherited: Vec<(String, T)>) {
    if inherited.iter().all(|(name, _)| own.contains_key(name)) {
        return;
    }
    let mut merged = IndexMap::with_capacity(own.len() + inherited.len());
    for (name, member) in inherited {
        if !own.contains_key(&name) && !merged.contains_key(&name) {
            merged.insert(name, member);
        }
    }
    merged.extend(own.drain(..));
    *own = merged;
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Visit {
    New,
    Active,
    Done,
}

/// Orders nodes so that parents precede children.
///
/// Returns the cycle (child first, closed by repeating it) when there is one.
fn linearize(parents: &[Vec<usize>]) -> Result<Vec<usize>, Vec<usize>> {
    let mut state = vec![Visit::New; parents.len()];
    let mut stack = Vec::new();
    let mut order = Vec::with_capacity(parents.len());
    for node in 0..parents.len() {
        visit(node, parents, &mut state, &mut stack, &mut order)?;
    }
    Ok(order)
}

fn visit(
    node: usize,
    parents: &[Vec<usize>],
    state: &mut [Visit],
    stack: &mut Vec<usize>,
    order: &mut Vec<usize>,
) -> Result<(), Vec<usize>> {
    match state[node] {
        Visit::Done => return Ok(()),
        Visit::Active => {
            let start = stack.iter().position(|&n| n == node).unwrap_or(0);
            let mut cycle = stack[start..].to_vec();
            cycle.push(node);
            return Err(cycle);
        }
        Visit::New => {}
    }
    state[node] = Visit::Active;
    stack.push(node);
    for &parent in &parents[node] {
        visit(parent, parents, state, stack, order)?;
    }
    stack.pop();
    state[node] = Visit::Done;
    order.push(node);
    Ok(())
}
