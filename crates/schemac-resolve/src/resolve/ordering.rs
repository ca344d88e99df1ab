//! Document references and schema processing order.
//!
//! Every reference-typed document field links its schema to the schema of
//! the referenced document type. The links form the application's reference
//! graph, which must be acyclic:
//!
//! 1. **Linking** - derive one [`DocumentReference`] per reference field
//! 2. **Cycle detection** - depth-first search over the reference graph
//! 3. **Ordering** - post-order walk so referenced schemas come first
//!
//! # Pipeline Position
//!
//! ```text
//! Inheritance → References → Ordering → per-schema passes
//!                  ^^^^^^^^^^^^^^^^^^^^
//! ```

use std::collections::HashSet;

use schemac_model::{Application, DataType, DocumentReference, SchemaId};

use crate::error::{CompileError, CompileResult, ErrorKind};

/// Derives the document references of every schema.
///
/// # Errors
///
/// Returns [`ErrorKind::UnknownDocumentType`] when a reference field names a
/// document type no schema declares.
pub fn link_references(app: &mut Application) -> CompileResult<()> {
    let mut linked = Vec::with_capacity(app.len());
    for schema in &app.schemas {
        let mut references = Vec::new();
        for field in schema.document.fields.values() {
            let DataType::Reference(document) = &field.data_type else {
                continue;
            };
            let target = app.by_document(document).ok_or_else(|| {
                CompileError::new(
                    ErrorKind::UnknownDocumentType,
                    format!(
                        "Invalid document reference '{}': Could not find document type '{}'",
                        field.name, document
                    ),
                )
            })?;
            references.push(DocumentReference {
                field: field.name.clone(),
                target,
            });
        }
        linked.push(references);
    }
    for (schema, references) in app.schemas.iter_mut().zip(linked) {
        schema.document_references = references;
    }
    Ok(())
}

/// Orders schemas so that each comes after every schema it references.
///
/// Ties keep declaration order.
///
/// # Errors
///
/// Returns [`ErrorKind::ReferenceCycle`] naming the documents on the first
/// cycle found.
pub fn processing_order(app: &Application) -> CompileResult<Vec<SchemaId>> {
    let graph = reference_graph(app);

    let mut visited = HashSet::new();
    let mut rec_stack = HashSet::new();
    for id in app.ids() {
        if visited.contains(&id) {
            continue;
        }
        if let Some(cycle) = detect_cycle_dfs(id, &graph, &mut visited, &mut rec_stack, Vec::new())
        {
            return Err(CompileError::new(
                ErrorKind::ReferenceCycle,
                format_cycle_error(app, &cycle),
            ));
        }
    }

    let mut done = vec![false; app.len()];
    let mut order = Vec::with_capacity(app.len());
    for id in app.ids() {
        post_order(id, &graph, &mut done, &mut order);
    }
    Ok(order)
}

/// Reference targets per schema, deduplicated, in field order.
fn reference_graph(app: &Application) -> Vec<Vec<SchemaId>> {
    app.schemas
        .iter()
        .map(|schema| {
            let mut targets = Vec::new();
            for reference in &schema.document_references {
                if !targets.contains(&reference.target) {
                    targets.push(reference.target);
                }
            }
            targets
        })
        .collect()
}

/// Depth-first search to detect cycles in the reference graph.
///
/// Returns Some(cycle_path) if a cycle is detected, None otherwise.
fn detect_cycle_dfs(
    current: SchemaId,
    graph: &[Vec<SchemaId>],
    visited: &mut HashSet<SchemaId>,
    rec_stack: &mut HashSet<SchemaId>,
    mut path: Vec<SchemaId>,
) -> Option<Vec<SchemaId>> {
    visited.insert(current);
    rec_stack.insert(current);
    path.push(current);

    let mut found_cycle = None;
    for &dep in graph.get(current.index()).into_iter().flatten() {
        if !visited.contains(&dep) {
            if let Some(cycle) = detect_cycle_dfs(dep, graph, visited, rec_stack, path.clone()) {
                found_cycle = Some(cycle);
                break;
            }
        } else if rec_stack.contains(&dep) {
            let start = path.iter().position(|p| *p == dep).unwrap_or(0);
            let mut cycle = path[start..].to_vec();
            cycle.push(dep);
            found_cycle = Some(cycle);
            break;
        }
    }

    rec_stack.remove(&current);
    found_cycle
}

fn post_order(id: SchemaId, graph: &[Vec<SchemaId>], done: &mut [bool], order: &mut Vec<SchemaId>) {
    if done[id.index()] {
        return;
    }
    done[id.index()] = true;
    for &dep in &graph[id.index()] {
        post_order(dep, graph, done, order);
    }
    order.push(id);
}

fn format_cycle_error(app: &Application, cycle: &[SchemaId]) -> String {
    let names = cycle
        .iter()
        .map(|id| {
            app.get(*id)
                .map(|s| s.document.name.clone())
                .unwrap_or_else(|| id.index().to_string())
        })
        .collect::<Vec<_>>()
        .join(" -> ");
    format!("Detected reference cycle for documents: {}", names)
}
