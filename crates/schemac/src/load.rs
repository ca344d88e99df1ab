//! Loading schema files and compiling them.
//!
//! Schemas are read from JSON files holding one [`Schema`] each, in the
//! unresolved form the parser emits. Directories are searched recursively
//! for `*.json` files, which are loaded in path order so that schema ids
//! are deterministic.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use schemac_model::{Application, Schema};
use schemac_resolve::{BuildOptions, CompileError, CompiledApplication};
use tracing::{debug, info};
use walkdir::WalkDir;

use crate::error::{Error, Result};

/// Extension of schema files.
pub const SCHEMA_EXTENSION: &str = "json";

/// Lists the schema files under `root`, sorted by path.
///
/// A file is returned as is, whatever its extension.
pub fn discover(root: &Path) -> Result<Vec<PathBuf>> {
    if root.is_file() {
        return Ok(vec![root.to_path_buf()]);
    }
    let mut files = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry.map_err(|source| Error::Walk {
            path: root.to_path_buf(),
            source,
        })?;
        if entry.file_type().is_file()
            && entry.path().extension().is_some_and(|ext| ext == SCHEMA_EXTENSION)
        {
            files.push(entry.into_path());
        }
    }
    files.sort();
    if files.is_empty() {
        return Err(Error::NoSchemas(root.to_path_buf()));
    }
    Ok(files)
}

/// Reads one schema file.
pub fn load_schema(path: &Path) -> Result<Schema> {
    let text = fs::read_to_string(path).map_err(|source| Error::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| Error::Json {
        path: path.to_path_buf(),
        source,
    })
}

/// Loads every schema file under `inputs` into one application.
///
/// # Errors
///
/// Fails on unreadable or malformed files, and when two files define a
/// schema with the same name.
pub fn load_application(inputs: &[PathBuf]) -> Result<Application> {
    let mut app = Application::new();
    let mut seen: HashMap<String, PathBuf> = HashMap::new();
    for input in inputs {
        for path in discover(input)? {
            let schema = load_schema(&path)?;
            if let Some(first) = seen.get(&schema.name) {
                return Err(Error::DuplicateSchema {
                    name: schema.name,
                    first: first.clone(),
                    second: path,
                });
            }
            debug!(schema = %schema.name, path = %path.display(), "loaded schema");
            seen.insert(schema.name.clone(), path);
            app.add(schema);
        }
    }
    Ok(app)
}

/// Loads and compiles the schemas under `inputs`.
pub fn compile(inputs: &[PathBuf], options: &BuildOptions) -> Result<CompiledApplication> {
    let app = load_application(inputs)?;
    info!(schemas = app.len(), "compiling application");
    let compiled = schemac_resolve::compile(app, options)?;
    info!(
        schemas = compiled.application.len(),
        warnings = compiled.warnings.len(),
        "compilation finished"
    );
    Ok(compiled)
}

/// Serializes a compiled application to JSON.
pub fn serialize_application(app: &Application, pretty: bool) -> serde_json::Result<String> {
    if pretty {
        serde_json::to_string_pretty(app)
    } else {
        serde_json::to_string(app)
    }
}

/// Deserializes an application written by [`serialize_application`].
pub fn deserialize_application(data: &str) -> serde_json::Result<Application> {
    serde_json::from_str(data)
}

/// Formats diagnostics one per line, each note indented below its diagnostic.
pub fn format_diagnostics(diagnostics: &[CompileError]) -> String {
    let mut out = String::new();
    for diagnostic in diagnostics {
        out.push_str(&diagnostic.to_string());
        out.push('\n');
        for note in &diagnostic.notes {
            out.push_str("  note: ");
            out.push_str(note);
            out.push('\n');
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use schemac_resolve::{ErrorKind, Severity};

    #[test]
    fn test_format_diagnostics() {
        let warning = CompileError::warning(ErrorKind::DiskAccess, "slow")
            .with_note("declare the field as an attribute");
        let error = CompileError::new(ErrorKind::ReferenceCycle, "cycle");
        assert_eq!(warning.severity, Severity::Warning);
        assert_eq!(
            format_diagnostics(&[warning, error]),
            "warning: disk access: slow\n  note: declare the field as an attribute\nerror: reference cycle: cycle\n"
        );
    }

    #[test]
    fn test_deserialize_rejects_garbage() {
        assert!(deserialize_application("{\"schemas\": 3}").is_err());
    }
}
