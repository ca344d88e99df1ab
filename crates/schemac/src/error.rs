//! Errors of the schemac facade.

use std::path::PathBuf;

use schemac_resolve::BuildFailure;
use thiserror::Error;

/// Result type of the facade API.
pub type Result<T> = std::result::Result<T, Error>;

/// Loading or compiling an application failed.
#[derive(Debug, Error)]
pub enum Error {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to walk {}: {source}", path.display())]
    Walk {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[error("invalid schema in {}: {source}", path.display())]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error("no schema files found in {}", .0.display())]
    NoSchemas(PathBuf),

    #[error("schema '{name}' is defined in both {} and {}", first.display(), second.display())]
    DuplicateSchema {
        name: String,
        first: PathBuf,
        second: PathBuf,
    },

    /// The resolve passes reported a fatal diagnostic.
    #[error(transparent)]
    Build(#[from] BuildFailure),
}

impl Error {
    /// Diagnostics reported before the failure, if the build got that far.
    pub fn warnings(&self) -> &[schemac_resolve::CompileError] {
        match self {
            Error::Build(failure) => &failure.warnings,
            _ => &[],
        }
    }
}
