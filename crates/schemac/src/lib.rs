// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! # schemac
//!
//! Semantic analysis core of a document search schema compiler.
//!
//! This crate is a facade that re-exports functionality from:
//! - `schemac-model` - the schema graph: documents, fields, attributes,
//!   summaries, references and imported fields
//! - `schemac-resolve` - the resolution and validation passes
//!
//! and adds loading of schema files and serialization of the compiled
//! application.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use schemac::{compile, BuildOptions};
//! use std::path::PathBuf;
//!
//! let compiled = compile(&[PathBuf::from("schemas")], &BuildOptions::default())?;
//! for warning in &compiled.warnings {
//!     println!("{}", warning);
//! }
//! ```

pub mod error;
pub mod load;

// Re-export the model
pub use schemac_model::{self as model, *};

// Re-export resolve
pub use schemac_resolve as resolve;
pub use schemac_resolve::{
    BuildFailure, BuildOptions, CompileError, CompileResult, CompiledApplication, Diagnostics,
    ErrorKind, Pass, Severity,
};

pub use error::{Error, Result};
pub use load::{
    compile, deserialize_application, discover, format_diagnostics, load_application,
    load_schema, serialize_application,
};

/// Compiler version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
