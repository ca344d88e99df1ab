// Allow unwrap in tests
#![cfg_attr(test, allow(clippy::unwrap_used))]

//! Resolution and validation for schemac
//!
//! This crate turns the unresolved schema graph produced by the parser into
//! the resolved graph consumed by config generators: it orders schemas by
//! document reference, resolves imported fields, rewrites indexing scripts,
//! infers summary transforms and validates the result.

pub mod error;
pub mod resolve;

pub use error::{CompileError, CompileResult, Diagnostics, ErrorCategory, ErrorKind, Severity};
pub use resolve::*;
