//! Semantic passes over the schema graph.

pub mod attributes;
pub mod imports;
pub mod indexing;
pub mod inheritance;
pub mod ordering;
pub mod pipeline;
pub mod positions;
pub mod structs;
pub mod summaries;
pub mod transforms;
pub mod utils;
pub mod validation;

pub use pipeline::{
    compile, compile_with, default_passes, BuildFailure, BuildOptions, CompiledApplication, Pass,
    SchemaContext,
};
