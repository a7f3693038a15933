//! Triple generation.
//!
//! - Term: resolve term maps against a row
//! - Generator: rows x predicate-object maps for every triples-map
//! - Pipeline: run entry points and options

pub mod generator;
pub mod pipeline;
pub mod term;

pub use generator::{generate, Generation, MappingStats};
pub use pipeline::*;
