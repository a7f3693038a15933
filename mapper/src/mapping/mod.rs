//! Mapping documents.
//!
//! - [`store`]: indexed descriptive triples
//! - [`model`]: typed triples-map descriptors read from the store
//! - [`source`]: binding triples-maps to tabular sources
//! - [`vocab`]: vocabulary IRIs

pub mod model;
pub mod source;
pub mod store;
pub mod vocab;

pub use model::{
    triples_map_ids, ObjectMap, PredicateMap, PredicateObjectMap, SubjectMap, TermType, TriplesMap,
};
pub use source::{resolve, source_key, BoundSource, SourceError, SourceTable};
pub use store::MappingStore;
