//! # rmlmap - RML mapping interpreter
//!
//! Turns CSV sources into RDF triples according to a mapping document written
//! in the R2RML/RML triples-map vocabulary.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐
//! │ mapping.ttl │────▶│ MappingStore│──┐
//! └─────────────┘     └─────────────┘  │   ┌───────────┐     ┌─────────────┐
//!                                      ├──▶│ Generator │────▶│ N-Triples / │
//! ┌─────────────┐     ┌─────────────┐  │   │ (rows×POM)│     │   Turtle    │
//! │  CSV files  │────▶│   Parser    │──┘   └───────────┘     └─────────────┘
//! └─────────────┘     └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```
//! use std::collections::HashMap;
//! use rmlmap::{run, MappingOptions, OutputFormat};
//!
//! let mapping = r#"
//!     @prefix rr: <http://www.w3.org/ns/r2rml#> .
//!     @prefix rml: <http://semweb.mmlab.be/ns/rml#> .
//!     @prefix schema: <http://schema.org/> .
//!
//!     <http://example.com/MedicationMap> a rr:TriplesMap ;
//!         rml:logicalSource [ rml:source "medications.csv" ] ;
//!         rr:subjectMap [ rr:template "http://example.com/medication/{id}" ] ;
//!         rr:predicateObjectMap [ rr:predicate schema:identifier ; rr:objectMap [ rml:reference "id" ] ] .
//! "#;
//! let sources = HashMap::from([("medications.csv".to_string(), "id\nATC001".to_string())]);
//!
//! let output = run(mapping, &sources, &MappingOptions::default()).unwrap();
//! let nt = output.serialize(OutputFormat::NTriples).unwrap();
//! assert!(nt.contains(r#"<http://schema.org/identifier> "ATC001""#));
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Hierarchical error types
//! - [`models`] - RDF terms and triples
//! - [`parser`] - CSV parsing with auto-detection
//! - [`mapping`] - Mapping store, triples-map descriptors, source binding
//! - [`transform`] - Term resolution, triple generation, pipeline
//! - [`diagnostics`] - Recoverable conditions reported during a run
//! - [`serialize`] - N-Triples and Turtle output
//! - [`api`] - HTTP API server

// Core modules
pub mod error;
pub mod models;

// Parsing
pub mod parser;

// Mapping documents
pub mod mapping;

// Generation
pub mod diagnostics;
pub mod transform;

// Output
pub mod serialize;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Error types
// =============================================================================

pub use error::{
    CsvError, MappingError, PipelineError, PipelineResult, SerializeError, ServerError,
};

// =============================================================================
// Re-exports - Models
// =============================================================================

pub use models::{Term, Triple};

// =============================================================================
// Re-exports - Parsing
// =============================================================================

pub use parser::{
    decode_content, detect_delimiter, detect_encoding, parse, parse_bytes, parse_file,
    ReadOptions, Row, TabularSource,
};

// =============================================================================
// Re-exports - Mapping
// =============================================================================

pub use mapping::{MappingStore, SourceTable, TriplesMap};

// =============================================================================
// Re-exports - Pipeline
// =============================================================================

pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use serialize::{serialize, OutputFormat};
pub use transform::pipeline::{
    declared_sources, parse_sources, run, run_files, run_parsed, MappingOptions, MappingOutput,
    SourceInfo,
};
pub use transform::{generate, Generation, MappingStats};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, MapResponse, SourceMetadata};

// Server
pub mod server {
    pub use crate::api::server::start_server;
}
