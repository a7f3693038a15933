//! Vocabulary IRIs read from mapping documents.
//!
//! R2RML (`rr:`) for term maps, RML (`rml:`) for logical sources, QL (`ql:`)
//! for reference formulations.
//!
//! ```
//! use rmlmap::mapping::vocab::RR;
//!
//! assert_eq!(RR::TRIPLES_MAP, "http://www.w3.org/ns/r2rml#TriplesMap");
//! ```

/// R2RML vocabulary
pub struct RR;

impl RR {
    pub const NS: &'static str = "http://www.w3.org/ns/r2rml#";

    // Classes
    pub const TRIPLES_MAP: &'static str = "http://www.w3.org/ns/r2rml#TriplesMap";

    // Triples-map properties
    pub const SUBJECT_MAP: &'static str = "http://www.w3.org/ns/r2rml#subjectMap";
    pub const PREDICATE_OBJECT_MAP: &'static str = "http://www.w3.org/ns/r2rml#predicateObjectMap";

    // Predicate-object map properties
    pub const PREDICATE_MAP: &'static str = "http://www.w3.org/ns/r2rml#predicateMap";
    /// Shortcut for a constant predicate map
    pub const PREDICATE: &'static str = "http://www.w3.org/ns/r2rml#predicate";
    pub const OBJECT_MAP: &'static str = "http://www.w3.org/ns/r2rml#objectMap";
    /// Shortcut for a constant object map
    pub const OBJECT: &'static str = "http://www.w3.org/ns/r2rml#object";

    // Term map properties
    pub const TEMPLATE: &'static str = "http://www.w3.org/ns/r2rml#template";
    pub const CONSTANT: &'static str = "http://www.w3.org/ns/r2rml#constant";
    pub const TERM_TYPE: &'static str = "http://www.w3.org/ns/r2rml#termType";

    // Term types
    pub const IRI: &'static str = "http://www.w3.org/ns/r2rml#IRI";
    pub const LITERAL: &'static str = "http://www.w3.org/ns/r2rml#Literal";
    pub const BLANK_NODE: &'static str = "http://www.w3.org/ns/r2rml#BlankNode";
}

/// RML vocabulary
pub struct RML;

impl RML {
    pub const NS: &'static str = "http://semweb.mmlab.be/ns/rml#";

    pub const LOGICAL_SOURCE: &'static str = "http://semweb.mmlab.be/ns/rml#logicalSource";
    pub const SOURCE: &'static str = "http://semweb.mmlab.be/ns/rml#source";
    pub const REFERENCE: &'static str = "http://semweb.mmlab.be/ns/rml#reference";
    pub const REFERENCE_FORMULATION: &'static str =
        "http://semweb.mmlab.be/ns/rml#referenceFormulation";
}

/// Query language vocabulary for reference formulations
pub struct QL;

impl QL {
    pub const NS: &'static str = "http://semweb.mmlab.be/ns/ql#";

    pub const CSV: &'static str = "http://semweb.mmlab.be/ns/ql#CSV";
}

/// RDF vocabulary
pub struct RDF;

impl RDF {
    pub const TYPE: &'static str = "http://www.w3.org/1999/02/22-rdf-syntax-ns#type";
}
