//! Typed view of the triples-maps in a [`MappingStore`].
//!
//! Descriptors are read as-is: a missing template, predicate constant or
//! object term map is kept as `None` so the generator can report it and skip
//! only the affected part.

use serde::{Deserialize, Serialize};

use crate::mapping::store::MappingStore;
use crate::mapping::vocab::{RML, RR};
use crate::models::Term;

/// Kind of term a term map produces.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TermType {
    Iri,
    Literal,
    BlankNode,
}

impl TermType {
    /// Parse from an `rr:termType` value.
    pub fn from_iri(iri: &str) -> Option<Self> {
        match iri {
            RR::IRI => Some(TermType::Iri),
            RR::LITERAL => Some(TermType::Literal),
            RR::BLANK_NODE => Some(TermType::BlankNode),
            _ => None,
        }
    }
}

/// A triples-map descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriplesMap {
    pub id: Term,
    pub subject_map: Option<SubjectMap>,
    pub predicate_object_maps: Vec<PredicateObjectMap>,
}

/// Subject map; only templates are supported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SubjectMap {
    pub template: Option<String>,
}

/// Pairs predicate maps with object maps.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredicateObjectMap {
    pub predicate_maps: Vec<PredicateMap>,
    pub object_maps: Vec<ObjectMap>,
}

/// Predicate map; only constants are supported.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredicateMap {
    pub constant: Option<Term>,
}

impl PredicateMap {
    pub fn constant(iri: impl Into<String>) -> Self {
        Self {
            constant: Some(Term::iri(iri)),
        }
    }
}

/// Object map. At most one of `reference`, `template` and `constant` is
/// used, in that order of precedence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMap {
    /// `rml:reference`, possibly dotted
    pub reference: Option<String>,
    /// `rr:template`
    pub template: Option<String>,
    /// `rr:constant` or the `rr:object` shortcut
    pub constant: Option<Term>,
    /// `rr:termType`, if given
    pub term_type: Option<TermType>,
}

impl ObjectMap {
    pub fn reference(name: impl Into<String>) -> Self {
        Self {
            reference: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn template(template: impl Into<String>) -> Self {
        Self {
            template: Some(template.into()),
            ..Default::default()
        }
    }

    pub fn constant(term: Term) -> Self {
        Self {
            constant: Some(term),
            ..Default::default()
        }
    }

    pub fn with_term_type(mut self, term_type: TermType) -> Self {
        self.term_type = Some(term_type);
        self
    }

    /// True when none of reference, template or constant is set.
    pub fn is_empty(&self) -> bool {
        self.reference.is_none() && self.template.is_none() && self.constant.is_none()
    }
}

// =============================================================================
// Extraction
// =============================================================================

/// Triples-map ids in document order: subjects typed `rr:TriplesMap`, plus
/// untyped subjects that carry an `rml:logicalSource`.
pub fn triples_map_ids(store: &MappingStore) -> Vec<&Term> {
    let mut ids = store.triples_maps_of_type(RR::TRIPLES_MAP);
    for id in store.subjects_with_predicate(RML::LOGICAL_SOURCE) {
        if !ids.contains(&id) {
            ids.push(id);
        }
    }
    ids.sort_by_key(|id| store.position(id).unwrap_or(usize::MAX));
    ids
}

impl TriplesMap {
    /// Read the descriptor of `id` from the store.
    pub fn describe(store: &MappingStore, id: &Term) -> Self {
        let subject_map = store.first_object(id, RR::SUBJECT_MAP).map(|node| SubjectMap {
            template: string_value(store.first_object(node, RR::TEMPLATE)),
        });

        let predicate_object_maps = store
            .objects(id, RR::PREDICATE_OBJECT_MAP)
            .iter()
            .map(|node| describe_predicate_object_map(store, node))
            .collect();

        Self {
            id: id.clone(),
            subject_map,
            predicate_object_maps,
        }
    }

    /// Subject template, if the descriptor has one.
    pub fn template(&self) -> Option<&str> {
        self.subject_map.as_ref()?.template.as_deref()
    }

    /// Readable id for diagnostics.
    pub fn label(&self) -> String {
        label(&self.id)
    }
}

fn describe_predicate_object_map(store: &MappingStore, node: &Term) -> PredicateObjectMap {
    let mut predicate_maps: Vec<PredicateMap> = store
        .objects(node, RR::PREDICATE)
        .iter()
        .map(|p| PredicateMap {
            constant: Some(p.clone()),
        })
        .collect();
    predicate_maps.extend(store.objects(node, RR::PREDICATE_MAP).iter().map(|pm| PredicateMap {
        constant: store.first_object(pm, RR::CONSTANT).cloned(),
    }));

    let mut object_maps: Vec<ObjectMap> = store
        .objects(node, RR::OBJECT)
        .iter()
        .map(|o| ObjectMap::constant(o.clone()))
        .collect();
    object_maps.extend(
        store
            .objects(node, RR::OBJECT_MAP)
            .iter()
            .map(|om| describe_object_map(store, om)),
    );

    PredicateObjectMap {
        predicate_maps,
        object_maps,
    }
}

fn describe_object_map(store: &MappingStore, node: &Term) -> ObjectMap {
    ObjectMap {
        reference: string_value(store.first_object(node, RML::REFERENCE)),
        template: string_value(store.first_object(node, RR::TEMPLATE)),
        constant: store.first_object(node, RR::CONSTANT).cloned(),
        term_type: store
            .first_object(node, RR::TERM_TYPE)
            .and_then(Term::as_iri)
            .and_then(TermType::from_iri),
    }
}

fn string_value(term: Option<&Term>) -> Option<String> {
    term.and_then(Term::as_str).map(str::to_string)
}

/// IRI string or `_:id` for a node.
pub fn label(term: &Term) -> String {
    match term {
        Term::Iri { value } => value.clone(),
        other => other.to_string(),
    }
}
