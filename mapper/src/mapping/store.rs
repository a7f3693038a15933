//! In-memory mapping store.
//!
//! Holds the descriptive triples of a mapping document with two indexes,
//! built once on load:
//!
//! - subject -> predicate -> objects
//! - predicate -> object -> subjects
//!
//! Object and subject lists keep document order, so "first object" is
//! deterministic for a given document. Which duplicate comes first is not
//! part of the contract.

use oxttl::{TurtleParseError, TurtleParser};
use std::collections::HashMap;

use crate::error::{MappingError, MappingResult};
use crate::mapping::vocab::RDF;
use crate::models::{Term, Triple};

/// Indexed mapping document.
#[derive(Debug, Clone, Default)]
pub struct MappingStore {
    by_subject: HashMap<Term, HashMap<String, Vec<Term>>>,
    by_predicate: HashMap<String, HashMap<Term, Vec<Term>>>,
    /// Position at which each subject was first seen
    rank: HashMap<Term, usize>,
    len: usize,
}

impl MappingStore {
    /// Index a set of descriptive triples. Triples whose predicate is not an
    /// IRI are ignored.
    pub fn load<I: IntoIterator<Item = Triple>>(triples: I) -> Self {
        let mut store = Self::default();
        for triple in triples {
            store.insert(triple);
        }
        store
    }

    /// Parse a Turtle mapping document.
    ///
    /// `base_iri` resolves relative IRIs such as `<#MedicationMap>`.
    pub fn from_turtle(content: &str, base_iri: Option<&str>) -> MappingResult<Self> {
        let mut parser = TurtleParser::new();
        if let Some(base) = base_iri {
            parser = parser
                .with_base_iri(base)
                .map_err(|_| MappingError::InvalidBaseIri(base.to_string()))?;
        }

        let mut store = Self::default();
        for result in parser.for_reader(content.as_bytes()) {
            let triple = result.map_err(parse_error)?;
            store.insert(Triple::new(
                Term::from(oxrdf::Term::from(triple.subject)),
                Term::iri(triple.predicate.into_string()),
                Term::from(triple.object),
            ));
        }

        Ok(store)
    }

    fn insert(&mut self, triple: Triple) {
        let Term::Iri { value: predicate } = triple.predicate else {
            return;
        };

        self.by_predicate
            .entry(predicate.clone())
            .or_default()
            .entry(triple.object.clone())
            .or_default()
            .push(triple.subject.clone());

        let next = self.rank.len();
        self.rank.entry(triple.subject.clone()).or_insert(next);

        self.by_subject
            .entry(triple.subject)
            .or_default()
            .entry(predicate)
            .or_default()
            .push(triple.object);

        self.len += 1;
    }

    /// Subjects declared `rdf:type <type_iri>`, in document order.
    pub fn triples_maps_of_type(&self, type_iri: &str) -> Vec<&Term> {
        self.subjects_with(RDF::TYPE, &Term::iri(type_iri))
    }

    /// Subjects having `predicate` with exactly `object`, in document order.
    pub fn subjects_with(&self, predicate: &str, object: &Term) -> Vec<&Term> {
        self.by_predicate
            .get(predicate)
            .and_then(|objects| objects.get(object))
            .map(|subjects| dedup_in_order(subjects))
            .unwrap_or_default()
    }

    /// Subjects having `predicate` with any object, in document order.
    pub fn subjects_with_predicate(&self, predicate: &str) -> Vec<&Term> {
        let Some(objects) = self.by_predicate.get(predicate) else {
            return Vec::new();
        };
        let mut subjects = dedup_in_order(objects.values().flatten());
        subjects.sort_by_key(|s| self.position(s).unwrap_or(usize::MAX));
        subjects
    }

    /// Document position at which `subject` first appeared as a subject.
    pub fn position(&self, subject: &Term) -> Option<usize> {
        self.rank.get(subject).copied()
    }

    /// First object of `(subject, predicate)`, if any.
    pub fn first_object(&self, subject: &Term, predicate: &str) -> Option<&Term> {
        self.objects(subject, predicate).first()
    }

    /// All objects of `(subject, predicate)`, in document order.
    pub fn objects(&self, subject: &Term, predicate: &str) -> &[Term] {
        self.by_subject
            .get(subject)
            .and_then(|predicates| predicates.get(predicate))
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of indexed triples.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

fn dedup_in_order<'a>(terms: impl IntoIterator<Item = &'a Term>) -> Vec<&'a Term> {
    let mut seen = std::collections::HashSet::new();
    terms.into_iter().filter(|t| seen.insert(*t)).collect()
}

fn parse_error(err: TurtleParseError) -> MappingError {
    match err {
        TurtleParseError::Io(e) => MappingError::Io(e),
        TurtleParseError::Syntax(e) => MappingError::Parse {
            line: e.location().start.line + 1,
            message: e.message().to_string(),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mapping::vocab::{RML, RR};

    const MAPPING: &str = r#"
        @prefix rr: <http://www.w3.org/ns/r2rml#> .
        @prefix rml: <http://semweb.mmlab.be/ns/rml#> .
        @prefix ex: <http://example.com/> .

        ex:MedicationMap a rr:TriplesMap ;
            rml:logicalSource [ rml:source "medications.csv" ] ;
            rr:subjectMap [ rr:template "http://example.com/medication/{id}" ] .

        ex:PatientMap a rr:TriplesMap ;
            rml:logicalSource [ rml:source "patients.csv" ] .
    "#;

    #[test]
    fn test_from_turtle_indexes_triples() {
        let store = MappingStore::from_turtle(MAPPING, None).unwrap();
        assert_eq!(store.len(), 8);
    }

    #[test]
    fn test_triples_maps_in_document_order() {
        let store = MappingStore::from_turtle(MAPPING, None).unwrap();
        let maps = store.triples_maps_of_type(RR::TRIPLES_MAP);

        assert_eq!(
            maps,
            vec![
                &Term::iri("http://example.com/MedicationMap"),
                &Term::iri("http://example.com/PatientMap"),
            ]
        );
    }

    #[test]
    fn test_first_object_follows_blank_nodes() {
        let store = MappingStore::from_turtle(MAPPING, None).unwrap();
        let map = Term::iri("http://example.com/MedicationMap");

        let source = store.first_object(&map, RML::LOGICAL_SOURCE).unwrap();
        assert!(source.is_blank_node());
        assert_eq!(
            store.first_object(source, RML::SOURCE),
            Some(&Term::plain("medications.csv"))
        );
        assert_eq!(store.first_object(&map, RR::PREDICATE_OBJECT_MAP), None);
    }

    #[test]
    fn test_first_object_is_first_in_document() {
        let s = Term::iri("http://example.com/s");
        let store = MappingStore::load(vec![
            Triple::new(s.clone(), Term::iri("http://example.com/p"), Term::plain("one")),
            Triple::new(s.clone(), Term::iri("http://example.com/p"), Term::plain("two")),
        ]);

        assert_eq!(store.first_object(&s, "http://example.com/p"), Some(&Term::plain("one")));
        assert_eq!(store.objects(&s, "http://example.com/p").len(), 2);
    }

    #[test]
    fn test_subjects_with_predicate() {
        let store = MappingStore::from_turtle(MAPPING, None).unwrap();
        let subjects = store.subjects_with_predicate(RML::LOGICAL_SOURCE);
        assert_eq!(subjects.len(), 2);
        assert_eq!(subjects[0], &Term::iri("http://example.com/MedicationMap"));
    }

    #[test]
    fn test_relative_iris_with_base() {
        let doc = r#"
            @prefix rr: <http://www.w3.org/ns/r2rml#> .
            <#Map> a rr:TriplesMap .
        "#;
        let store = MappingStore::from_turtle(doc, Some("http://example.com/mapping.ttl")).unwrap();
        assert_eq!(
            store.triples_maps_of_type(RR::TRIPLES_MAP),
            vec![&Term::iri("http://example.com/mapping.ttl#Map")]
        );
    }

    #[test]
    fn test_invalid_turtle_is_parse_error() {
        let result = MappingStore::from_turtle("ex:a ex:b", None);
        assert!(matches!(result, Err(MappingError::Parse { .. })));
    }

    #[test]
    fn test_invalid_base_iri() {
        let result = MappingStore::from_turtle("", Some("not an iri"));
        assert!(matches!(result, Err(MappingError::InvalidBaseIri(_))));
    }
}
