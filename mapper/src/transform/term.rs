//! Term resolution: turn a term map and a row into a concrete RDF term.
//!
//! Resolution never fails on data. An absent field reads as the empty string
//! and the term is still produced; only a term map with nothing to resolve
//! (no constant, reference or template) yields `None`.

use once_cell::sync::Lazy;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use regex::{Captures, Regex};

use crate::mapping::model::{ObjectMap, PredicateMap, TermType};
use crate::models::Term;
use crate::parser::Row;

/// `{field}` placeholders
static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{([^}]+)\}").unwrap());

/// Everything but RFC 3986 unreserved characters is escaped.
const IRI_VALUE: &AsciiSet = &NON_ALPHANUMERIC.remove(b'-').remove(b'.').remove(b'_').remove(b'~');

/// Expand a subject template into an IRI.
///
/// ```
/// use rmlmap::parser::Row;
/// use rmlmap::transform::term::resolve_subject;
///
/// let row = Row::from_pairs([("id", "ATC 001")]);
/// let subject = resolve_subject("http://example.com/medication/{id}", &row);
/// assert_eq!(subject.as_iri(), Some("http://example.com/medication/ATC%20001"));
/// ```
pub fn resolve_subject(template: &str, row: &Row) -> Term {
    Term::iri(expand_template(template, row, true))
}

/// Predicate of a predicate map. Only IRI constants qualify.
pub fn resolve_predicate(predicate_map: &PredicateMap) -> Option<Term> {
    predicate_map.constant.as_ref().filter(|t| t.is_iri()).cloned()
}

/// Object of an object map for one row.
pub fn resolve_object(object_map: &ObjectMap, row: &Row) -> Option<Term> {
    if let Some(reference) = &object_map.reference {
        let value = resolve_reference(row, reference);
        return Some(match object_map.term_type {
            Some(TermType::Iri) => Term::iri(value),
            Some(TermType::BlankNode) => Term::blank(blank_id(value)),
            _ => Term::plain(value),
        });
    }

    if let Some(template) = &object_map.template {
        return Some(match object_map.term_type {
            Some(TermType::Literal) => Term::plain(expand_template(template, row, false)),
            Some(TermType::BlankNode) => Term::blank(blank_id(&expand_template(template, row, false))),
            _ => Term::iri(expand_template(template, row, true)),
        });
    }

    object_map.constant.clone()
}

/// Value of a reference in a row.
///
/// A dotted name is first walked through the nested view. If any segment is
/// missing, the full dotted name is looked up as a flat field. Absent fields
/// read as `""`.
pub fn resolve_reference<'a>(row: &'a Row, reference: &str) -> &'a str {
    if reference.contains('.') {
        let segments: Vec<&str> = reference.split('.').collect();
        if let Some(value) = row.get_path(&segments) {
            return value;
        }
    }
    row.get(reference).unwrap_or("")
}

/// Substitute every `{field}` in `template`.
pub fn expand_template(template: &str, row: &Row, percent_encode: bool) -> String {
    PLACEHOLDER
        .replace_all(template, |caps: &Captures| {
            let value = resolve_reference(row, caps[1].trim());
            if percent_encode {
                encode(value)
            } else {
                value.to_string()
            }
        })
        .into_owned()
}

/// Field names referenced by a template, in order.
pub fn template_fields(template: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| caps.get(1))
        .map(|m| m.as_str().trim())
        .collect()
}

fn encode(value: &str) -> String {
    utf8_percent_encode(value, IRI_VALUE).to_string()
}

/// Blank node label for a value. The `gen_` prefix keeps it valid when the
/// value is empty or starts with a digit.
fn blank_id(value: &str) -> String {
    let label: String = value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '_' })
        .collect();
    format!("gen_{}", label)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Triple;
    use crate::parser::{parse, ReadOptions};
    use crate::serialize::{serialize, OutputFormat};

    fn row(pairs: &[(&str, &str)]) -> Row {
        Row::from_pairs(pairs.iter().copied())
    }

    #[test]
    fn test_subject_template() {
        let r = row(&[("id", "ATC001")]);
        assert_eq!(
            resolve_subject("http://example.com/medication/{id}", &r),
            Term::iri("http://example.com/medication/ATC001")
        );
    }

    #[test]
    fn test_subject_values_are_percent_encoded() {
        let r = row(&[("name", "Café au lait/2")]);
        assert_eq!(
            resolve_subject("http://example.com/{name}", &r).as_iri(),
            Some("http://example.com/Caf%C3%A9%20au%20lait%2F2")
        );
    }

    #[test]
    fn test_unmatched_placeholder_is_empty() {
        let r = row(&[("id", "1")]);
        assert_eq!(
            resolve_subject("http://example.com/{missing}/{id}", &r),
            Term::iri("http://example.com//1")
        );
    }

    #[test]
    fn test_template_totality_on_empty_row() {
        let r = Row::default();
        let subject = resolve_subject("http://example.com/{a}{b}{c.d}", &r);
        assert_eq!(subject, Term::iri("http://example.com/"));
    }

    #[test]
    fn test_dotted_reference_flat_fallback() {
        // "room" is a plain column, so "room.name" cannot nest under it
        let r = row(&[("room", "A"), ("room.name", "101")]);
        assert_eq!(resolve_reference(&r, "room.name"), "101");
    }

    #[test]
    fn test_nested_reference_agrees_with_flat() {
        let source = parse("patient.id,patient.name\nP1,Alice", &ReadOptions::default()).unwrap();
        let r = &source.rows[0];

        assert_eq!(r.get_path(&["patient", "id"]), Some("P1"));
        assert_eq!(resolve_reference(r, "patient.id"), "P1");
        assert_eq!(r.get("patient.id"), Some("P1"));
    }

    #[test]
    fn test_partial_path_falls_back_to_full_name() {
        let r = row(&[("patient.id", "P1")]);
        // "patient" resolves to an object but "patient.age" has no leaf
        assert_eq!(resolve_reference(&r, "patient.age"), "");
        assert_eq!(resolve_reference(&r, "patient"), "");
    }

    #[test]
    fn test_partial_path_reads_full_dotted_field() {
        // "a.b" is a leaf, so "a.b.c" cannot nest under it
        let r = row(&[("a.b", "x"), ("a.b.c", "y")]);
        assert_eq!(resolve_reference(&r, "a.b.c"), "y");
        assert_eq!(resolve_reference(&r, "a.b"), "x");
    }

    #[test]
    fn test_absent_reference_is_empty_literal() {
        let r = row(&[("id", "1")]);
        let object = resolve_object(&ObjectMap::reference("missing"), &r);
        assert_eq!(object, Some(Term::plain("")));
    }

    #[test]
    fn test_reference_object_is_plain_literal() {
        let r = row(&[("id", "ATC001")]);
        let object = resolve_object(&ObjectMap::reference("id"), &r).unwrap();
        assert_eq!(object, Term::plain("ATC001"));
        assert!(object.as_literal().is_some());
    }

    #[test]
    fn test_reference_with_iri_term_type() {
        let r = row(&[("link", "http://example.com/x")]);
        let om = ObjectMap::reference("link").with_term_type(TermType::Iri);
        assert_eq!(resolve_object(&om, &r), Some(Term::iri("http://example.com/x")));
    }

    #[test]
    fn test_blank_node_ids_are_valid_labels() {
        let r = row(&[("ward", "North Wing"), ("bed", "")]);

        let om = ObjectMap::reference("ward").with_term_type(TermType::BlankNode);
        assert_eq!(resolve_object(&om, &r), Some(Term::blank("gen_North_Wing")));

        let om = ObjectMap::reference("bed").with_term_type(TermType::BlankNode);
        assert_eq!(resolve_object(&om, &r), Some(Term::blank("gen_")));

        let om = ObjectMap::template("{ward}/{bed}").with_term_type(TermType::BlankNode);
        assert_eq!(resolve_object(&om, &r), Some(Term::blank("gen_North_Wing_")));
    }

    #[test]
    fn test_blank_node_object_serializes() {
        let r = row(&[("ward", "North Wing"), ("bed", "")]);
        let triples: Vec<Triple> = ["ward", "bed"]
            .iter()
            .map(|field| {
                let om = ObjectMap::reference(*field).with_term_type(TermType::BlankNode);
                Triple::new(
                    Term::iri("http://example.com/patient/P1"),
                    Term::iri("http://example.com/location"),
                    resolve_object(&om, &r).unwrap(),
                )
            })
            .collect();

        let nt = serialize(&triples, OutputFormat::NTriples).unwrap();
        assert_eq!(nt.lines().count(), 2);
        assert!(nt.contains("<http://example.com/location> _:gen_North_Wing ."));
    }

    #[test]
    fn test_template_object() {
        let r = row(&[("code", "A B")]);
        assert_eq!(
            resolve_object(&ObjectMap::template("http://example.com/c/{code}"), &r),
            Some(Term::iri("http://example.com/c/A%20B"))
        );
        let literal = ObjectMap::template("code {code}").with_term_type(TermType::Literal);
        assert_eq!(resolve_object(&literal, &r), Some(Term::plain("code A B")));
    }

    #[test]
    fn test_constant_object_keeps_datatype() {
        let constant = Term::typed("5", "http://www.w3.org/2001/XMLSchema#integer");
        let r = Row::default();
        assert_eq!(resolve_object(&ObjectMap::constant(constant.clone()), &r), Some(constant));
    }

    #[test]
    fn test_empty_object_map_resolves_to_nothing() {
        assert_eq!(resolve_object(&ObjectMap::default(), &Row::default()), None);
    }

    #[test]
    fn test_predicate_must_be_iri() {
        assert_eq!(
            resolve_predicate(&PredicateMap::constant("http://schema.org/name")),
            Some(Term::iri("http://schema.org/name"))
        );
        assert_eq!(resolve_predicate(&PredicateMap { constant: Some(Term::plain("name")) }), None);
        assert_eq!(resolve_predicate(&PredicateMap { constant: None }), None);
    }

    #[test]
    fn test_template_fields() {
        assert_eq!(template_fields("http://x/{a}/{ b }/{c.d}"), vec!["a", "b", "c.d"]);
        assert!(template_fields("http://x/").is_empty());
    }
}
