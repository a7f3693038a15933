//! RDF data model shared by the mapping store, the term resolver and the
//! output writers.
//!
//! - [`Term`] - IRI, literal or blank node
//! - [`Triple`] - one generated statement
//!
//! Terms are typed values rather than raw strings so an IRI can never be
//! compared equal to a literal with the same lexical form.

use serde::{Deserialize, Serialize};
use std::fmt;

// =============================================================================
// Terms
// =============================================================================

/// An RDF term.
///
/// A literal carries at most one of `datatype` and `language`; the
/// constructors below are the only way this crate builds literals.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Term {
    /// An IRI.
    Iri { value: String },
    /// A literal with optional datatype or language tag.
    Literal {
        value: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        datatype: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        language: Option<String>,
    },
    /// A blank node with its local identifier (without `_:`).
    BlankNode { id: String },
}

impl Term {
    pub fn iri(value: impl Into<String>) -> Self {
        Term::Iri {
            value: value.into(),
        }
    }

    /// Plain literal, no datatype and no language.
    pub fn plain(value: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: None,
            language: None,
        }
    }

    pub fn typed(value: impl Into<String>, datatype: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: Some(datatype.into()),
            language: None,
        }
    }

    pub fn lang(value: impl Into<String>, language: impl Into<String>) -> Self {
        Term::Literal {
            value: value.into(),
            datatype: None,
            language: Some(language.into()),
        }
    }

    pub fn blank(id: impl Into<String>) -> Self {
        Term::BlankNode { id: id.into() }
    }

    pub fn is_iri(&self) -> bool {
        matches!(self, Term::Iri { .. })
    }

    pub fn is_literal(&self) -> bool {
        matches!(self, Term::Literal { .. })
    }

    pub fn is_blank_node(&self) -> bool {
        matches!(self, Term::BlankNode { .. })
    }

    /// IRI string if this is an IRI.
    pub fn as_iri(&self) -> Option<&str> {
        match self {
            Term::Iri { value } => Some(value),
            _ => None,
        }
    }

    /// Lexical form if this is a literal.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            Term::Literal { value, .. } => Some(value),
            _ => None,
        }
    }

    /// IRI or lexical form; blank nodes have no string value.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Term::Iri { value } | Term::Literal { value, .. } => Some(value),
            Term::BlankNode { .. } => None,
        }
    }
}

impl From<oxrdf::Term> for Term {
    fn from(term: oxrdf::Term) -> Self {
        match term {
            oxrdf::Term::NamedNode(node) => Term::iri(node.into_string()),
            oxrdf::Term::BlankNode(node) => Term::blank(node.into_string()),
            oxrdf::Term::Literal(literal) => {
                let (value, datatype, language) = literal.destruct();
                match (language, datatype) {
                    (Some(language), _) => Term::lang(value, language),
                    // xsd:string is the implicit datatype of a plain literal
                    (None, Some(dt)) if dt.as_str() != XSD_STRING => {
                        Term::typed(value, dt.into_string())
                    }
                    _ => Term::plain(value),
                }
            }
            #[allow(unreachable_patterns)]
            other => Term::plain(other.to_string()),
        }
    }
}

const XSD_STRING: &str = "http://www.w3.org/2001/XMLSchema#string";

impl Term {
    /// Convert to an `oxrdf` term, or explain why this is not valid RDF.
    pub fn to_oxrdf(&self) -> Result<oxrdf::Term, String> {
        Ok(match self {
            Term::Iri { value } => named_node(value)?.into(),
            Term::BlankNode { id } => blank_node(id)?.into(),
            Term::Literal {
                value,
                datatype,
                language,
            } => match (language, datatype) {
                (Some(language), _) => {
                    oxrdf::Literal::new_language_tagged_literal(value.as_str(), language.as_str())
                        .map_err(|e| format!("invalid language tag '{}': {}", language, e))?
                        .into()
                }
                (None, Some(datatype)) => {
                    oxrdf::Literal::new_typed_literal(value.as_str(), named_node(datatype)?).into()
                }
                (None, None) => oxrdf::Literal::new_simple_literal(value.as_str()).into(),
            },
        })
    }
}

fn named_node(iri: &str) -> Result<oxrdf::NamedNode, String> {
    oxrdf::NamedNode::new(iri).map_err(|e| format!("invalid IRI <{}>: {}", iri, e))
}

fn blank_node(id: &str) -> Result<oxrdf::BlankNode, String> {
    oxrdf::BlankNode::new(id).map_err(|e| format!("invalid blank node id '{}': {}", id, e))
}

/// N-Triples rendering, through `oxrdf` for valid terms.
impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Ok(term) = self.to_oxrdf() {
            return write!(f, "{}", term);
        }
        // not valid RDF; still printable for warnings
        match self {
            Term::Iri { value } => write!(f, "<{}>", value),
            Term::BlankNode { id } => write!(f, "_:{}", id),
            Term::Literal {
                value,
                datatype,
                language,
            } => {
                write!(f, "{}", oxrdf::Literal::new_simple_literal(value.as_str()))?;
                match (language, datatype) {
                    (Some(language), _) => write!(f, "@{}", language),
                    (None, Some(datatype)) => write!(f, "^^<{}>", datatype),
                    (None, None) => Ok(()),
                }
            }
        }
    }
}

// =============================================================================
// Triples
// =============================================================================

/// A generated statement. The subject is an IRI or blank node, the
/// predicate an IRI.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Triple {
    pub subject: Term,
    pub predicate: Term,
    pub object: Term,
}

impl Triple {
    pub fn new(subject: Term, predicate: Term, object: Term) -> Self {
        Self {
            subject,
            predicate,
            object,
        }
    }

    /// Convert to an `oxrdf` triple, or explain why this is not valid RDF.
    pub fn to_oxrdf(&self) -> Result<oxrdf::Triple, String> {
        let subject: oxrdf::Subject = match self.subject.to_oxrdf()? {
            oxrdf::Term::NamedNode(node) => node.into(),
            oxrdf::Term::BlankNode(node) => node.into(),
            _ => return Err("subject is not an IRI or blank node".to_string()),
        };
        let predicate = match self.predicate.to_oxrdf()? {
            oxrdf::Term::NamedNode(node) => node,
            _ => return Err("predicate is not an IRI".to_string()),
        };
        Ok(oxrdf::Triple::new(subject, predicate, self.object.to_oxrdf()?))
    }
}

impl fmt::Display for Triple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {} .", self.subject, self.predicate, self.object)
    }
}
