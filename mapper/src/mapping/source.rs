//! Logical source resolution.
//!
//! A triples-map names its data through `rml:logicalSource [ rml:source "…" ]`.
//! The resolver reads that key and looks it up in the caller's
//! [`SourceTable`]. Failures here are never fatal for the run: the generator
//! turns a [`SourceError`] into a diagnostic and skips the triples-map.

use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;

use crate::diagnostics::DiagnosticKind;
use crate::mapping::store::MappingStore;
use crate::mapping::vocab::{QL, RML};
use crate::models::Term;
use crate::parser::TabularSource;

/// Parsed sources keyed by source key.
#[derive(Debug, Clone, Default)]
pub struct SourceTable {
    sources: HashMap<String, TabularSource>,
}

impl SourceTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, source: TabularSource) {
        self.sources.insert(key.into(), source);
    }

    pub fn get(&self, key: &str) -> Option<&TabularSource> {
        self.sources.get(key)
    }

    /// Look up `key` as written, then by its file-name component.
    ///
    /// Returns the key that matched.
    pub fn lookup<'a>(&'a self, key: &'a str) -> Option<(&'a str, &'a TabularSource)> {
        if let Some(source) = self.sources.get(key) {
            return Some((key, source));
        }
        let name = file_name(key)?;
        self.sources.get(name).map(|source| (name, source))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.sources.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.sources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sources.is_empty()
    }
}

impl<K: Into<String>> FromIterator<(K, TabularSource)> for SourceTable {
    fn from_iter<I: IntoIterator<Item = (K, TabularSource)>>(iter: I) -> Self {
        let mut table = SourceTable::new();
        for (key, source) in iter {
            table.insert(key, source);
        }
        table
    }
}

/// Why a triples-map has no usable source.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SourceError {
    #[error("no rml:logicalSource")]
    NoLogicalSource,

    #[error("logical source has no rml:source")]
    NoSourceKey,

    #[error("source '{key}' not supplied")]
    NotBound { key: String },

    #[error("reference formulation <{formulation}> is not supported")]
    Unsupported { formulation: String },
}

impl SourceError {
    /// Diagnostic category for this failure.
    pub fn kind(&self) -> DiagnosticKind {
        match self {
            SourceError::NotBound { .. } => DiagnosticKind::MissingSource,
            SourceError::Unsupported { .. } => DiagnosticKind::UnsupportedSource,
            SourceError::NoLogicalSource | SourceError::NoSourceKey => {
                DiagnosticKind::IncompleteMapping
            }
        }
    }
}

/// A triples-map bound to its data.
#[derive(Debug, Clone, Copy)]
pub struct BoundSource<'a> {
    /// Key under which the source was found
    pub key: &'a str,
    pub source: &'a TabularSource,
}

/// Source key declared by a triples-map, if any.
pub fn source_key<'a>(store: &'a MappingStore, triples_map: &Term) -> Option<&'a str> {
    let logical_source = store.first_object(triples_map, RML::LOGICAL_SOURCE)?;
    store
        .first_object(logical_source, RML::SOURCE)
        .and_then(Term::as_str)
}

/// Bind a triples-map to one of the supplied sources.
pub fn resolve<'a>(
    triples_map: &Term,
    store: &'a MappingStore,
    sources: &'a SourceTable,
) -> Result<BoundSource<'a>, SourceError> {
    let logical_source = store
        .first_object(triples_map, RML::LOGICAL_SOURCE)
        .ok_or(SourceError::NoLogicalSource)?;

    if let Some(formulation) = store
        .first_object(logical_source, RML::REFERENCE_FORMULATION)
        .and_then(Term::as_iri)
    {
        if formulation != QL::CSV {
            return Err(SourceError::Unsupported {
                formulation: formulation.to_string(),
            });
        }
    }

    let key = store
        .first_object(logical_source, RML::SOURCE)
        .and_then(Term::as_str)
        .ok_or(SourceError::NoSourceKey)?;

    sources
        .lookup(key)
        .map(|(key, source)| BoundSource { key, source })
        .ok_or_else(|| SourceError::NotBound {
            key: key.to_string(),
        })
}

fn file_name(key: &str) -> Option<&str> {
    let name = Path::new(key).file_name()?.to_str()?;
    (name != key).then_some(name)
}
