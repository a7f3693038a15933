//! Recoverable conditions found while interpreting a mapping.
//!
//! A [`Diagnostics`] collector travels with each run and is returned next to
//! the generated triples. Recording an entry also sends it to the log side
//! channel, but callers (and tests) only need the returned value.

use serde::{Deserialize, Serialize};

use crate::api::logs::log_warning;

/// What went wrong.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DiagnosticKind {
    /// The triples-map's source key is not in the source table; the whole
    /// triples-map is skipped.
    MissingSource,
    /// A subject template, predicate constant or object term map is missing;
    /// the affected predicate-object map (or triples-map) is skipped.
    IncompleteMapping,
    /// The logical source is not CSV; the triples-map is skipped.
    UnsupportedSource,
}

/// One recorded condition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    /// Triples-map the condition belongs to
    pub triples_map: String,
    pub message: String,
}

/// Ordered collection of diagnostics for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Diagnostics {
    entries: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a condition and log it as a warning.
    pub fn report(
        &mut self,
        kind: DiagnosticKind,
        triples_map: impl Into<String>,
        message: impl Into<String>,
    ) {
        let diagnostic = Diagnostic {
            kind,
            triples_map: triples_map.into(),
            message: message.into(),
        };
        log_warning(format!("{}: {}", diagnostic.triples_map, diagnostic.message));
        self.entries.push(diagnostic);
    }

    pub fn incomplete(&mut self, triples_map: impl Into<String>, message: impl Into<String>) {
        self.report(DiagnosticKind::IncompleteMapping, triples_map, message);
    }

    /// Append another collector, keeping order.
    pub fn extend(&mut self, other: Diagnostics) {
        self.entries.extend(other.entries);
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter()
    }

    /// Entries of one kind.
    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.entries.iter().filter(move |d| d.kind == kind)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}
