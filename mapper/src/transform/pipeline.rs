//! Mapping interpreter entry points.
//!
//! Combines every step of a run: parse the mapping document, parse the
//! sources, generate triples. Serialization is left to the caller through
//! [`MappingOutput::serialize`].
//!
//! # Example
//!
//! ```
//! use std::collections::HashMap;
//! use rmlmap::transform::pipeline::{run, MappingOptions};
//!
//! let mapping = r#"
//!     @prefix rr: <http://www.w3.org/ns/r2rml#> .
//!     @prefix rml: <http://semweb.mmlab.be/ns/rml#> .
//!     @prefix schema: <http://schema.org/> .
//!
//!     <http://example.com/MedicationMap> a rr:TriplesMap ;
//!         rml:logicalSource [ rml:source "medications.csv" ] ;
//!         rr:subjectMap [ rr:template "http://example.com/medication/{id}" ] ;
//!         rr:predicateObjectMap [
//!             rr:predicateMap [ rr:constant schema:identifier ] ;
//!             rr:objectMap [ rml:reference "id" ]
//!         ] .
//! "#;
//! let sources = HashMap::from([("medications.csv".to_string(), "id\nATC001".to_string())]);
//!
//! let output = run(mapping, &sources, &MappingOptions::default()).unwrap();
//! assert_eq!(output.triples.len(), 1);
//! ```

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::api::logs::{log_info, log_success, log_warning};
use crate::diagnostics::Diagnostics;
use crate::error::{PipelineError, PipelineResult, SerializeResult};
use crate::mapping::model::triples_map_ids;
use crate::mapping::source::{source_key, SourceTable};
use crate::mapping::store::MappingStore;
use crate::models::Triple;
use crate::parser::{self, ReadOptions, TabularSource};
use crate::serialize::{serialize, OutputFormat};
use crate::transform::generator::{generate, MappingStats};

/// Options for a mapping run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MappingOptions {
    /// Base IRI for relative IRIs in the mapping document
    pub base_iri: Option<String>,

    /// Source delimiter; `None` detects it per source
    pub delimiter: Option<char>,

    /// Output syntax used by callers that serialize
    pub format: OutputFormat,
}

impl MappingOptions {
    /// Read `RMLMAP_BASE_IRI`, `RMLMAP_DELIMITER` and `RMLMAP_FORMAT`.
    ///
    /// Unset or empty variables keep the default. An unknown format is
    /// reported and ignored.
    pub fn from_env() -> Self {
        let mut options = Self::default();

        if let Some(base) = env_var("RMLMAP_BASE_IRI") {
            options.base_iri = Some(base);
        }
        if let Some(delimiter) = env_var("RMLMAP_DELIMITER") {
            options.delimiter = parse_delimiter(&delimiter);
        }
        if let Some(format) = env_var("RMLMAP_FORMAT") {
            match format.parse() {
                Ok(format) => options.format = format,
                Err(e) => log_warning(format!("RMLMAP_FORMAT: {}", e)),
            }
        }

        options
    }

    fn read_options(&self) -> ReadOptions {
        ReadOptions {
            delimiter: self.delimiter,
        }
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

/// Parse a delimiter setting. `tab` and `\t` mean a tab character.
pub fn parse_delimiter(value: &str) -> Option<char> {
    match value {
        "tab" | "\\t" | "\t" => Some('\t'),
        other => other.chars().next(),
    }
}

/// Result of a run.
#[derive(Debug, Clone, Default)]
pub struct MappingOutput {
    /// Triples in generation order
    pub triples: Vec<Triple>,
    /// Recoverable conditions met along the way
    pub diagnostics: Diagnostics,
    pub stats: MappingStats,
}

impl MappingOutput {
    pub fn serialize(&self, format: OutputFormat) -> SerializeResult<String> {
        serialize(&self.triples, format)
    }
}

/// Source summary for display.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceInfo {
    pub key: String,
    pub encoding: String,
    pub delimiter: char,
    pub headers: Vec<String>,
    pub row_count: usize,
}

impl SourceInfo {
    pub fn new(key: impl Into<String>, source: &TabularSource) -> Self {
        Self {
            key: key.into(),
            encoding: source.encoding.clone(),
            delimiter: source.delimiter,
            headers: source.headers.clone(),
            row_count: source.rows.len(),
        }
    }
}

// =============================================================================
// Entry points
// =============================================================================

/// Run a mapping document against in-memory sources keyed by source key.
///
/// Fails only when the mapping or a source cannot be parsed at all; a
/// triples-map that cannot be used is reported in the output's diagnostics.
pub fn run(
    mapping: &str,
    sources: &HashMap<String, String>,
    options: &MappingOptions,
) -> PipelineResult<MappingOutput> {
    let store = MappingStore::from_turtle(mapping, options.base_iri.as_deref())?;

    let read_options = options.read_options();
    let mut table = SourceTable::new();
    // key order, so the reported failure does not depend on hashing
    let mut entries: Vec<_> = sources.iter().collect();
    entries.sort_by(|a, b| a.0.cmp(b.0));
    for (key, content) in entries {
        let source = parser::parse(content, &read_options)
            .map_err(|e| PipelineError::in_source(key.as_str(), e))?;
        table.insert(key.as_str(), source);
    }

    Ok(run_parsed(&store, &table))
}

/// Parse uploaded sources, detecting each one's encoding.
///
/// Returns the table with a summary per source, in upload order.
pub fn parse_sources(
    sources: Vec<(String, Vec<u8>)>,
    options: &MappingOptions,
) -> PipelineResult<(SourceTable, Vec<SourceInfo>)> {
    let read_options = options.read_options();
    let mut table = SourceTable::new();
    let mut infos = Vec::with_capacity(sources.len());
    for (key, bytes) in sources {
        let source = parser::parse_bytes(&bytes, &read_options)
            .map_err(|e| PipelineError::in_source(key.as_str(), e))?;
        infos.push(SourceInfo::new(key.as_str(), &source));
        table.insert(key, source);
    }
    Ok((table, infos))
}

/// Run a mapping file against source files.
///
/// Files are read fully before generation starts.
pub async fn run_files(
    mapping_path: &Path,
    sources: &[(String, PathBuf)],
    options: &MappingOptions,
) -> PipelineResult<MappingOutput> {
    log_info(format!("📖 Reading mapping {}", mapping_path.display()));
    let mapping = tokio::fs::read_to_string(mapping_path)
        .await
        .map_err(|source| PipelineError::Io {
            path: mapping_path.display().to_string(),
            source,
        })?;
    let store = MappingStore::from_turtle(&mapping, options.base_iri.as_deref())?;

    let read_options = options.read_options();
    let mut table = SourceTable::new();
    for (key, path) in sources {
        let source = parser::parse_file(path, &read_options)
            .await
            .map_err(|e| PipelineError::in_source(key.as_str(), e))?;
        log_success(format!(
            "{}: {} rows, encoding {}, separator '{}'",
            key,
            source.rows.len(),
            source.encoding,
            format_delimiter(source.delimiter)
        ));
        table.insert(key.as_str(), source);
    }

    Ok(run_parsed(&store, &table))
}

/// Generate from an already loaded store and source table.
pub fn run_parsed(store: &MappingStore, sources: &SourceTable) -> MappingOutput {
    log_info(format!(
        "🔄 Mapping {} descriptive triples against {} source(s)...",
        store.len(),
        sources.len()
    ));

    let generation = generate(store, sources);
    let stats = generation.stats;

    if generation.diagnostics.is_empty() {
        log_success(format!(
            "{} triples from {} triples-map(s)",
            stats.triples, stats.triples_maps
        ));
    } else {
        log_warning(format!(
            "{} triples from {} triples-map(s), {} skipped, {} warning(s)",
            stats.triples,
            stats.triples_maps,
            stats.skipped_triples_maps,
            generation.diagnostics.len()
        ));
    }

    MappingOutput {
        triples: generation.triples,
        diagnostics: generation.diagnostics,
        stats,
    }
}

/// Source keys declared by the mapping's triples-maps, in document order.
pub fn declared_sources(store: &MappingStore) -> Vec<String> {
    let mut keys: Vec<String> = Vec::new();
    for id in triples_map_ids(store) {
        if let Some(key) = source_key(store, id) {
            if !keys.iter().any(|k| k == key) {
                keys.push(key.to_string());
            }
        }
    }
    keys
}

/// Printable delimiter.
pub fn format_delimiter(delimiter: char) -> String {
    match delimiter {
        '\t' => "\\t".to_string(),
        c => c.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::DiagnosticKind;
    use crate::error::{CsvError, MappingError};
    use crate::models::Term;
    use tempfile::TempDir;

    const MAPPING: &str = r#"
        @prefix rr: <http://www.w3.org/ns/r2rml#> .
        @prefix rml: <http://semweb.mmlab.be/ns/rml#> .
        @prefix schema: <http://schema.org/> .

        <http://example.com/MedicationMap> a rr:TriplesMap ;
            rml:logicalSource [ rml:source "medications.csv" ] ;
            rr:subjectMap [ rr:template "http://example.com/medication/{id}" ] ;
            rr:predicateObjectMap [
                rr:predicateMap [ rr:constant schema:identifier ] ;
                rr:objectMap [ rml:reference "id" ]
            ] .

        <http://example.com/PatientMap> a rr:TriplesMap ;
            rml:logicalSource [ rml:source "patients.csv" ] ;
            rr:subjectMap [ rr:template "http://example.com/patient/{patient.id}" ] ;
            rr:predicateObjectMap [
                rr:predicate schema:name ;
                rr:objectMap [ rml:reference "patient.name" ]
            ] .
    "#;

    fn medications() -> HashMap<String, String> {
        HashMap::from([("medications.csv".to_string(), "id\nATC001".to_string())])
    }

    #[test]
    fn test_end_to_end_medication() {
        let output = run(MAPPING, &medications(), &MappingOptions::default()).unwrap();

        assert_eq!(
            output.triples,
            vec![Triple::new(
                Term::iri("http://example.com/medication/ATC001"),
                Term::iri("http://schema.org/identifier"),
                Term::plain("ATC001"),
            )]
        );
        assert_eq!(
            output.serialize(OutputFormat::NTriples).unwrap().trim(),
            r#"<http://example.com/medication/ATC001> <http://schema.org/identifier> "ATC001" ."#
        );
    }

    #[test]
    fn test_unbound_map_is_reported_not_fatal() {
        let output = run(MAPPING, &medications(), &MappingOptions::default()).unwrap();

        assert_eq!(output.stats.triples_maps, 2);
        assert_eq!(output.stats.skipped_triples_maps, 1);
        assert_eq!(output.diagnostics.of_kind(DiagnosticKind::MissingSource).count(), 1);
    }

    #[test]
    fn test_run_is_deterministic() {
        let mut sources = medications();
        sources.insert(
            "patients.csv".to_string(),
            "patient.id,patient.name\nP1,Alice\nP2,Bob".to_string(),
        );
        let options = MappingOptions::default();

        let first = run(MAPPING, &sources, &options).unwrap();
        for _ in 0..5 {
            let again = run(MAPPING, &sources, &options).unwrap();
            assert_eq!(again.triples, first.triples);
        }
        assert_eq!(first.triples.len(), 3);
        assert_eq!(first.triples[1].subject, Term::iri("http://example.com/patient/P1"));
        assert_eq!(first.triples[1].object, Term::plain("Alice"));
    }

    #[test]
    fn test_invalid_mapping_is_fatal() {
        let result = run("this is not turtle", &medications(), &MappingOptions::default());
        assert!(matches!(result, Err(PipelineError::Mapping(MappingError::Parse { .. }))));
    }

    #[test]
    fn test_empty_source_is_fatal() {
        let sources = HashMap::from([("medications.csv".to_string(), String::new())]);
        let result = run(MAPPING, &sources, &MappingOptions::default());
        match result {
            Err(PipelineError::Source { key, source }) => {
                assert_eq!(key, "medications.csv");
                assert!(matches!(source, CsvError::EmptySource));
            }
            other => panic!("expected source error, got {:?}", other.map(|o| o.triples)),
        }
    }

    #[test]
    fn test_first_failing_source_in_key_order() {
        let sources = HashMap::from([
            ("zeta.csv".to_string(), String::new()),
            ("b.csv".to_string(), String::new()),
            ("a.csv".to_string(), String::new()),
            ("medications.csv".to_string(), "id\nATC001".to_string()),
        ]);
        for _ in 0..5 {
            match run(MAPPING, &sources, &MappingOptions::default()) {
                Err(PipelineError::Source { key, .. }) => assert_eq!(key, "a.csv"),
                other => panic!("expected source error, got {:?}", other.map(|o| o.triples)),
            }
        }
    }

    #[test]
    fn test_forced_delimiter() {
        let sources = HashMap::from([("medications.csv".to_string(), "id;x\nA;1".to_string())]);
        let options = MappingOptions {
            delimiter: Some(';'),
            ..Default::default()
        };
        let output = run(MAPPING, &sources, &options).unwrap();
        assert_eq!(output.triples[0].object, Term::plain("A"));
    }

    #[test]
    fn test_parse_sources_then_run() {
        let bytes = b"id\nATC001\nATC002".to_vec();
        let (table, infos) = parse_sources(
            vec![("medications.csv".to_string(), bytes)],
            &MappingOptions::default(),
        )
        .unwrap();
        assert_eq!(infos[0].key, "medications.csv");
        assert_eq!(infos[0].headers, vec!["id"]);
        assert_eq!(infos[0].row_count, 2);

        let store = MappingStore::from_turtle(MAPPING, None).unwrap();
        let output = run_parsed(&store, &table);
        assert_eq!(output.stats.rows, 2);
        assert_eq!(output.triples[1].object, Term::plain("ATC002"));
    }

    #[test]
    fn test_declared_sources() {
        let store = MappingStore::from_turtle(MAPPING, None).unwrap();
        assert_eq!(declared_sources(&store), vec!["medications.csv", "patients.csv"]);
    }

    #[test]
    fn test_parse_delimiter() {
        assert_eq!(parse_delimiter("tab"), Some('\t'));
        assert_eq!(parse_delimiter(";"), Some(';'));
        assert_eq!(parse_delimiter(""), None);
    }

    #[tokio::test]
    async fn test_run_files() {
        let dir = TempDir::new().unwrap();
        let mapping_path = dir.path().join("mapping.ttl");
        let csv_path = dir.path().join("medications.csv");
        tokio::fs::write(&mapping_path, MAPPING).await.unwrap();
        tokio::fs::write(&csv_path, "id\nATC001\nATC002\n").await.unwrap();

        let output = run_files(
            &mapping_path,
            &[("medications.csv".to_string(), csv_path)],
            &MappingOptions::default(),
        )
        .await
        .unwrap();

        assert_eq!(output.stats.rows, 2);
        assert_eq!(output.triples.len(), 2);
    }

    #[tokio::test]
    async fn test_run_files_missing_mapping() {
        let dir = TempDir::new().unwrap();
        let result = run_files(&dir.path().join("nope.ttl"), &[], &MappingOptions::default()).await;
        assert!(matches!(result, Err(PipelineError::Io { .. })));
    }
}
