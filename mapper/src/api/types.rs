//! REST API types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::diagnostics::Diagnostic;
use crate::serialize::OutputFormat;
use crate::transform::generator::MappingStats;
use crate::transform::pipeline::{MappingOutput, SourceInfo};

/// Response to a mapping upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MapResponse {
    /// Unique run identifier
    pub run_id: String,

    /// "ready" or "warning"
    pub status: String,

    /// When the run finished
    pub created_at: DateTime<Utc>,

    /// Output syntax of `rdf`
    pub format: OutputFormat,

    /// Serialized triples
    pub rdf: String,

    pub stats: MappingStats,

    pub diagnostics: Vec<Diagnostic>,

    /// Uploaded sources
    pub sources: Vec<SourceMetadata>,
}

/// Uploaded source metadata
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceMetadata {
    pub key: String,
    pub encoding: String,
    pub delimiter: String,
    pub row_count: usize,
    pub columns: Vec<String>,
}

impl From<SourceInfo> for SourceMetadata {
    fn from(info: SourceInfo) -> Self {
        Self {
            key: info.key,
            encoding: info.encoding,
            delimiter: crate::transform::pipeline::format_delimiter(info.delimiter),
            row_count: info.row_count,
            columns: info.headers,
        }
    }
}

impl MapResponse {
    pub fn new(output: MappingOutput, rdf: String, format: OutputFormat, sources: Vec<SourceInfo>) -> Self {
        Self {
            run_id: Uuid::new_v4().to_string(),
            status: if output.diagnostics.is_empty() { "ready" } else { "warning" }.to_string(),
            created_at: Utc::now(),
            format,
            rdf,
            stats: output.stats,
            diagnostics: output.diagnostics.into_iter().collect(),
            sources: sources.into_iter().map(SourceMetadata::from).collect(),
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "runId": Uuid::new_v4().to_string(),
        "status": "error",
        "createdAt": Utc::now(),
        "error": error,
        "rdf": "",
        "diagnostics": [],
    })
}
