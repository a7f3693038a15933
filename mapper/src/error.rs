//! Error types for the rmlmap interpreter.
//!
//! Only fatal conditions live here:
//!
//! - [`CsvError`] - a tabular source cannot be read at all
//! - [`MappingError`] - the mapping document is not valid Turtle
//! - [`SerializeError`] - writing the triples out failed
//! - [`PipelineError`] - top-level run errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Recoverable conditions (missing sources, incomplete term maps) are not
//! errors; they are reported as [`crate::diagnostics::Diagnostic`] values.

use thiserror::Error;

// =============================================================================
// Tabular Source Errors
// =============================================================================

/// Errors while reading a delimited-text source.
#[derive(Debug, Error)]
pub enum CsvError {
    /// Failed to read file.
    #[error("Failed to read file: {0}")]
    Io(#[from] std::io::Error),

    /// Bytes could not be decoded.
    #[error("Failed to decode content: {0}")]
    Encoding(String),

    /// Malformed content the reader could not recover from.
    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },

    /// Source has no content, so no header line either.
    #[error("Source is empty")]
    EmptySource,

    /// Header line present but without any field name.
    #[error("No headers found")]
    NoHeaders,
}

impl CsvError {
    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        CsvError::Parse {
            line,
            message: message.into(),
        }
    }
}

// =============================================================================
// Mapping Document Errors
// =============================================================================

/// Errors while loading the mapping document.
#[derive(Debug, Error)]
pub enum MappingError {
    /// The document is not syntactically valid Turtle.
    #[error("Invalid mapping document (line {line}): {message}")]
    Parse { line: u64, message: String },

    /// The configured base IRI could not be parsed.
    #[error("Invalid base IRI '{0}'")]
    InvalidBaseIri(String),

    /// Failed to read the mapping file.
    #[error("Failed to read mapping: {0}")]
    Io(#[from] std::io::Error),
}

// =============================================================================
// Serialization Errors
// =============================================================================

/// Errors while writing triples.
#[derive(Debug, Error)]
pub enum SerializeError {
    #[error("Write failed: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid prefix '{prefix}': {message}")]
    InvalidPrefix { prefix: String, message: String },

    #[error("Output is not UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level run errors.
///
/// This is the error type returned by [`crate::transform::pipeline::run`] and
/// its file-based wrappers.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Mapping document error.
    #[error("Mapping error: {0}")]
    Mapping(#[from] MappingError),

    /// A source could not be parsed.
    #[error("Source '{key}': {source}")]
    Source {
        key: String,
        #[source]
        source: CsvError,
    },

    /// Output serialization error.
    #[error("Serialize error: {0}")]
    Serialize(#[from] SerializeError),

    /// Reading a source file failed.
    #[error("Cannot read '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl PipelineError {
    pub fn in_source(key: impl Into<String>, source: CsvError) -> Self {
        PipelineError::Source {
            key: key.into(),
            source,
        }
    }
}

// =============================================================================
// Server Errors
// =============================================================================

/// HTTP server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Pipeline error.
    #[error("Pipeline error: {0}")]
    Pipeline(#[from] PipelineError),

    /// Invalid request.
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Server internal error.
    #[error("Internal server error: {0}")]
    Internal(String),
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for source reading.
pub type CsvResult<T> = Result<T, CsvError>;

/// Result type for mapping document loading.
pub type MappingResult<T> = Result<T, MappingError>;

/// Result type for serialization.
pub type SerializeResult<T> = Result<T, SerializeError>;

/// Result type for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_conversion_chain() {
        let mapping_err = MappingError::Parse {
            line: 3,
            message: "expected '.'".into(),
        };
        let pipeline_err: PipelineError = mapping_err.into();
        assert!(pipeline_err.to_string().contains("line 3"));

        let pipeline_err = PipelineError::in_source("meds.csv", CsvError::EmptySource);
        let msg = pipeline_err.to_string();
        assert!(msg.contains("meds.csv"));
        assert!(msg.contains("empty"));
    }

    #[test]
    fn test_parse_error_format() {
        let err = CsvError::parse(5, "unterminated quote");
        let msg = err.to_string();
        assert!(msg.contains("Line 5"));
        assert!(msg.contains("unterminated quote"));
    }
}
