//! Writing triples as N-Triples or Turtle.
//!
//! Terms are converted to `oxrdf` values and written with the `oxttl`
//! serializers. A triple whose terms are not valid RDF (for example an IRI
//! built from an empty reference) is left out of the output with a warning.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::api::logs::log_warning;
use crate::error::{SerializeError, SerializeResult};
use crate::models::Triple;

/// Prefixes declared in Turtle output.
pub const PREFIXES: &[(&str, &str)] = &[
    ("rdf", "http://www.w3.org/1999/02/22-rdf-syntax-ns#"),
    ("xsd", "http://www.w3.org/2001/XMLSchema#"),
    ("schema", "http://schema.org/"),
];

/// Output syntax.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    NTriples,
    Turtle,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::NTriples => "nt",
            OutputFormat::Turtle => "ttl",
        }
    }

    pub fn media_type(&self) -> &'static str {
        match self {
            OutputFormat::NTriples => "application/n-triples",
            OutputFormat::Turtle => "text/turtle",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nt" | "ntriples" | "n-triples" => Ok(OutputFormat::NTriples),
            "ttl" | "turtle" => Ok(OutputFormat::Turtle),
            other => Err(format!("unknown output format '{}' (expected nt or ttl)", other)),
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Serialize `triples` in the given format.
pub fn serialize(triples: &[Triple], format: OutputFormat) -> SerializeResult<String> {
    let bytes = match format {
        OutputFormat::NTriples => to_ntriples(triples)?,
        OutputFormat::Turtle => to_turtle(triples)?,
    };
    Ok(String::from_utf8(bytes)?)
}

fn to_ntriples(triples: &[Triple]) -> SerializeResult<Vec<u8>> {
    let mut writer = oxttl::NTriplesSerializer::new().for_writer(Vec::new());
    for triple in convert_all(triples) {
        writer.serialize_triple(&triple)?;
    }
    Ok(writer.finish())
}

fn to_turtle(triples: &[Triple]) -> SerializeResult<Vec<u8>> {
    let mut serializer = oxttl::TurtleSerializer::new();
    for (prefix, iri) in PREFIXES {
        serializer = serializer
            .with_prefix(*prefix, *iri)
            .map_err(|e| SerializeError::InvalidPrefix {
                prefix: prefix.to_string(),
                message: e.to_string(),
            })?;
    }

    let mut writer = serializer.for_writer(Vec::new());
    for triple in convert_all(triples) {
        writer.serialize_triple(&triple)?;
    }
    Ok(writer.finish()?)
}

fn convert_all(triples: &[Triple]) -> Vec<oxrdf::Triple> {
    let mut converted = Vec::with_capacity(triples.len());
    let mut skipped = 0usize;
    for triple in triples {
        match triple.to_oxrdf() {
            Ok(t) => converted.push(t),
            Err(message) => {
                if skipped == 0 {
                    log_warning(format!("Skipping {}: {}", triple, message));
                }
                skipped += 1;
            }
        }
    }
    if skipped > 1 {
        log_warning(format!("{} triples with invalid terms left out", skipped));
    }
    converted
}
