//! Triple generation.
//!
//! Each triples-map is processed on its own into a [`Partition`]; partitions
//! are concatenated in triples-map order. Within a partition triples come out
//! row by row, and within a row in predicate-object map order. Duplicates
//! are kept.

use serde::{Deserialize, Serialize};

use crate::api::logs::log_info_indent;
use crate::diagnostics::Diagnostics;
use crate::mapping::model::{triples_map_ids, ObjectMap, TriplesMap};
use crate::mapping::source::{resolve, SourceTable};
use crate::mapping::store::MappingStore;
use crate::models::{Term, Triple};
use crate::transform::term::{resolve_object, resolve_predicate, resolve_subject};

/// Counters for one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MappingStats {
    /// Triples-maps found in the mapping
    pub triples_maps: usize,
    /// Triples-maps that produced nothing because of a diagnostic
    pub skipped_triples_maps: usize,
    /// Rows visited across all bound sources
    pub rows: usize,
    pub triples: usize,
}

/// Generated triples with what was reported along the way.
#[derive(Debug, Clone, Default)]
pub struct Generation {
    pub triples: Vec<Triple>,
    pub diagnostics: Diagnostics,
    pub stats: MappingStats,
}

/// Output of a single triples-map.
#[derive(Debug, Default)]
struct Partition {
    triples: Vec<Triple>,
    diagnostics: Diagnostics,
    rows: usize,
    skipped: bool,
}

impl Partition {
    fn skipped(diagnostics: Diagnostics) -> Self {
        Self {
            diagnostics,
            skipped: true,
            ..Default::default()
        }
    }
}

/// A predicate-object map reduced to what can be emitted.
struct Emitter<'a> {
    predicates: Vec<Term>,
    objects: Vec<&'a ObjectMap>,
}

/// Generate the triples of every triples-map in `store` against `sources`.
pub fn generate(store: &MappingStore, sources: &SourceTable) -> Generation {
    let ids = triples_map_ids(store);
    let partitions: Vec<Partition> = ids
        .iter()
        .map(|id| generate_triples_map(store, id, sources))
        .collect();

    let mut generation = Generation::default();
    generation.stats.triples_maps = ids.len();

    for partition in partitions {
        if partition.skipped {
            generation.stats.skipped_triples_maps += 1;
        }
        generation.stats.rows += partition.rows;
        generation.diagnostics.extend(partition.diagnostics);
        generation.triples.extend(partition.triples);
    }
    generation.stats.triples = generation.triples.len();

    generation
}

fn generate_triples_map(store: &MappingStore, id: &Term, sources: &SourceTable) -> Partition {
    let tm = TriplesMap::describe(store, id);
    let label = tm.label();
    let mut diagnostics = Diagnostics::new();

    let bound = match resolve(id, store, sources) {
        Ok(bound) => bound,
        Err(err) => {
            diagnostics.report(err.kind(), &label, err.to_string());
            return Partition::skipped(diagnostics);
        }
    };

    let Some(template) = tm.template() else {
        diagnostics.incomplete(&label, "no subject template");
        return Partition::skipped(diagnostics);
    };

    let emitters = emitters(&tm, &label, &mut diagnostics);

    let mut triples = Vec::with_capacity(bound.source.rows.len() * emitters.len());
    for row in &bound.source.rows {
        let subject = resolve_subject(template, row);
        for emitter in &emitters {
            for predicate in &emitter.predicates {
                for object_map in &emitter.objects {
                    if let Some(object) = resolve_object(object_map, row) {
                        triples.push(Triple::new(subject.clone(), predicate.clone(), object));
                    }
                }
            }
        }
    }

    log_info_indent(
        format!(
            "{} <- {}: {} rows, {} triples",
            label,
            bound.key,
            bound.source.rows.len(),
            triples.len()
        ),
        1,
    );

    Partition {
        triples,
        diagnostics,
        rows: bound.source.rows.len(),
        skipped: false,
    }
}

/// Check every predicate-object map once, reporting the unusable parts.
fn emitters<'a>(tm: &'a TriplesMap, label: &str, diagnostics: &mut Diagnostics) -> Vec<Emitter<'a>> {
    let mut emitters = Vec::new();

    for (index, pom) in tm.predicate_object_maps.iter().enumerate() {
        let position = index + 1;

        let predicates: Vec<Term> = pom.predicate_maps.iter().filter_map(resolve_predicate).collect();
        if predicates.len() < pom.predicate_maps.len() {
            diagnostics.incomplete(
                label,
                format!("predicate-object map #{}: predicate map without an IRI constant", position),
            );
        }
        if predicates.is_empty() {
            if pom.predicate_maps.is_empty() {
                diagnostics.incomplete(
                    label,
                    format!("predicate-object map #{}: no predicate", position),
                );
            }
            continue;
        }

        let objects: Vec<&ObjectMap> = pom.object_maps.iter().filter(|om| !om.is_empty()).collect();
        if objects.is_empty() {
            diagnostics.incomplete(
                label,
                format!("predicate-object map #{}: no object reference or constant", position),
            );
            continue;
        }

        emitters.push(Emitter { predicates, objects });
    }

    emitters
}
