//! rmlmap CLI - Turn CSV files into RDF with an RML mapping
//!
//! # Commands
//!
//! ```bash
//! rmlmap map mapping.ttl                          # Sources found next to the mapping
//! rmlmap map mapping.ttl -s meds.csv=data/m.csv   # Explicit source binding
//! rmlmap map mapping.ttl --format ttl -o out.ttl  # Turtle to a file
//! rmlmap inspect mapping.ttl                      # List triples-maps
//! rmlmap parse data.csv                           # Dump CSV rows as JSON
//! rmlmap serve                                    # Start HTTP server (port 3000)
//! ```
//!
//! Defaults come from `RMLMAP_BASE_IRI`, `RMLMAP_DELIMITER` and
//! `RMLMAP_FORMAT` (a `.env` file is loaded first); flags override them.

use clap::{Parser, Subcommand};
use rmlmap::mapping::model::{triples_map_ids, TriplesMap};
use rmlmap::mapping::source::source_key;
use rmlmap::transform::pipeline::{format_delimiter, parse_delimiter};
use rmlmap::{
    declared_sources, parse_file, run_files, MappingOptions, MappingStore, OutputFormat,
    ReadOptions, SourceInfo,
};
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "rmlmap")]
#[command(about = "Map CSV sources to RDF triples with an RML mapping", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run a mapping and write the triples
    Map {
        /// Mapping document (Turtle)
        mapping: PathBuf,

        /// Source binding as KEY=PATH, or PATH keyed by its file name.
        /// Without any, the mapping's rml:source values are read relative
        /// to the mapping file.
        #[arg(short, long = "source", value_parser = parse_source_arg)]
        sources: Vec<(String, PathBuf)>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Output format: nt or ttl
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Base IRI for relative IRIs in the mapping
        #[arg(short, long)]
        base_iri: Option<String>,

        /// CSV delimiter (auto-detect if not specified, "tab" for tabs)
        #[arg(short, long)]
        delimiter: Option<String>,
    },

    /// List the triples-maps of a mapping and their sources
    Inspect {
        /// Mapping document (Turtle)
        mapping: PathBuf,

        /// Base IRI for relative IRIs in the mapping
        #[arg(short, long)]
        base_iri: Option<String>,
    },

    /// Parse a CSV file and output JSON
    Parse {
        /// Input CSV file
        input: PathBuf,

        /// CSV delimiter (auto-detect if not specified)
        #[arg(short, long)]
        delimiter: Option<String>,

        /// Output file (default: stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Start HTTP server
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value = "3000")]
        port: u16,
    },
}

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Map {
            mapping,
            sources,
            output,
            format,
            base_iri,
            delimiter,
        } => {
            let mut options = MappingOptions::from_env();
            if let Some(format) = format {
                options.format = format;
            }
            if base_iri.is_some() {
                options.base_iri = base_iri;
            }
            if let Some(d) = delimiter {
                options.delimiter = parse_delimiter(&d);
            }
            cmd_map(&mapping, sources, output.as_deref(), &options).await
        }

        Commands::Inspect { mapping, base_iri } => {
            let base_iri = base_iri.or_else(|| MappingOptions::from_env().base_iri);
            cmd_inspect(&mapping, base_iri.as_deref())
        }

        Commands::Parse {
            input,
            delimiter,
            output,
        } => {
            let delimiter = delimiter
                .as_deref()
                .and_then(parse_delimiter)
                .or(MappingOptions::from_env().delimiter);
            cmd_parse(&input, delimiter, output.as_deref()).await
        }

        Commands::Serve { port } => cmd_serve(port).await,
    };

    if let Err(e) = result {
        eprintln!("❌ Error: {}", e);
        std::process::exit(1);
    }
}

fn parse_source_arg(arg: &str) -> Result<(String, PathBuf), String> {
    match arg.split_once('=') {
        Some((key, path)) if !key.is_empty() && !path.is_empty() => {
            Ok((key.to_string(), PathBuf::from(path)))
        }
        Some(_) => Err(format!("expected KEY=PATH, got '{}'", arg)),
        None => {
            let path = PathBuf::from(arg);
            let key = path
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(|| format!("cannot derive a source key from '{}'", arg))?
                .to_string();
            Ok((key, path))
        }
    }
}

async fn cmd_map(
    mapping: &Path,
    mut sources: Vec<(String, PathBuf)>,
    output: Option<&Path>,
    options: &MappingOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Mapping: {}", mapping.display());

    if sources.is_empty() {
        let content = fs::read_to_string(mapping)?;
        let store = MappingStore::from_turtle(&content, options.base_iri.as_deref())?;
        let dir = mapping.parent().unwrap_or_else(|| Path::new("."));

        for key in declared_sources(&store) {
            let path = dir.join(&key);
            if path.is_file() {
                sources.push((key, path));
            } else {
                eprintln!("   ⚠️  {} not found next to the mapping", key);
            }
        }
    }

    let result = run_files(mapping, &sources, options).await?;

    eprintln!("\n📊 SUMMARY");
    eprintln!(
        "   Triples-maps: {} ({} skipped)",
        result.stats.triples_maps, result.stats.skipped_triples_maps
    );
    eprintln!("   Rows: {}", result.stats.rows);
    eprintln!("   Triples: {}", result.stats.triples);
    if !result.diagnostics.is_empty() {
        eprintln!("   Warnings: {}", result.diagnostics.len());
    }

    let rdf = result.serialize(options.format)?;
    write_output(&rdf, output)?;

    eprintln!("\n✨ Done!");
    Ok(())
}

fn cmd_inspect(mapping: &Path, base_iri: Option<&str>) -> Result<(), Box<dyn std::error::Error>> {
    let content = fs::read_to_string(mapping)?;
    let store = MappingStore::from_turtle(&content, base_iri)?;
    let ids = triples_map_ids(&store);

    eprintln!("📋 {} triples-map(s) in {}\n", ids.len(), mapping.display());
    for id in ids {
        let tm = TriplesMap::describe(&store, id);
        println!("  📄 {}", tm.label());
        println!("     Source: {}", source_key(&store, id).unwrap_or("(none)"));
        println!("     Subject: {}", tm.template().unwrap_or("(no template)"));
        println!("     Predicate-object maps: {}", tm.predicate_object_maps.len());
        println!();
    }

    Ok(())
}

async fn cmd_parse(
    input: &Path,
    delimiter: Option<char>,
    output: Option<&Path>,
) -> Result<(), Box<dyn std::error::Error>> {
    eprintln!("📄 Parsing CSV: {}", input.display());

    let options = ReadOptions { delimiter };
    let source = parse_file(input, &options).await?;
    let key = input.file_name().and_then(|n| n.to_str()).unwrap_or("source");
    let info = SourceInfo::new(key, &source);

    eprintln!("   Encoding: {}", info.encoding);
    eprintln!(
        "   Delimiter: '{}'{}",
        format_delimiter(info.delimiter),
        if delimiter.is_none() { " (auto-detected)" } else { "" }
    );
    eprintln!("   Columns: {}", info.headers.join(", "));
    eprintln!("✅ Parsed {} rows", info.row_count);

    let rows: Vec<_> = source.rows.iter().map(|row| row.to_json()).collect();
    let json = serde_json::to_string_pretty(&rows)?;
    write_output(&json, output)?;

    Ok(())
}

async fn cmd_serve(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    rmlmap::server::start_server(port).await
}

fn write_output(content: &str, path: Option<&Path>) -> Result<(), Box<dyn std::error::Error>> {
    match path {
        Some(p) => {
            fs::write(p, content)?;
            eprintln!("💾 Output written to: {}", p.display());
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
