//! HTTP server for the mapping interpreter.
//!
//! # API Endpoints
//!
//! | Method | Path        | Description                                   |
//! |--------|-------------|-----------------------------------------------|
//! | GET    | `/health`   | Health check                                  |
//! | POST   | `/api/map`  | Upload a mapping and its sources, get triples |
//! | GET    | `/api/logs` | SSE stream for real-time logs                 |
//!
//! `/api/map` takes multipart form data: a `mapping` field with the Turtle
//! document, an optional `format` field (`nt` or `ttl`), and one file field
//! per source. A source is keyed by its file name, which must match the
//! `rml:source` value in the mapping.

use axum::{
    extract::Multipart,
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, log_info, LOG_BROADCASTER};
use super::types::{error_response, MapResponse};
use crate::error::{PipelineError, ServerError, ServerResult};
use crate::mapping::store::MappingStore;
use crate::serialize::OutputFormat;
use crate::transform::pipeline::{parse_sources, run_parsed, MappingOptions};

type Rejection = (StatusCode, Json<Value>);

/// Build the router.
pub fn router() -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/map", post(map_upload))
        .route("/api/logs", get(sse_logs))
        .layer(cors)
}

/// Start the HTTP server
pub async fn start_server(port: u16) -> Result<(), Box<dyn std::error::Error>> {
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    println!("🚀 rmlmap server running on http://localhost:{}", port);
    println!("   POST /api/map  - Upload mapping + CSV sources");
    println!("   GET  /api/logs - SSE log stream");
    println!("   GET  /health   - Health check");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, router()).await?;

    Ok(())
}

/// Health check endpoint
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "rmlmap",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "map": "POST /api/map",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// SSE endpoint for real-time log streaming
async fn sse_logs() -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let rx = LOG_BROADCASTER.subscribe();

    let stream = BroadcastStream::new(rx).filter_map(|result| match result {
        Ok(entry) => {
            let json = serde_json::to_string(&entry).ok()?;
            Some(Ok(Event::default().data(json)))
        }
        Err(_) => None,
    });

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("keep-alive"),
    )
}

/// Mapping upload endpoint
async fn map_upload(multipart: Multipart) -> Result<Json<MapResponse>, Rejection> {
    let upload = read_upload(multipart).await.map_err(reject)?;
    run_upload(upload).map(Json).map_err(reject)
}

/// Fields of a `/api/map` request.
#[derive(Debug, Default)]
struct Upload {
    mapping: Option<String>,
    format: Option<String>,
    sources: Vec<(String, Vec<u8>)>,
}

async fn read_upload(mut multipart: Multipart) -> ServerResult<Upload> {
    let mut upload = Upload::default();

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(format!("Multipart error: {}", e)))?
    {
        let name = field.name().unwrap_or("").to_string();
        let file_name = field.file_name().map(str::to_string);
        let bytes = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(format!("Read error: {}", e)))?;

        match name.as_str() {
            "mapping" => {
                let text = String::from_utf8(bytes.to_vec())
                    .map_err(|_| ServerError::BadRequest("Mapping is not UTF-8".to_string()))?;
                upload.mapping = Some(text);
            }
            "format" => upload.format = Some(String::from_utf8_lossy(&bytes).into_owned()),
            _ => {
                let key = file_name.unwrap_or(name);
                if key.is_empty() {
                    return Err(ServerError::BadRequest("Source field without a name".to_string()));
                }
                upload.sources.push((key, bytes.to_vec()));
            }
        }
    }

    Ok(upload)
}

fn run_upload(upload: Upload) -> ServerResult<MapResponse> {
    let mapping = upload
        .mapping
        .ok_or_else(|| ServerError::BadRequest("No mapping provided".to_string()))?;

    let mut options = MappingOptions::from_env();
    if let Some(format) = upload.format {
        options.format = format.parse::<OutputFormat>().map_err(ServerError::BadRequest)?;
    }

    log_info(format!(
        "📄 New mapping upload ({} bytes, {} source(s))",
        mapping.len(),
        upload.sources.len()
    ));

    let store = MappingStore::from_turtle(&mapping, options.base_iri.as_deref())
        .map_err(PipelineError::from)?;
    let (table, infos) = parse_sources(upload.sources, &options)?;
    let output = run_parsed(&store, &table);
    let rdf = output
        .serialize(options.format)
        .map_err(|e| ServerError::Internal(e.to_string()))?;

    Ok(MapResponse::new(output, rdf, options.format, infos))
}

/// Status code for a failed request. Bad mappings and sources are the
/// client's fault; serialization failures are ours.
fn status_of(err: &ServerError) -> StatusCode {
    match err {
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ServerError::Pipeline(PipelineError::Mapping(_) | PipelineError::Source { .. }) => {
            StatusCode::BAD_REQUEST
        }
        ServerError::Pipeline(_) | ServerError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn reject(err: ServerError) -> Rejection {
    log_error(err.to_string());
    (status_of(&err), Json(error_response(&err.to_string())))
}
