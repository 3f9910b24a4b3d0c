//! HTTP Server for the hpcparse API.
//!
//! Every request runs the pipeline with per-request staging files, so
//! concurrent requests never share an input file.
//!
//! # API Endpoints
//!
//! | Method | Path              | Description                          |
//! |--------|-------------------|--------------------------------------|
//! | GET    | `/health`         | Health check                         |
//! | GET    | `/api/sample`     | Default sample input                 |
//! | POST   | `/api/process`    | Process JSON `{ "text": ... }`       |
//! | POST   | `/api/upload`     | Process an uploaded text file        |
//! | GET    | `/api/logs`       | SSE stream for real-time logs        |

use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::{header, Method, StatusCode},
    response::{sse::Event, Json, Sse},
    routing::{get, post},
    Router,
};
use futures::stream::Stream;
use serde_json::{json, Value};
use std::{convert::Infallible, net::SocketAddr, sync::Arc, time::Duration};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::StreamExt as _;
use tower_http::cors::CorsLayer;

use super::logs::{log_error, LOG_BROADCASTER};
use super::types::{error_response, ProcessRequest, ProcessResponse};
use crate::config::{Config, MAX_UPLOAD_SIZE, SAMPLE_INPUT};
use crate::error::{PipelineError, ServerError};
use crate::staging::StagingMode;
use crate::transform::pipeline::{run_pipeline, run_pipeline_bytes, PipelineOptions};
use crate::transform::reference::operation_description;

type ApiError = (StatusCode, Json<Value>);

/// Shared, read-only server state
#[derive(Clone)]
pub struct AppState {
    options: Arc<PipelineOptions>,
}

impl AppState {
    pub fn new(config: &Config) -> Self {
        Self {
            options: Arc::new(config.pipeline_options(StagingMode::PerRequest)),
        }
    }
}

/// Build the router without binding a socket
pub fn router(config: &Config) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([header::CONTENT_TYPE, header::ACCEPT])
        .expose_headers([header::CONTENT_TYPE]);

    Router::new()
        .route("/", get(health))
        .route("/health", get(health))
        .route("/api/sample", get(sample))
        .route("/api/process", post(process_text))
        .route("/api/upload", post(upload_file))
        .route("/api/logs", get(sse_logs))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_SIZE))
        .layer(cors)
        .with_state(AppState::new(config))
}

/// Start the HTTP server
pub async fn start_server(config: Config) -> Result<(), Box<dyn std::error::Error>> {
    let app = router(&config);

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    println!("🚀 hpcparse server running on http://localhost:{}", config.port);
    println!("   POST /api/process - Process JSON text");
    println!("   POST /api/upload  - Process uploaded file");
    println!("   GET  /api/sample  - Sample input");
    println!("   GET  /api/logs    - SSE log stream");
    println!("   GET  /health      - Health check");
    println!();
    println!("📂 Staging directory: {}", config.data_dir.display());
    println!("⚙️  Native engine: {}", config.engine().binary().display());

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// HTTP status for a server error
fn status_for(err: &ServerError) -> StatusCode {
    match err {
        ServerError::BadRequest(_) => StatusCode::BAD_REQUEST,
        ServerError::Pipeline(PipelineError::Name(_)) => StatusCode::BAD_REQUEST,
        ServerError::Pipeline(PipelineError::Parse(_)) => StatusCode::UNPROCESSABLE_ENTITY,
        ServerError::Pipeline(PipelineError::Staging(_)) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn api_error(err: ServerError) -> ApiError {
    log_error(err.to_string());
    (status_for(&err), Json(error_response(&err.to_string())))
}

/// Health check endpoint
async fn health(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "hpcparse",
        "version": env!("CARGO_PKG_VERSION"),
        "operation": operation_description(),
        "engineAvailable": state.options.engine.is_available(),
        "endpoints": {
            "process": "POST /api/process",
            "upload": "POST /api/upload",
            "logs": "GET /api/logs (SSE)"
        }
    }))
}

/// Sample input endpoint
async fn sample() -> Json<Value> {
    Json(json!({ "text": SAMPLE_INPUT }))
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

/// Process text sent as JSON
async fn process_text(
    State(state): State<AppState>,
    Json(request): Json<ProcessRequest>,
) -> Result<Json<ProcessResponse>, ApiError> {
    let result = run_pipeline(&request.text, &state.options)
        .await
        .map_err(|e| api_error(e.into()))?;

    Ok(Json(ProcessResponse::from(result)))
}

/// Process an uploaded file (multipart field `file`)
async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ProcessResponse>, ApiError> {
    let mut file_data: Option<Vec<u8>> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| api_error(ServerError::BadRequest(format!("Multipart error: {}", e))))?
    {
        if field.name() == Some("file") {
            file_name = field.file_name().map(|s| s.to_string());
            let bytes = field
                .bytes()
                .await
                .map_err(|e| api_error(ServerError::BadRequest(format!("Read error: {}", e))))?;
            file_data = Some(bytes.to_vec());
        }
    }

    let bytes =
        file_data.ok_or_else(|| api_error(ServerError::BadRequest("No file provided".into())))?;

    println!(
        "📄 Upload: {} ({} bytes)",
        file_name.as_deref().unwrap_or("unknown"),
        bytes.len()
    );

    let result = run_pipeline_bytes(&bytes, &state.options)
        .await
        .map_err(|e| api_error(e.into()))?;

    Ok(Json(ProcessResponse::from(result)))
}
