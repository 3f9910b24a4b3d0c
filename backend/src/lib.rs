//! # hpcparse - Scientific data engine with reference fallback
//!
//! hpcparse takes whitespace-delimited numeric rows, applies `v * v + 0.5`
//! to every value and returns the original and processed series side by
//! side. The transform is first delegated to a native executable; when it is
//! missing, fails or times out, the in-process reference implementation
//! takes over.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐     ┌─────────────┐     ┌─────────────┐     ┌─────────────┐
//! │  Raw text   │────▶│   Staging   │────▶│   Native    │────▶│  Series     │
//! │ (rows of f) │     │ (validated) │     │   engine    │     │  pair       │
//! └─────────────┘     └─────────────┘     └──────┬──────┘     └─────────────┘
//!                                                │ not found / failed / timed out
//!                                                ▼
//!                                         ┌─────────────┐
//!                                         │ Parser +    │
//!                                         │ reference   │
//!                                         └─────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hpcparse::{run_pipeline, PipelineOptions};
//!
//! #[tokio::main]
//! async fn main() {
//!     let result = run_pipeline("1.2 3.4\n5.6 7.8", &PipelineOptions::default()).await.unwrap();
//!     println!("{} → {:?}", result.outcome(), result.preview(5));
//! }
//! ```
//!
//! ## Modules
//!
//! - [`error`] - Error types
//! - [`config`] - Environment configuration
//! - [`models`] - Series types
//! - [`validation`] - Filename validation
//! - [`parser`] - Numeric row parsing
//! - [`staging`] - Staging directory
//! - [`transform`] - Reference transform, native engine, pipeline
//! - [`api`] - HTTP API server

// Core modules
pub mod config;
pub mod error;
pub mod models;

// Input
pub mod parser;
pub mod staging;
pub mod validation;

// Transformation
pub mod transform;

// HTTP API
pub mod api;

// =============================================================================
// Re-exports - Errors
// =============================================================================

pub use error::{ConfigError, NameError, ParseError, PipelineError, ServerError, StagingError};

// =============================================================================
// Re-exports - Models & config
// =============================================================================

pub use config::{Config, SAMPLE_INPUT};
pub use models::{FlatSeries, SeriesPair, PREVIEW_LEN};

// =============================================================================
// Re-exports - Input
// =============================================================================

pub use parser::{
    decode_content, detect_encoding, flatten, parse_bytes_auto, parse_flat, parse_rows,
    ParsedInput,
};
pub use staging::{StagedPaths, StagingArea, StagingMode};
pub use validation::{is_valid_filename, validate_filename};

// =============================================================================
// Re-exports - Transformation
// =============================================================================

pub use transform::{
    run_pipeline, run_pipeline_bytes, transform, transform_series, EngineOutcome, EngineRun,
    ExternalEngine, PipelineOptions, PipelineResult,
};

// =============================================================================
// Re-exports - API
// =============================================================================

pub use api::types::{error_response, ProcessRequest, ProcessResponse};

// Server
pub mod server {
    pub use crate::api::server::{router, start_server};
}
