//! Error types for the hpcparse pipeline.
//!
//! One enum per concern:
//!
//! - [`NameError`] - Filename validation errors
//! - [`ParseError`] - Numeric parsing errors
//! - [`StagingError`] - Staging directory I/O errors
//! - [`ConfigError`] - Environment configuration errors
//! - [`PipelineError`] - Top-level orchestration errors
//! - [`ServerError`] - HTTP layer errors
//!
//! Error conversion is automatic via `From` implementations,
//! allowing `?` to work across error boundaries.
//!
//! Engine outcomes (`NotFound`, `Failed`, `TimedOut`) are not errors: they are
//! control values recovered by the pipeline, see
//! [`crate::transform::engine::EngineOutcome`].

use std::path::PathBuf;
use thiserror::Error;

// =============================================================================
// Filename Errors
// =============================================================================

/// Errors raised by [`crate::validation::validate_filename`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NameError {
    /// The name contains a character outside `[A-Za-z0-9_.-]`, or is empty.
    #[error("Invalid filename: {0:?}")]
    InvalidName(String),

    /// The name contains `..`, `/` or `\`.
    #[error("Path traversal not allowed: {0:?}")]
    PathTraversal(String),
}

// =============================================================================
// Parsing Errors
// =============================================================================

/// Errors during numeric parsing.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// A token is not a decimal or scientific-notation number.
    #[error("Line {line}: malformed number '{token}'")]
    MalformedNumber { line: usize, token: String },

    /// Raw bytes could not be decoded to text.
    #[error("Encoding error: {0}")]
    Encoding(String),
}

// =============================================================================
// Staging Errors
// =============================================================================

/// I/O errors around the staging directory.
#[derive(Debug, Error)]
pub enum StagingError {
    /// The staging directory could not be created.
    #[error("Cannot create staging directory '{}': {source}", path.display())]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The staging directory could not be resolved to an absolute path.
    #[error("Cannot resolve staging directory '{}': {source}", path.display())]
    Resolve {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The input could not be written.
    #[error("Cannot write staging file '{}': {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The staged input could not be read back.
    #[error("Cannot read staging file '{}': {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

// =============================================================================
// Configuration Errors
// =============================================================================

/// Errors while loading [`crate::config::Config`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// An environment variable holds a value of the wrong shape.
    #[error("Invalid value for {key}: {value:?}")]
    InvalidValue { key: String, value: String },
}

// =============================================================================
// Pipeline Errors (top-level)
// =============================================================================

/// Top-level pipeline orchestration errors.
///
/// This is the error type returned by [`crate::transform::pipeline::run_pipeline`].
/// Any of these aborts the current run; nothing is published.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A staging file name was rejected.
    #[error("Name error: {0}")]
    Name(#[from] NameError),

    /// The staged input could not be parsed.
    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    /// The staging write or read failed.
    #[error("Staging error: {0}")]
    Staging(#[from] StagingError),
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
}

// =============================================================================
// Result Type Aliases
// =============================================================================

/// Result type for staging operations.
pub type StagingResult<T> = Result<T, StagingError>;
