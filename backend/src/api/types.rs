//! REST API types.
//!
//! A display layer gets everything it needs to draw the original versus
//! processed chart and the preview list from [`ProcessResponse`].

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::models::PREVIEW_LEN;
use crate::transform::engine::{EngineOutcome, EngineRun};
use crate::transform::pipeline::PipelineResult;

/// Body of `POST /api/process`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessRequest {
    pub text: String,
}

/// Response sent after a pipeline run
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProcessResponse {
    /// Unique job identifier
    pub job_id: String,

    /// Status: "engine" when the native engine produced the result, else "ready"
    pub status: String,

    pub outcome: EngineOutcome,

    /// Informational message about the outcome
    pub notice: String,

    /// Original values, in document order
    pub input: Vec<f64>,

    /// Processed values, same length as `input`
    pub output: Vec<f64>,

    /// First output values
    pub preview: Vec<f64>,

    /// Native engine diagnostics
    pub engine: EngineRun,

    pub processed_at: DateTime<Utc>,
}

impl From<PipelineResult> for ProcessResponse {
    fn from(result: PipelineResult) -> Self {
        let preview = result.preview(PREVIEW_LEN).to_vec();
        let (input, output) = result
            .series
            .map(|s| s.into_parts())
            .unwrap_or_default();
        let outcome = result.engine.outcome;

        ProcessResponse {
            job_id: Uuid::new_v4().to_string(),
            status: if outcome.is_success() { "engine" } else { "ready" }.to_string(),
            outcome,
            notice: outcome.notice().to_string(),
            input,
            output,
            preview,
            engine: result.engine,
            processed_at: Utc::now(),
        }
    }
}

/// Create an error response
pub fn error_response(error: &str) -> Value {
    json!({
        "jobId": Uuid::new_v4().to_string(),
        "status": "error",
        "error": error,
        "input": [],
        "output": [],
        "preview": []
    })
}
