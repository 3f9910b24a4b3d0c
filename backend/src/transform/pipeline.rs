//! Pipeline orchestrator: stage → native engine → reference fallback.
//!
//! One call is one run, start to finish:
//!
//! 1. Validate staging names and write the raw input verbatim
//! 2. Try the native engine on the staged file
//! 3. Branch on the [`EngineOutcome`]; every outcome except `Succeeded`
//!    falls back to parsing the staged file and applying the reference
//!    transform
//! 4. Return the result by value (no global session state)
//!
//! # Example
//!
//! ```rust,ignore
//! use hpcparse::transform::pipeline::{run_pipeline, PipelineOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let result = run_pipeline("1.2 3.4\n5.6 7.8", &PipelineOptions::default()).await?;
//!     println!("{}: {:?}", result.outcome(), result.preview(5));
//!     Ok(())
//! }
//! ```

use serde::Serialize;
use std::path::{Path, PathBuf};

use super::engine::{EngineOutcome, EngineRun, ExternalEngine};
use crate::api::logs::{log_info, log_info_indent, log_success, log_warning};
use crate::config::DEFAULT_DATA_DIR;
use crate::error::PipelineError;
use crate::models::SeriesPair;
use crate::parser::{decode_content, detect_encoding, parse_flat};
use crate::staging::{StagedPaths, StagingArea, StagingMode};

/// Options for one pipeline run
#[derive(Debug, Clone)]
pub struct PipelineOptions {
    /// Staging directory
    pub data_dir: PathBuf,

    /// Native engine to try first
    pub engine: ExternalEngine,

    /// Fixed or per-request staging names
    pub staging: StagingMode,

    /// Also compute the reference series when the native engine succeeds.
    ///
    /// The engine's artifact is never read back, so without this a
    /// successful run carries no series to display.
    pub compute_on_success: bool,
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            engine: ExternalEngine::default(),
            staging: StagingMode::Fixed,
            compute_on_success: true,
        }
    }
}

/// Result of a complete run
#[derive(Debug, Clone, Serialize)]
pub struct PipelineResult {
    /// What the native engine attempt did
    pub engine: EngineRun,

    /// Original and transformed series, when computed
    pub series: Option<SeriesPair>,

    /// Where the input was staged
    pub paths: StagedPaths,
}

impl PipelineResult {
    pub fn outcome(&self) -> EngineOutcome {
        self.engine.outcome
    }

    /// The native engine produced the authoritative result.
    pub fn is_engine_backed(&self) -> bool {
        self.engine.outcome.is_success()
    }

    pub fn notice(&self) -> &'static str {
        self.engine.outcome.notice()
    }

    /// First `n` output values, empty when no series was computed.
    pub fn preview(&self, n: usize) -> &[f64] {
        self.series.as_ref().map_or(&[], |s| s.preview(n))
    }

    /// The native engine's output file, if the run succeeded and the file
    /// is still on disk. Per-request staging removes it when the run ends.
    pub fn engine_artifact(&self) -> Option<&Path> {
        let output = self.paths.output.as_path();
        (self.is_engine_backed() && output.is_file()).then_some(output)
    }
}

/// Run the pipeline on raw text.
pub async fn run_pipeline(
    text: &str,
    options: &PipelineOptions,
) -> Result<PipelineResult, PipelineError> {
    let area = StagingArea::open(&options.data_dir).await?;
    log_info(format!("📥 Staging input in {}...", area.dir().display()));
    let paths = area.paths(options.staging)?;
    area.write_input(&paths, text).await?;
    log_success(format!("Staged {} bytes to {}", text.len(), paths.input.display()));

    let result = run_staged(&area, paths.clone(), options).await;

    if options.staging == StagingMode::PerRequest {
        area.cleanup(&paths).await;
    }

    result
}

/// Run the pipeline on raw bytes, detecting their encoding first.
pub async fn run_pipeline_bytes(
    bytes: &[u8],
    options: &PipelineOptions,
) -> Result<PipelineResult, PipelineError> {
    let encoding = detect_encoding(bytes);
    log_info(format!("Detected encoding: {}", encoding));
    let text = decode_content(bytes, &encoding)?;
    run_pipeline(&text, options).await
}

/// Engine attempt and fallback on an already staged input.
async fn run_staged(
    area: &StagingArea,
    paths: StagedPaths,
    options: &PipelineOptions,
) -> Result<PipelineResult, PipelineError> {
    log_info(format!(
        "⚙️  Trying native engine at {} (timeout {:?})...",
        options.engine.binary().display(),
        options.engine.timeout()
    ));
    let engine = options.engine.try_run(&paths.input, &paths.output).await;

    let series = match engine.outcome {
        EngineOutcome::Succeeded => {
            log_success(engine.outcome.notice());
            log_engine_output(&engine);
            if options.compute_on_success {
                Some(run_reference(area, &paths).await?)
            } else {
                None
            }
        }
        EngineOutcome::NotFound => {
            log_info(engine.outcome.notice());
            Some(run_reference(area, &paths).await?)
        }
        EngineOutcome::Failed | EngineOutcome::TimedOut => {
            log_warning(engine.outcome.notice());
            log_engine_output(&engine);
            Some(run_reference(area, &paths).await?)
        }
    };

    Ok(PipelineResult {
        engine,
        series,
        paths,
    })
}

/// Parse the staged input and apply the reference transform.
async fn run_reference(
    area: &StagingArea,
    paths: &StagedPaths,
) -> Result<SeriesPair, PipelineError> {
    let staged = area.read_input(paths).await?;
    let input = parse_flat(&staged)?;
    let pair = SeriesPair::from_input(input);
    log_success(format!("Reference engine transformed {} values", pair.len()));
    Ok(pair)
}

fn log_engine_output(run: &EngineRun) {
    if let Some(code) = run.exit_code {
        log_info_indent(format!("exit code: {}", code), 1);
    }
    for line in run.stdout.lines().take(5) {
        log_info_indent(format!("stdout: {}", line), 1);
    }
    for line in run.stderr.lines().take(5) {
        log_info_indent(format!("stderr: {}", line), 1);
    }
}
