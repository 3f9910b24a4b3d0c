//! External engine adapter.
//!
//! Delegates the transform to a native executable living next to the working
//! directory (`hpc_parser` or `hpc_parser.exe`). The contract is narrow:
//!
//! ```text
//! <binary> <absolute-input-path> <absolute-output-path>
//! ```
//!
//! Exit code 0 means success. Both paths are passed as discrete arguments,
//! never through a shell. Stdout and stderr are captured for diagnostics only.
//! A single attempt is made per run; a hard wall-clock timeout kills the child.

use serde::Serialize;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;

/// Executable name of the native engine on this platform.
#[cfg(windows)]
pub const ENGINE_BINARY: &str = "hpc_parser.exe";

/// Executable name of the native engine on this platform.
#[cfg(not(windows))]
pub const ENGINE_BINARY: &str = "hpc_parser";

/// Default wall-clock limit for one engine run.
pub const DEFAULT_ENGINE_TIMEOUT: Duration = Duration::from_secs(30);

/// How the transform of a run was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum EngineOutcome {
    /// The executable exited with status 0 within the timeout.
    Succeeded,
    /// No executable at the expected location; nothing was spawned.
    NotFound,
    /// Spawn error or non-zero exit.
    Failed,
    /// The timeout expired and the child was killed.
    TimedOut,
}

impl EngineOutcome {
    /// True for the one outcome that does not need the reference fallback.
    pub fn is_success(self) -> bool {
        matches!(self, EngineOutcome::Succeeded)
    }

    /// Short label for logs and API responses.
    pub fn label(self) -> &'static str {
        match self {
            EngineOutcome::Succeeded => "succeeded",
            EngineOutcome::NotFound => "notFound",
            EngineOutcome::Failed => "failed",
            EngineOutcome::TimedOut => "timedOut",
        }
    }

    /// User-facing notice for this outcome.
    pub fn notice(self) -> &'static str {
        match self {
            EngineOutcome::Succeeded => "Native engine executed successfully",
            EngineOutcome::NotFound => "Using reference implementation",
            EngineOutcome::Failed => "Native engine failed, using reference fallback",
            EngineOutcome::TimedOut => "Native engine timed out, using reference fallback",
        }
    }
}

impl std::fmt::Display for EngineOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Outcome of one engine attempt plus its diagnostics.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct EngineRun {
    pub outcome: EngineOutcome,
    /// Exit code, when the child exited on its own
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
    /// Wall time from spawn to exit or kill
    #[serde(rename = "elapsedMs", serialize_with = "serialize_millis")]
    pub elapsed: Duration,
}

fn serialize_millis<S: serde::Serializer>(d: &Duration, s: S) -> Result<S::Ok, S::Error> {
    s.serialize_u64(d.as_millis().try_into().unwrap_or(u64::MAX))
}

impl EngineRun {
    fn bare(outcome: EngineOutcome, elapsed: Duration) -> Self {
        Self {
            outcome,
            exit_code: None,
            stdout: String::new(),
            stderr: String::new(),
            elapsed,
        }
    }

    /// No executable was found; nothing ran.
    pub fn not_found() -> Self {
        Self::bare(EngineOutcome::NotFound, Duration::ZERO)
    }
}

/// Native engine located in a directory, with a timeout.
#[derive(Debug, Clone)]
pub struct ExternalEngine {
    binary: PathBuf,
    timeout: Duration,
}

impl ExternalEngine {
    /// Engine expected at `<dir>/hpc_parser[.exe]`.
    pub fn in_dir(dir: impl AsRef<Path>) -> Self {
        Self::with_binary(dir.as_ref().join(ENGINE_BINARY))
    }

    /// Engine at an explicit executable path.
    pub fn with_binary(binary: impl Into<PathBuf>) -> Self {
        Self {
            binary: binary.into(),
            timeout: DEFAULT_ENGINE_TIMEOUT,
        }
    }

    /// Set the wall-clock timeout
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn binary(&self) -> &Path {
        &self.binary
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// True when something exists at the expected location. Whether it can
    /// actually run is only known once it is spawned.
    pub fn is_available(&self) -> bool {
        self.binary.exists()
    }

    /// Run the engine once on `input`, asking it to write `output`.
    ///
    /// Both paths must already be absolute. Never returns an error: every
    /// failure mode is folded into [`EngineOutcome`].
    pub async fn try_run(&self, input: &Path, output: &Path) -> EngineRun {
        if !self.is_available() {
            return EngineRun::not_found();
        }

        let mut command = Command::new(&self.binary);
        command
            .arg(input)
            .arg(output)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let started = Instant::now();
        let child = match command.spawn() {
            Ok(child) => child,
            Err(e) => {
                let mut run = EngineRun::bare(EngineOutcome::Failed, started.elapsed());
                run.stderr = format!("Failed to spawn {}: {}", self.binary.display(), e);
                return run;
            }
        };

        // Dropping the wait future on expiry drops the child, which kills it;
        // tokio reaps killed children in the background.
        match tokio::time::timeout(self.timeout, child.wait_with_output()).await {
            Err(_) => EngineRun::bare(EngineOutcome::TimedOut, started.elapsed()),
            Ok(Err(e)) => {
                let mut run = EngineRun::bare(EngineOutcome::Failed, started.elapsed());
                run.stderr = format!("Failed to wait for {}: {}", self.binary.display(), e);
                run
            }
            Ok(Ok(output)) => EngineRun {
                outcome: if output.status.success() {
                    EngineOutcome::Succeeded
                } else {
                    EngineOutcome::Failed
                },
                exit_code: output.status.code(),
                stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
                stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
                elapsed: started.elapsed(),
            },
        }
    }
}

impl Default for ExternalEngine {
    fn default() -> Self {
        Self::in_dir(".")
    }
}
