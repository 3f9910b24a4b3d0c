//! Native engine adapter and pipeline tests against real child processes.
//!
//! Shell scripts stand in for the native executable. Spawning is serialized
//! so no script is executed while another test still holds it open for
//! writing (ETXTBSY).
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use hpcparse::{
    run_pipeline, EngineOutcome, ExternalEngine, PipelineError, PipelineOptions, StagingMode,
};
use tempfile::{tempdir, TempDir};
use tokio::sync::Mutex;

static SPAWN_LOCK: Mutex<()> = Mutex::const_new(());

/// Write an executable `hpc_parser` script into `dir`.
fn install_engine(dir: &Path, body: &str) -> PathBuf {
    std::fs::create_dir_all(dir).unwrap();
    let path = dir.join("hpc_parser");
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn options(root: &TempDir, timeout: Duration) -> PipelineOptions {
    PipelineOptions {
        data_dir: root.path().join("data"),
        engine: ExternalEngine::in_dir(root.path().join("bin")).with_timeout(timeout),
        staging: StagingMode::Fixed,
        compute_on_success: true,
    }
}

#[tokio::test]
async fn engine_exit_zero_succeeds() {
    let _guard = SPAWN_LOCK.lock().await;
    let root = tempdir().unwrap();
    install_engine(&root.path().join("bin"), "echo \"processing $1\"\nexit 0");
    let opts = options(&root, Duration::from_secs(10));

    let result = run_pipeline("2.0", &opts).await.unwrap();

    assert_eq!(result.outcome(), EngineOutcome::Succeeded);
    assert!(result.is_engine_backed());
    assert_eq!(result.engine.exit_code, Some(0));
    assert!(result.engine.stdout.contains("input_data.txt"));
    // Reference series still computed for display
    assert_eq!(result.preview(5), &[4.5]);
}

#[tokio::test]
async fn engine_success_without_local_compute_has_no_series() {
    let _guard = SPAWN_LOCK.lock().await;
    let root = tempdir().unwrap();
    install_engine(&root.path().join("bin"), "exit 0");
    let opts = PipelineOptions {
        compute_on_success: false,
        ..options(&root, Duration::from_secs(10))
    };

    let result = run_pipeline("2.0", &opts).await.unwrap();

    assert_eq!(result.outcome(), EngineOutcome::Succeeded);
    assert!(result.series.is_none());
    assert!(result.preview(5).is_empty());
}

#[tokio::test]
async fn engine_artifact_kept_with_fixed_staging() {
    let _guard = SPAWN_LOCK.lock().await;
    let root = tempdir().unwrap();
    install_engine(&root.path().join("bin"), "echo done > \"$2\"");
    let opts = PipelineOptions {
        compute_on_success: false,
        ..options(&root, Duration::from_secs(10))
    };

    let result = run_pipeline("2.0", &opts).await.unwrap();

    assert_eq!(result.engine_artifact(), Some(result.paths.output.as_path()));
}

#[tokio::test]
async fn engine_artifact_removed_with_per_request_staging() {
    let _guard = SPAWN_LOCK.lock().await;
    let root = tempdir().unwrap();
    install_engine(&root.path().join("bin"), "echo done > \"$2\"");
    let opts = PipelineOptions {
        compute_on_success: false,
        staging: StagingMode::PerRequest,
        ..options(&root, Duration::from_secs(10))
    };

    let result = run_pipeline("2.0", &opts).await.unwrap();

    assert_eq!(result.outcome(), EngineOutcome::Succeeded);
    assert!(result.series.is_none());
    assert!(!result.paths.output.exists());
    assert_eq!(result.engine_artifact(), None);
}

#[tokio::test]
async fn engine_receives_exactly_two_absolute_paths() {
    let _guard = SPAWN_LOCK.lock().await;
    let root = tempdir().unwrap();
    install_engine(
        &root.path().join("bin"),
        "echo \"$#\"\necho \"$1\"\necho \"$2\"\ncat \"$1\" > \"$2\"",
    );
    let opts = options(&root, Duration::from_secs(10));

    let result = run_pipeline("1 2\n3", &opts).await.unwrap();

    let lines: Vec<&str> = result.engine.stdout.lines().collect();
    assert_eq!(lines[0], "2");
    assert!(Path::new(lines[1]).is_absolute());
    assert!(Path::new(lines[2]).is_absolute());
    assert_eq!(Path::new(lines[1]), result.paths.input);
    assert_eq!(Path::new(lines[2]), result.paths.output);
    // The engine saw the staged input verbatim
    assert_eq!(std::fs::read_to_string(&result.paths.output).unwrap(), "1 2\n3");
}

#[tokio::test]
async fn engine_timeout_falls_back() {
    let _guard = SPAWN_LOCK.lock().await;
    let root = tempdir().unwrap();
    install_engine(&root.path().join("bin"), "exec sleep 30");
    let opts = options(&root, Duration::from_millis(300));

    let started = Instant::now();
    let result = run_pipeline("2.0", &opts).await.unwrap();

    assert_eq!(result.outcome(), EngineOutcome::TimedOut);
    assert!(started.elapsed() < Duration::from_secs(10));
    assert_eq!(result.engine.exit_code, None);
    assert_eq!(result.series.unwrap().output(), &[4.5]);
}

/// True once `pid` no longer runs: gone, or a zombie awaiting its reaper.
#[cfg(target_os = "linux")]
fn process_has_exited(pid: &str) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Err(_) => true,
        // The state follows the parenthesized command name
        Ok(stat) => stat
            .rsplit_once(") ")
            .is_some_and(|(_, rest)| rest.starts_with('Z') || rest.starts_with('X')),
    }
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn engine_timeout_kills_child() {
    let _guard = SPAWN_LOCK.lock().await;
    let root = tempdir().unwrap();
    install_engine(&root.path().join("bin"), "echo $$ > \"$2\"\nexec sleep 30");
    let opts = options(&root, Duration::from_millis(500));

    let result = run_pipeline("2.0", &opts).await.unwrap();
    assert_eq!(result.outcome(), EngineOutcome::TimedOut);

    let pid = std::fs::read_to_string(&result.paths.output).unwrap();
    let pid = pid.trim();
    assert!(!pid.is_empty());

    let deadline = Instant::now() + Duration::from_secs(5);
    while !process_has_exited(pid) {
        assert!(Instant::now() < deadline, "engine process {pid} still running");
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}

#[tokio::test]
async fn engine_nonzero_exit_falls_back() {
    let _guard = SPAWN_LOCK.lock().await;
    let root = tempdir().unwrap();
    install_engine(&root.path().join("bin"), "echo 'Unable to open file' >&2\nexit 3");
    let opts = options(&root, Duration::from_secs(10));

    let result = run_pipeline("1.2 3.4\n5.6 7.8", &opts).await.unwrap();

    assert_eq!(result.outcome(), EngineOutcome::Failed);
    assert_eq!(result.engine.exit_code, Some(3));
    assert!(result.engine.stderr.contains("Unable to open file"));
    let series = result.series.unwrap();
    assert_eq!(series.len(), 4);
    assert_eq!(series.output()[0], 1.2 * 1.2 + 0.5);
}

#[tokio::test]
async fn engine_not_executable_fails() {
    let _guard = SPAWN_LOCK.lock().await;
    let root = tempdir().unwrap();
    let bin = root.path().join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    std::fs::write(bin.join("hpc_parser"), "not a program").unwrap();
    let opts = options(&root, Duration::from_secs(10));

    let result = run_pipeline("3", &opts).await.unwrap();

    assert_eq!(result.outcome(), EngineOutcome::Failed);
    assert!(!result.engine.stderr.is_empty());
    assert_eq!(result.preview(5), &[9.5]);
}

#[tokio::test]
async fn fallback_parse_error_after_engine_failure() {
    let _guard = SPAWN_LOCK.lock().await;
    let root = tempdir().unwrap();
    install_engine(&root.path().join("bin"), "exit 1");
    let opts = options(&root, Duration::from_secs(10));

    let err = run_pipeline("1 two 3", &opts).await.unwrap_err();
    assert!(matches!(err, PipelineError::Parse(_)));
}

#[tokio::test]
async fn adapter_direct_call() {
    let _guard = SPAWN_LOCK.lock().await;
    let root = tempdir().unwrap();
    let binary = install_engine(root.path(), "exit 0");
    let engine = ExternalEngine::with_binary(&binary).with_timeout(Duration::from_secs(5));
    assert!(engine.is_available());

    let run = engine
        .try_run(&root.path().join("in.txt"), &root.path().join("out.h5"))
        .await;
    assert_eq!(run.outcome, EngineOutcome::Succeeded);
}
