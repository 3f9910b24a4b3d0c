//! Application configuration.
//!
//! Read from the environment (and an optional `.env` file). Every key has a
//! default, so an empty environment gives the single-user demo setup:
//! staging in `./data`, the native engine looked up in the working
//! directory, a 30 second engine timeout.

use std::env;
use std::path::PathBuf;
use std::time::Duration;

use crate::error::ConfigError;
use crate::staging::StagingMode;
use crate::transform::engine::{ExternalEngine, DEFAULT_ENGINE_TIMEOUT};
use crate::transform::pipeline::PipelineOptions;

/// Staging directory.
pub const ENV_DATA_DIR: &str = "HPCPARSE_DATA_DIR";

/// Directory holding the native engine executable.
pub const ENV_ENGINE_DIR: &str = "HPCPARSE_ENGINE_DIR";

/// Engine timeout, in whole seconds.
pub const ENV_ENGINE_TIMEOUT_SECS: &str = "HPCPARSE_ENGINE_TIMEOUT_SECS";

/// HTTP port.
pub const ENV_PORT: &str = "HPCPARSE_PORT";

/// Whether a successful engine run still computes the reference series.
pub const ENV_COMPUTE_ON_SUCCESS: &str = "HPCPARSE_COMPUTE_ON_SUCCESS";

pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_ENGINE_DIR: &str = ".";
pub const DEFAULT_PORT: u16 = 3000;

/// Default sensor data shown to new users.
pub const SAMPLE_INPUT: &str = "1.2 3.4 5.6 7.8\n9.0 1.2 3.4 5.6\n7.8 9.0 1.2 3.4\n5.6 7.8 9.0 1.2\n1.1 2.2 3.3 4.4";

/// Maximum upload size accepted by the server (in bytes).
///
/// 10 MB limit.
pub const MAX_UPLOAD_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    pub data_dir: PathBuf,
    pub engine_dir: PathBuf,
    pub engine_timeout: Duration,
    pub port: u16,
    pub compute_on_success: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            engine_dir: PathBuf::from(DEFAULT_ENGINE_DIR),
            engine_timeout: DEFAULT_ENGINE_TIMEOUT,
            port: DEFAULT_PORT,
            compute_on_success: true,
        }
    }
}

impl Config {
    /// Load from the process environment, after reading `.env` if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load using an arbitrary key lookup. Unset keys take their default.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(dir) = lookup(ENV_DATA_DIR) {
            config.data_dir = PathBuf::from(dir);
        }
        if let Some(dir) = lookup(ENV_ENGINE_DIR) {
            config.engine_dir = PathBuf::from(dir);
        }
        if let Some(raw) = lookup(ENV_ENGINE_TIMEOUT_SECS) {
            let secs: u64 = parse_value(ENV_ENGINE_TIMEOUT_SECS, &raw)?;
            if secs == 0 {
                return Err(invalid(ENV_ENGINE_TIMEOUT_SECS, &raw));
            }
            config.engine_timeout = Duration::from_secs(secs);
        }
        if let Some(raw) = lookup(ENV_PORT) {
            config.port = parse_value(ENV_PORT, &raw)?;
        }
        if let Some(raw) = lookup(ENV_COMPUTE_ON_SUCCESS) {
            config.compute_on_success = parse_flag(ENV_COMPUTE_ON_SUCCESS, &raw)?;
        }

        Ok(config)
    }

    /// The native engine this configuration points at.
    pub fn engine(&self) -> ExternalEngine {
        ExternalEngine::in_dir(&self.engine_dir).with_timeout(self.engine_timeout)
    }

    /// Pipeline options for the given staging mode.
    pub fn pipeline_options(&self, staging: StagingMode) -> PipelineOptions {
        PipelineOptions {
            data_dir: self.data_dir.clone(),
            engine: self.engine(),
            staging,
            compute_on_success: self.compute_on_success,
        }
    }
}

fn invalid(key: &str, value: &str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
    }
}

fn parse_value<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, ConfigError> {
    raw.trim().parse().map_err(|_| invalid(key, raw))
}

fn parse_flag(key: &str, raw: &str) -> Result<bool, ConfigError> {
    match raw.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(invalid(key, raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, Config::default());
        assert_eq!(config.engine_timeout, Duration::from_secs(30));
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert!(config.compute_on_success);
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            (ENV_DATA_DIR, "/tmp/stage"),
            (ENV_ENGINE_DIR, "/opt/bin"),
            (ENV_ENGINE_TIMEOUT_SECS, " 5 "),
            (ENV_PORT, "8080"),
            (ENV_COMPUTE_ON_SUCCESS, "off"),
        ]))
        .unwrap();

        assert_eq!(config.data_dir, PathBuf::from("/tmp/stage"));
        assert_eq!(config.engine_timeout, Duration::from_secs(5));
        assert_eq!(config.port, 8080);
        assert!(!config.compute_on_success);
        assert_eq!(config.engine().binary().parent(), Some(std::path::Path::new("/opt/bin")));
    }

    #[test]
    fn test_invalid_values() {
        for (key, value) in [
            (ENV_ENGINE_TIMEOUT_SECS, "soon"),
            (ENV_ENGINE_TIMEOUT_SECS, "0"),
            (ENV_PORT, "70000"),
            (ENV_COMPUTE_ON_SUCCESS, "maybe"),
        ] {
            let err = Config::from_lookup(lookup(&[(key, value)])).unwrap_err();
            assert_eq!(
                err,
                ConfigError::InvalidValue {
                    key: key.to_string(),
                    value: value.to_string()
                }
            );
        }
    }

    #[test]
    fn test_sample_input_parses() {
        let values = crate::parser::parse_flat(SAMPLE_INPUT).unwrap();
        assert_eq!(values.len(), 20);
    }
}
