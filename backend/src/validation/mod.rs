//! Filename validation for staging files.
//!
//! Every name the staging area turns into a filesystem path goes through
//! [`validate_filename`] first. The rules:
//!
//! - `..`, `/` and `\` are rejected as path traversal
//! - any other character outside `[A-Za-z0-9_.-]` is rejected as invalid
//! - the empty name is invalid
//!
//! # Example
//!
//! ```rust
//! use hpcparse::validation::{validate_filename, is_valid_filename};
//! use hpcparse::error::NameError;
//!
//! assert_eq!(validate_filename("input_data.txt"), Ok("input_data.txt"));
//! assert!(matches!(validate_filename("../secret"), Err(NameError::PathTraversal(_))));
//! assert!(!is_valid_filename("bad name.txt"));
//! ```

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::NameError;

/// Names made only of ASCII letters, digits, `_`, `-` and `.`.
static SAFE_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-zA-Z0-9_\-.]+$").expect("static filename pattern compiles")
});

/// Validate a file name before it is joined onto a directory.
///
/// Returns the name unchanged when it is safe.
///
/// # Errors
/// * [`NameError::PathTraversal`] if the name contains `..`, `/` or `\`
/// * [`NameError::InvalidName`] if it contains any other character outside
///   `[A-Za-z0-9_.-]`, or is empty
pub fn validate_filename(name: &str) -> Result<&str, NameError> {
    if name.contains("..") || name.contains('/') || name.contains('\\') {
        return Err(NameError::PathTraversal(name.to_string()));
    }
    if !SAFE_NAME.is_match(name) {
        return Err(NameError::InvalidName(name.to_string()));
    }
    Ok(name)
}

/// Quick check: true when [`validate_filename`] accepts the name.
pub fn is_valid_filename(name: &str) -> bool {
    validate_filename(name).is_ok()
}
