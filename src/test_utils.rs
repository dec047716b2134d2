//! Test utilities for famchat
//!
//! This module provides common test utilities including temporary
//! config files and assertion helpers.

use crate::error::FamchatError;
use std::path::PathBuf;
use tempfile::TempDir;

/// Create a temporary directory for testing
///
/// # Returns
///
/// Returns a TempDir that will be cleaned up when dropped
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temporary directory")
}

/// Write a YAML config file into a temporary directory
///
/// # Arguments
///
/// * `dir` - Directory to create the file in
/// * `contents` - YAML to write
///
/// # Returns
///
/// Returns the path to the created file
///
/// # Panics
///
/// Panics if file creation or writing fails
pub fn write_config(dir: &TempDir, contents: &str) -> PathBuf {
    let path = dir.path().join("config.yaml");
    std::fs::write(&path, contents).expect("Failed to write config file");
    path
}

/// Assert that an error contains the expected message
///
/// # Arguments
///
/// * `result` - Result to check
/// * `expected` - Expected error message substring
///
/// # Panics
///
/// Panics if the result is Ok or if the error doesn't contain the expected message
pub fn assert_error_contains<T>(result: Result<T, FamchatError>, expected: &str) {
    match result {
        Ok(_) => panic!("Expected error containing '{}', got Ok", expected),
        Err(e) => {
            let message = e.to_string();
            assert!(
                message.contains(expected),
                "Expected error containing '{}', got '{}'",
                expected,
                message
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_config_creates_file() {
        let dir = temp_dir();
        let path = write_config(&dir, "backend:\n  type: hosted\n");
        assert!(path.exists());
    }

    #[test]
    fn test_assert_error_contains_matches() {
        let result: Result<(), FamchatError> = Err(FamchatError::Config("bad host".to_string()));
        assert_error_contains(result, "bad host");
    }

    #[test]
    #[should_panic(expected = "Expected error")]
    fn test_assert_error_contains_panics_on_ok() {
        let result: Result<(), FamchatError> = Ok(());
        assert_error_contains(result, "anything");
    }
}
