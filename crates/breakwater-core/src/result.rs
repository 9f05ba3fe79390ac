//! Execution result types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Outcome of one sandboxed execution.
///
/// Child-internal failures (syntax errors, uncaught exceptions, denied
/// imports, resource-limit deaths) all arrive here as stderr text plus a
/// non-zero exit code; they are data, not errors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionResult {
    /// Exit code of the child, or `128 + signal` when killed by a signal
    pub exit_code: i32,

    /// Captured standard output, capped at the output ceiling
    pub stdout: Vec<u8>,

    /// Captured standard error, capped at the output ceiling
    pub stderr: Vec<u8>,

    /// Wall-clock execution duration
    pub duration: Duration,

    /// Whether the child was killed on wall-clock timeout
    pub timed_out: bool,

    /// Whether either capture buffer hit the output ceiling
    pub truncated: bool,
}

impl ExecutionResult {
    /// Get stdout as UTF-8 string, lossy conversion
    #[must_use]
    pub fn stdout_str(&self) -> String {
        String::from_utf8_lossy(&self.stdout).into_owned()
    }

    /// Get stderr as UTF-8 string, lossy conversion
    #[must_use]
    pub fn stderr_str(&self) -> String {
        String::from_utf8_lossy(&self.stderr).into_owned()
    }

    /// Check if execution was successful (exit code 0, no timeout)
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.exit_code == 0 && !self.timed_out
    }
}

impl Default for ExecutionResult {
    fn default() -> Self {
        Self {
            exit_code: -1,
            stdout: Vec::new(),
            stderr: Vec::new(),
            duration: Duration::ZERO,
            timed_out: false,
            truncated: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn success_requires_zero_exit_and_no_timeout() {
        let mut result = ExecutionResult {
            exit_code: 0,
            ..ExecutionResult::default()
        };
        assert!(result.is_success());

        result.timed_out = true;
        assert!(!result.is_success());

        result.timed_out = false;
        result.exit_code = 1;
        assert!(!result.is_success());
    }

    #[test]
    fn string_accessors_are_lossy() {
        let result = ExecutionResult {
            exit_code: 0,
            stdout: vec![0x68, 0x69, 0xff],
            ..ExecutionResult::default()
        };
        assert!(result.stdout_str().starts_with("hi"));
    }
}
