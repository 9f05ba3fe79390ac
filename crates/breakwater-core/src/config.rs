//! Sandbox configuration

use crate::guard::DenyList;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Hard per-process ceilings applied in the child before exec.
///
/// These are process-wide constants, not request parameters: every child
/// spawned by one sandbox runs under the same ceilings. The kernel enforces
/// them against the child itself; the supervisor never polls them.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ResourceLimits {
    /// Address-space cap in bytes (`RLIMIT_AS`)
    pub max_address_space: u64,

    /// CPU-time cap in seconds (`RLIMIT_CPU`)
    pub max_cpu_seconds: u64,

    /// Output cap in bytes (`RLIMIT_FSIZE`, and the capture-buffer bound)
    pub max_output_bytes: u64,
}

impl Default for ResourceLimits {
    fn default() -> Self {
        Self {
            max_address_space: 512 * 1024 * 1024, // 512MB
            max_cpu_seconds: 5,
            max_output_bytes: 1024 * 1024, // 1MB
        }
    }
}

/// Configuration for a sandbox instance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxConfig {
    /// Path to the Python interpreter
    pub python_path: PathBuf,

    /// Directory transient script artifacts are written under
    pub scratch_dir: PathBuf,

    /// Hard resource ceilings for every child
    pub limits: ResourceLimits,

    /// Module names the capability guard rejects
    pub deny: DenyList,

    /// Wall-clock budget used when the request does not carry one
    pub default_timeout: Duration,

    /// Environment the child receives. The inherited environment is
    /// discarded entirely, so interpreter-influencing variables
    /// (PYTHONPATH, PYTHONSTARTUP, PYTHONHOME, LD_PRELOAD) cannot leak in.
    pub env: Vec<(String, String)>,
}

impl Default for SandboxConfig {
    fn default() -> Self {
        Self {
            python_path: PathBuf::from("/usr/bin/python3"),
            scratch_dir: std::env::temp_dir(),
            limits: ResourceLimits::default(),
            deny: DenyList::default(),
            default_timeout: Duration::from_secs(5),
            env: vec![
                ("PATH".into(), "/usr/bin:/bin".into()),
                ("HOME".into(), "/tmp".into()),
                ("TMPDIR".into(), "/tmp".into()),
                ("LANG".into(), "C.UTF-8".into()),
                ("LC_ALL".into(), "C.UTF-8".into()),
            ],
        }
    }
}

impl SandboxConfig {
    /// Create a new config builder
    #[must_use]
    pub fn builder() -> SandboxConfigBuilder {
        SandboxConfigBuilder::default()
    }
}

/// Builder for `SandboxConfig`
#[derive(Debug, Default)]
pub struct SandboxConfigBuilder {
    config: SandboxConfig,
}

impl SandboxConfigBuilder {
    #[must_use]
    pub fn python_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.python_path = path.into();
        self
    }

    #[must_use]
    pub fn scratch_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.config.scratch_dir = path.into();
        self
    }

    #[must_use]
    pub fn max_address_space(mut self, bytes: u64) -> Self {
        self.config.limits.max_address_space = bytes;
        self
    }

    #[must_use]
    pub fn max_address_space_mb(self, mb: u64) -> Self {
        self.max_address_space(mb * 1024 * 1024)
    }

    #[must_use]
    pub fn max_cpu_seconds(mut self, secs: u64) -> Self {
        self.config.limits.max_cpu_seconds = secs;
        self
    }

    #[must_use]
    pub fn max_output_bytes(mut self, bytes: u64) -> Self {
        self.config.limits.max_output_bytes = bytes;
        self
    }

    #[must_use]
    pub fn deny_list(mut self, deny: DenyList) -> Self {
        self.config.deny = deny;
        self
    }

    #[must_use]
    pub fn default_timeout(mut self, duration: Duration) -> Self {
        self.config.default_timeout = duration;
        self
    }

    #[must_use]
    pub fn default_timeout_secs(self, secs: u64) -> Self {
        self.default_timeout(Duration::from_secs(secs))
    }

    #[must_use]
    pub fn env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.config.env.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn build(self) -> SandboxConfig {
        self.config
    }
}

/// Get default socket path from `BREAKWATER_SOCKET` env var or system default
///
/// Returns:
/// - `$BREAKWATER_SOCKET` if set (for development)
/// - `/run/breakwater/breakwater.sock` otherwise (production)
pub fn default_socket_path() -> PathBuf {
    std::env::var("BREAKWATER_SOCKET")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("/run/breakwater/breakwater.sock"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_limits_match_service_constants() {
        let limits = ResourceLimits::default();
        assert_eq!(limits.max_address_space, 512 * 1024 * 1024);
        assert_eq!(limits.max_cpu_seconds, 5);
        assert_eq!(limits.max_output_bytes, 1024 * 1024);
    }

    #[test]
    fn builder_overrides_fields() {
        let config = SandboxConfig::builder()
            .python_path("/opt/python/bin/python3")
            .max_address_space_mb(64)
            .max_cpu_seconds(2)
            .max_output_bytes(4096)
            .default_timeout_secs(1)
            .build();

        assert_eq!(config.python_path.to_str(), Some("/opt/python/bin/python3"));
        assert_eq!(config.limits.max_address_space, 64 * 1024 * 1024);
        assert_eq!(config.limits.max_cpu_seconds, 2);
        assert_eq!(config.limits.max_output_bytes, 4096);
        assert_eq!(config.default_timeout, Duration::from_secs(1));
    }

    #[test]
    fn child_env_carries_no_interpreter_overrides() {
        let config = SandboxConfig::default();
        assert!(config
            .env
            .iter()
            .all(|(key, _)| !key.starts_with("PYTHON") && !key.starts_with("LD_")));
    }
}
