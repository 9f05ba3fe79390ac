//! Daemon configuration

use breakwater_core::SandboxConfig;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Configuration for the daemon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DaemonConfig {
    /// Path to Unix socket
    pub socket_path: PathBuf,

    /// Sandbox configuration shared by every request
    pub sandbox: SandboxConfig,
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            socket_path: breakwater_core::config::default_socket_path(),
            sandbox: SandboxConfig::default(),
        }
    }
}
