//! Error types for breakwater-core

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SandboxError {
    #[error("failed to launch child process: {0}")]
    Launch(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("internal error: {0}")]
    Internal(String),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("nix error: {0}")]
    Nix(#[from] nix::Error),
}
