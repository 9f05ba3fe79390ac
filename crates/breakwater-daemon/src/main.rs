//! breakwater-daemon - resource-bounded snippet execution service
//!
//! One child process per request: the daemon accepts Python snippets over
//! a Unix socket, runs each under hard rlimits with a wall-clock kill, and
//! returns the captured output.

use anyhow::Result;
use tokio::net::UnixListener;
use tracing_subscriber::EnvFilter;

mod config;
mod server;
mod stats;

use config::DaemonConfig;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("breakwater=info".parse()?))
        .init();

    tracing::info!("breakwater-daemon starting");

    // Load config
    let config = DaemonConfig::default();
    tracing::info!(
        socket = ?config.socket_path,
        python = ?config.sandbox.python_path,
        "configuration loaded"
    );

    // Create socket directory if needed
    if let Some(parent) = config.socket_path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    // Remove existing socket
    let _ = std::fs::remove_file(&config.socket_path);

    // Bind socket
    let listener = UnixListener::bind(&config.socket_path)?;
    tracing::info!(socket = ?config.socket_path, "listening");

    let sandbox = breakwater_core::Sandbox::new(config.sandbox.clone());

    // Run server
    server::run(listener, sandbox)
        .await
        .map_err(|e| anyhow::anyhow!("{e}"))?;

    Ok(())
}
