//! Unix socket server

use crate::stats::DaemonStats;
use breakwater_core::Sandbox;
use breakwater_core::protocol::{
    self, ExecuteRequest, ExecuteResponse, MAX_FRAME_BYTES, Request, Response,
};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{UnixListener, UnixStream},
};

/// Run the daemon server
pub async fn run(
    listener: UnixListener,
    sandbox: Sandbox,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let sandbox = Arc::new(sandbox);
    let stats = Arc::new(DaemonStats::default());

    loop {
        let (stream, _) = listener.accept().await?;
        let sandbox = Arc::clone(&sandbox);
        let stats = Arc::clone(&stats);

        tokio::spawn(async move {
            if let Err(e) = handle_connection(stream, sandbox, stats).await {
                tracing::error!(error = %e, "connection error");
            }
        });
    }
}

/// Handle a single client connection
async fn handle_connection(
    mut stream: UnixStream,
    sandbox: Arc<Sandbox>,
    stats: Arc<DaemonStats>,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let mut buf = vec![0u8; 64 * 1024]; // 64KB buffer

    loop {
        // Read length prefix (4 bytes, big-endian)
        let mut len_buf = [0u8; 4];
        if stream.read_exact(&mut len_buf).await.is_err() {
            break; // Client disconnected
        }
        let len = u32::from_be_bytes(len_buf) as usize;

        if len > MAX_FRAME_BYTES {
            let response = Response::Error {
                message: format!("frame too large: {len} bytes"),
            };
            write_frame(&mut stream, &response).await?;
            break;
        }
        if len > buf.len() {
            buf.resize(len, 0);
        }

        // Read message
        stream.read_exact(&mut buf[..len]).await?;

        // Decode request
        let request: Request = match protocol::decode(&buf[..len]) {
            Ok(request) => request,
            Err(e) => {
                let response = Response::Error {
                    message: format!("malformed request: {e}"),
                };
                write_frame(&mut stream, &response).await?;
                break;
            }
        };
        tracing::debug!(?request, "received request");

        // Handle request
        let response = handle_request(request, &sandbox, &stats).await;

        write_frame(&mut stream, &response).await?;
    }

    Ok(())
}

async fn write_frame<T: Serialize>(
    stream: &mut UnixStream,
    msg: &T,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let payload = protocol::encode(msg)?;
    let len_bytes = (payload.len() as u32).to_be_bytes();
    stream.write_all(&len_bytes).await?;
    stream.write_all(&payload).await?;
    Ok(())
}

/// Handle a single request
async fn handle_request(request: Request, sandbox: &Sandbox, stats: &DaemonStats) -> Response {
    match request {
        Request::Execute(req) => Response::Execute(handle_execute(req, sandbox, stats).await),
        Request::Status => {
            let (started, completed, timed_out) = stats.snapshot();
            Response::Status {
                started,
                completed,
                timed_out,
            }
        }
        Request::Ping => Response::Pong,
    }
}

async fn handle_execute(
    req: ExecuteRequest,
    sandbox: &Sandbox,
    stats: &DaemonStats,
) -> ExecuteResponse {
    if let Err(message) = validate(&req) {
        return ExecuteResponse {
            success: false,
            result: None,
            error: Some(message),
        };
    }

    let timeout = req.timeout_secs.map(Duration::from_secs);
    stats.record_start();

    match sandbox.execute(&req.code, timeout).await {
        Ok(result) => {
            stats.record_completion(result.timed_out);
            ExecuteResponse {
                success: true,
                result: Some(result),
                error: None,
            }
        }
        Err(e) => {
            stats.record_completion(false);
            tracing::error!(error = %e, "execution failed");
            ExecuteResponse {
                success: false,
                result: None,
                error: Some(e.to_string()),
            }
        }
    }
}

/// Reject invalid requests before anything is spawned.
fn validate(req: &ExecuteRequest) -> Result<(), String> {
    if req.code.trim().is_empty() {
        return Err("code must not be empty".into());
    }
    if req.timeout_secs == Some(0) {
        return Err("timeout must be greater than zero".into());
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_code_is_rejected() {
        let req = ExecuteRequest {
            code: String::new(),
            timeout_secs: None,
        };
        assert!(validate(&req).is_err());
    }

    #[test]
    fn whitespace_only_code_is_rejected() {
        let req = ExecuteRequest {
            code: "   \n\t".into(),
            timeout_secs: None,
        };
        assert!(validate(&req).is_err());
    }

    #[test]
    fn zero_timeout_is_rejected() {
        let req = ExecuteRequest {
            code: "print(1)".into(),
            timeout_secs: Some(0),
        };
        assert!(validate(&req).is_err());
    }

    #[test]
    fn valid_request_passes() {
        let req = ExecuteRequest {
            code: "print(1)".into(),
            timeout_secs: Some(5),
        };
        assert!(validate(&req).is_ok());
    }
}
