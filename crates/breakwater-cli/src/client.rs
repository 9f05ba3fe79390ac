//! Daemon socket client

use breakwater_core::protocol::{self, MAX_FRAME_BYTES, Request, Response};
use std::path::Path;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::UnixStream;

/// Send one request to the daemon and wait for its response.
pub async fn call(
    socket: &Path,
    request: &Request,
) -> Result<Response, Box<dyn std::error::Error>> {
    let mut stream = UnixStream::connect(socket).await?;

    let payload = protocol::encode(request)?;
    let len_bytes = (payload.len() as u32).to_be_bytes();
    stream.write_all(&len_bytes).await?;
    stream.write_all(&payload).await?;

    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf).await?;
    let len = u32::from_be_bytes(len_buf) as usize;
    if len > MAX_FRAME_BYTES {
        return Err(format!("response too large: {len} bytes").into());
    }

    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf).await?;

    Ok(protocol::decode(&buf)?)
}
