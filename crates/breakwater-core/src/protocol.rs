//! Wire protocol for daemon communication
//!
//! MessagePack messages over a Unix socket, each frame preceded by a
//! 4-byte big-endian length prefix.

use crate::ExecutionResult;
use serde::{Deserialize, Serialize};

/// Largest frame either side will accept.
pub const MAX_FRAME_BYTES: usize = 4 * 1024 * 1024;

/// Request to execute a snippet
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteRequest {
    /// Python source to execute
    pub code: String,
    /// Optional wall-clock budget override in seconds
    pub timeout_secs: Option<u64>,
}

/// Response from execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecuteResponse {
    /// Whether the supervisor itself succeeded. A snippet that failed or
    /// timed out still reports `success: true`; inspect the result.
    pub success: bool,
    /// Execution result (if success)
    pub result: Option<ExecutionResult>,
    /// Error message (if !success)
    pub error: Option<String>,
}

/// Request types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Request {
    /// Execute a snippet
    Execute(ExecuteRequest),
    /// Get daemon execution counters
    Status,
    /// Ping
    Ping,
}

/// Response types
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Response {
    /// Execution result
    Execute(ExecuteResponse),
    /// Daemon execution counters
    Status {
        started: u64,
        completed: u64,
        timed_out: u64,
    },
    /// Pong
    Pong,
    /// Protocol-level error
    Error { message: String },
}

/// Encode a message to msgpack
pub fn encode<T: Serialize>(msg: &T) -> Result<Vec<u8>, rmp_serde::encode::Error> {
    rmp_serde::to_vec(msg)
}

/// Decode a message from msgpack
pub fn decode<'a, T: Deserialize<'a>>(data: &'a [u8]) -> Result<T, rmp_serde::decode::Error> {
    rmp_serde::from_slice(data)
}
