//! Transport executors and request assembly for both wire transports.

pub mod grpc;
pub mod rest;

use crate::auth::AuthError;

/// Environmental failures captured into the response envelope. Never
/// propagated as a raised error; `to_string()` becomes `envelope.msg`.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// Non-2xx HTTP response, rendered as `{status}:{reason}`.
    #[error("{status}:{reason}")]
    HttpStatus { status: u16, reason: String },

    /// Connection/timeout/protocol failure below the status line.
    #[error("{0}")]
    Network(String),

    /// RPC fault, carrying the status description.
    #[error("{0}")]
    Rpc(String),

    /// The deployment answered with a body the codec cannot read.
    #[error("Failed to decode response: {0}")]
    Decode(String),

    #[error("{0}")]
    Auth(#[from] AuthError),
}
