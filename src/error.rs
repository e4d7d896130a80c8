//! Error taxonomy for the client.
//!
//! Two classes with different propagation rules. Programmer errors
//! (bad configuration, malformed request payloads, routing misses) are
//! returned as [`ClientError`] so the call site fails fast.
//! Environmental failures (unreachable deployment, non-2xx status, RPC
//! fault, token fetch) are never raised; they are captured into the
//! response envelope's `msg` field.

use crate::config::Transport;
use crate::payload::PayloadError;
use crate::routing::{CallTarget, Operation};

/// Fail-fast errors indicating call-site misuse.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("Invalid client configuration: {reason}")]
    Config { reason: String },

    #[error("Malformed payload: {0}")]
    Payload(#[from] PayloadError),

    #[error("Unsupported operation: {operation}")]
    UnsupportedOperation { operation: String },

    #[error("No route for transport={transport} target={target} operation={operation}")]
    UnsupportedCombination {
        transport: Transport,
        target: CallTarget,
        operation: Operation,
    },
}

pub type ClientResult<T> = Result<T, ClientError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Gateway;

    #[test]
    fn test_unsupported_combination_display() {
        let err = ClientError::UnsupportedCombination {
            transport: Transport::Grpc,
            target: CallTarget::Gateway(Gateway::Ambassador),
            operation: Operation::Explain,
        };
        assert_eq!(
            err.to_string(),
            "No route for transport=grpc target=ambassador operation=explain"
        );
    }

    #[test]
    fn test_error_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<ClientError>();
    }
}
