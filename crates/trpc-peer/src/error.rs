use std::time::Duration;

use trpc_codec::{AddressError, CodecError};
use trpc_service::{ContextError, DispatchError};
use trpc_transport::TransportError;

/// Errors raised by the connection server.
#[derive(Debug, thiserror::Error)]
pub enum ServerError {
    /// Transport-level error (bind, accept, socket I/O).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Read/write/decode failure on a connection.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// Dispatch failure; fatal to the connection it happened on.
    #[error("dispatch error: {0}")]
    Dispatch(#[from] DispatchError),

    /// `serve` was called with an empty registry.
    #[error("no services registered")]
    NoServices,

    /// The serve thread panicked.
    #[error("server thread panicked")]
    Panicked,
}

/// Errors returned by [`Client`](crate::Client) operations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// Malformed method address. A caller bug: fix the address string.
    #[error("invalid method address: {0}")]
    InvalidAddress(#[from] AddressError),

    /// The request value serialized to `null`.
    #[error("empty request")]
    EmptyRequest,

    /// Connect or socket-level failure.
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Encode/decode/framing failure.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// The server closed the connection instead of replying.
    ///
    /// This is how dispatch failures (unknown service or method, bad
    /// arguments, handler errors) reach the client: the server drops the
    /// connection without writing a reply.
    #[error("connection closed by server")]
    ConnectionClosed,

    /// The call's deadline passed.
    #[error("call timed out after {0:?}")]
    Timeout(Duration),

    /// The call's context was cancelled.
    #[error("call cancelled")]
    Cancelled,

    /// An earlier call failed after its request was written, so the stream
    /// may hold a stale reply. Reconnect.
    #[error("connection is out of sync after a failed call; reconnect")]
    Poisoned,
}

impl ClientError {
    /// True for errors caused by the caller's code rather than the peer or network.
    pub fn is_programmer_error(&self) -> bool {
        match self {
            ClientError::InvalidAddress(_) => true,
            ClientError::Codec(err) => err.is_programmer_error(),
            _ => false,
        }
    }

    pub(crate) fn from_context(err: ContextError, budget: Duration) -> Self {
        match err {
            ContextError::Cancelled => ClientError::Cancelled,
            ContextError::DeadlineExceeded => ClientError::Timeout(budget),
        }
    }
}

pub type Result<T> = std::result::Result<T, ServerError>;
