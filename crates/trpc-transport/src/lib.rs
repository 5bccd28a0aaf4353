//! Stream transport for trpc.
//!
//! Wraps a single stream-oriented connection type behind one interface:
//! - [`TcpTransport`] binds a listener and accepts inbound connections
//! - [`RpcStream`] is a connected byte stream (`Read + Write`)
//!
//! This is the lowest layer of trpc. Framing, envelopes and dispatch all
//! build on the [`RpcStream`] type provided here.

pub mod error;
pub mod network;
pub mod stream;
pub mod tcp;

pub use error::{Result, TransportError};
pub use network::Network;
pub use stream::RpcStream;
pub use tcp::TcpTransport;
