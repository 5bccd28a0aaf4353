//! Connection server and client invoker for trpc.
//!
//! This is the "just works" layer. Bind a [`Server`], register services,
//! serve; dial a [`Client`] and invoke `"<service>.<method>"` addresses
//! with typed requests and replies.
//!
//! Each accepted connection gets its own thread running a strict
//! read → dispatch → write loop. A connection carries any number of
//! sequential calls but never more than one in flight.

pub mod client;
pub mod config;
mod connection;
pub mod error;
pub mod server;

pub use client::Client;
pub use config::{ClientConfig, ServerConfig};
pub use error::{ClientError, Result, ServerError};
pub use server::{RunningServer, Server, ServerHandle};
