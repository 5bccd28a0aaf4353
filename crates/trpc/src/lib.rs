//! Minimal blocking RPC over TCP with name-based dynamic dispatch.
//!
//! A server registers service values under names; a client calls
//! `"<service>.<method>"` with a serializable request and gets a typed reply
//! back. Requests travel as JSON envelopes over a plain TCP stream.
//!
//! # Crate Structure
//!
//! - [`transport`]: TCP listener and connected stream
//! - [`codec`]: envelope encoding, method addresses and message framing
//! - [`service`]: service builder, registry, call context and dispatcher
//! - [`peer`]: connection server and client invoker (behind `peer` feature)
//! - [`services`]: greeting and user lookup services with typed clients
//!   (behind `peer` feature)
//!
//! # Example
//!
//! ```no_run
//! use trpc::peer::{Client, Server};
//! use trpc::service::CallContext;
//! use trpc::services::hello::{register_hello_server, Greeter, HelloClient, HelloRequest};
//!
//! let mut server = Server::bind("tcp", "127.0.0.1:0")?;
//! register_hello_server(&mut server, Greeter);
//! let running = server.serve_in_background()?;
//!
//! let mut client = Client::connect("tcp", &running.local_addr().to_string())?;
//! let reply = HelloClient::new(&mut client)
//!     .hello(&CallContext::background(), &HelloRequest::new("World"))?;
//! assert_eq!(reply.msg, "Hello, World!");
//!
//! running.shutdown()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

/// Re-export transport types.
pub mod transport {
    pub use trpc_transport::*;
}

/// Re-export codec types.
pub mod codec {
    pub use trpc_codec::*;
}

/// Re-export service layer types.
pub mod service {
    pub use trpc_service::*;
}

/// Re-export server and client types (requires `peer` feature).
#[cfg(feature = "peer")]
pub mod peer {
    pub use trpc_peer::*;
}

#[cfg(feature = "peer")]
pub mod services;
