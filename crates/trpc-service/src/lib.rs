//! Service registry and method dispatch for trpc.
//!
//! A service is any value whose methods follow the invocation convention
//! `fn(&self, &CallContext, Request) -> HandlerResult<Response>`. At
//! registration time each method is wrapped in a type-erased handler that
//! knows how to decode its own request type and encode its own response
//! type, so the dispatcher can route raw bytes by name without knowing any
//! concrete types:
//!
//! ```
//! use serde::{Deserialize, Serialize};
//! use trpc_service::{CallContext, Dispatcher, HandlerResult, Service, ServiceRegistry};
//!
//! #[derive(Deserialize)]
//! struct Ping { n: u32 }
//! #[derive(Serialize)]
//! struct Pong { n: u32 }
//!
//! struct Echo;
//!
//! impl Echo {
//!     fn ping(&self, _ctx: &CallContext, req: Ping) -> HandlerResult<Pong> {
//!         Ok(Pong { n: req.n + 1 })
//!     }
//! }
//!
//! let mut registry = ServiceRegistry::new();
//! registry.register("echo", Service::builder(Echo).method("Ping", Echo::ping).build());
//!
//! let dispatcher = Dispatcher::new(registry.into());
//! let reply = dispatcher
//!     .dispatch(&CallContext::background(), "echo", "Ping", br#"{"n":1}"#)
//!     .unwrap();
//! assert_eq!(reply, br#"{"n":2}"#);
//! ```

pub mod context;
pub mod dispatcher;
pub mod error;
pub mod registry;
pub mod service;

pub use context::{CallContext, ContextError};
pub use dispatcher::Dispatcher;
pub use error::{BoxError, DispatchError, HandlerResult, Result};
pub use registry::{ServiceRegistrar, ServiceRegistry};
pub use service::{Service, ServiceBuilder};
