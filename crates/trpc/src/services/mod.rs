//! Ready-made services.
//!
//! Each module follows the same shape: request and reply types with the
//! wire's PascalCase field names, a service trait, a default
//! implementation, a `register_*_server` helper and a typed client.

pub mod hello;
pub mod user;
