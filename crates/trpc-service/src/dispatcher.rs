use std::sync::Arc;
use std::time::Instant;

use tracing::debug;
use trpc_codec::Envelope;

use crate::context::CallContext;
use crate::error::{DispatchError, Result};
use crate::registry::ServiceRegistry;

/// Routes raw calls to registered services.
///
/// Holds the registry behind an `Arc`; clones are cheap and share it, which
/// is how connection threads get read-only access.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    registry: Arc<ServiceRegistry>,
}

impl Dispatcher {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        Self { registry }
    }

    /// The registry calls are routed through.
    pub fn registry(&self) -> &ServiceRegistry {
        &self.registry
    }

    /// Resolve `service_name`/`method_name`, invoke it with `args`, and
    /// return the encoded reply.
    ///
    /// Checks run in this order: arguments present, service name present,
    /// service registered, method name present, method registered. Only then
    /// are the arguments decoded and the method invoked. A handler error is
    /// returned as-is and produces no reply bytes.
    pub fn dispatch(
        &self,
        ctx: &CallContext,
        service_name: &str,
        method_name: &str,
        args: &[u8],
    ) -> Result<Vec<u8>> {
        if args.is_empty() {
            return Err(DispatchError::MissingArguments);
        }
        if service_name.is_empty() {
            return Err(DispatchError::EmptyServiceName);
        }

        let service = self
            .registry
            .lookup(service_name)
            .ok_or_else(|| DispatchError::ServiceNotFound(service_name.to_string()))?;

        if method_name.is_empty() {
            return Err(DispatchError::EmptyMethodName);
        }

        let handler = service
            .method(method_name)
            .ok_or_else(|| DispatchError::MethodNotFound {
                service: service_name.to_string(),
                method: method_name.to_string(),
            })?;

        let started = Instant::now();
        let result = handler(ctx, args);
        debug!(
            service = service_name,
            method = method_name,
            args_len = args.len(),
            ok = result.is_ok(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "dispatched call"
        );
        result
    }

    /// Dispatch a decoded envelope.
    pub fn dispatch_envelope(&self, ctx: &CallContext, envelope: &Envelope) -> Result<Vec<u8>> {
        self.dispatch(
            ctx,
            &envelope.service_name,
            &envelope.method_name,
            &envelope.args,
        )
    }
}
