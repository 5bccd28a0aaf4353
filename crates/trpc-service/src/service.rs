use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use trpc_codec::{decode_args, encode_reply};

use crate::context::CallContext;
use crate::error::{DispatchError, HandlerResult, Result};

/// A type-erased method: raw argument bytes in, raw reply bytes out.
pub(crate) type MethodHandler =
    Box<dyn Fn(&CallContext, &[u8]) -> Result<Vec<u8>> + Send + Sync + 'static>;

/// A registrable service: one implementation value plus its method table.
///
/// Built with [`Service::builder`]. Only methods that match the invocation
/// convention can be added, so every entry in the table is callable.
pub struct Service {
    type_name: &'static str,
    methods: HashMap<String, MethodHandler>,
}

impl Service {
    /// Start building a service around `inner`.
    pub fn builder<S: Send + Sync + 'static>(inner: S) -> ServiceBuilder<S> {
        ServiceBuilder::new(inner)
    }

    /// Whether a method with this name is registered.
    pub fn has_method(&self, name: &str) -> bool {
        self.methods.contains_key(name)
    }

    /// Registered method names, sorted.
    pub fn method_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.methods.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Rust type name of the implementation, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    pub(crate) fn method(&self, name: &str) -> Option<&MethodHandler> {
        self.methods.get(name)
    }
}

impl fmt::Debug for Service {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Service")
            .field("type_name", &self.type_name)
            .field("methods", &self.method_names())
            .finish()
    }
}

/// Builds the method table of a [`Service`].
pub struct ServiceBuilder<S> {
    inner: Arc<S>,
    methods: HashMap<String, MethodHandler>,
}

impl<S: Send + Sync + 'static> ServiceBuilder<S> {
    /// Wrap an implementation value.
    pub fn new(inner: S) -> Self {
        Self::from_arc(Arc::new(inner))
    }

    /// Wrap an implementation that is shared elsewhere.
    pub fn from_arc(inner: Arc<S>) -> Self {
        Self {
            inner,
            methods: HashMap::new(),
        }
    }

    /// Expose `handler` under `name`.
    ///
    /// The handler's request type is decoded from the call's argument bytes
    /// and its response type is encoded as the reply. Adding a second handler
    /// under the same name replaces the first.
    pub fn method<Req, Resp, F>(mut self, name: impl Into<String>, handler: F) -> Self
    where
        Req: DeserializeOwned + 'static,
        Resp: Serialize + 'static,
        F: Fn(&S, &CallContext, Req) -> HandlerResult<Resp> + Send + Sync + 'static,
    {
        let inner = Arc::clone(&self.inner);
        let erased: MethodHandler = Box::new(move |ctx, args| {
            let request: Req = decode_args(args).map_err(DispatchError::Decode)?;
            let response = handler(inner.as_ref(), ctx, request).map_err(DispatchError::Handler)?;
            encode_reply(&response).map_err(DispatchError::Encode)
        });
        self.methods.insert(name.into(), erased);
        self
    }

    /// Finish the method table.
    pub fn build(self) -> Service {
        Service {
            type_name: std::any::type_name::<S>(),
            methods: self.methods,
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Deserialize)]
    struct Add {
        a: i64,
        b: i64,
    }

    #[derive(Serialize)]
    struct Sum {
        sum: i64,
    }

    #[derive(Default)]
    struct Calculator {
        calls: AtomicUsize,
    }

    impl Calculator {
        fn add(&self, _ctx: &CallContext, req: Add) -> HandlerResult<Sum> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Sum { sum: req.a + req.b })
        }
    }

    #[test]
    fn builds_sorted_method_table() {
        let service = Service::builder(Calculator::default())
            .method("Sub", |_: &Calculator, _: &CallContext, req: Add| {
                Ok(Sum { sum: req.a - req.b })
            })
            .method("Add", Calculator::add)
            .build();

        assert_eq!(service.method_names(), vec!["Add", "Sub"]);
        assert!(service.has_method("Add"));
        assert!(!service.has_method("add"));
        assert!(service.type_name().ends_with("Calculator"));
    }

    #[test]
    fn erased_handler_decodes_invokes_and_encodes() {
        let calc = Arc::new(Calculator::default());
        let service = ServiceBuilder::from_arc(Arc::clone(&calc))
            .method("Add", Calculator::add)
            .build();

        let handler = service.method("Add").unwrap();
        let reply = handler(&CallContext::background(), br#"{"a":2,"b":3}"#).unwrap();

        assert_eq!(reply, br#"{"sum":5}"#);
        assert_eq!(calc.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn erased_handler_reports_decode_failure_without_invoking() {
        let calc = Arc::new(Calculator::default());
        let service = ServiceBuilder::from_arc(Arc::clone(&calc))
            .method("Add", Calculator::add)
            .build();

        let handler = service.method("Add").unwrap();
        let err = handler(&CallContext::background(), br#"{"a":"two"}"#).unwrap_err();

        assert!(matches!(err, DispatchError::Decode(_)));
        assert_eq!(calc.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn later_method_replaces_earlier() {
        let service = Service::builder(Calculator::default())
            .method("Add", Calculator::add)
            .method("Add", |_: &Calculator, _: &CallContext, _: Add| {
                Ok(Sum { sum: 0 })
            })
            .build();

        let reply = service.method("Add").unwrap()(&CallContext::background(), br#"{"a":1,"b":1}"#)
            .unwrap();
        assert_eq!(reply, br#"{"sum":0}"#);
    }
}
