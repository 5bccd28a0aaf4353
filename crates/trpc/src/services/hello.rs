use serde::{Deserialize, Serialize};
use trpc_peer::{Client, ClientError};
use trpc_service::{CallContext, HandlerResult, Service, ServiceRegistrar};

/// Registry name of the greeting service.
pub const SERVICE_NAME: &str = "hello_service";
/// Full address of its one method.
pub const HELLO_METHOD: &str = "hello_service.Hello";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HelloRequest {
    pub name: String,
}

impl HelloRequest {
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct HelloReply {
    pub msg: String,
}

pub trait HelloService: Send + Sync + 'static {
    fn hello(&self, ctx: &CallContext, request: HelloRequest) -> HandlerResult<HelloReply>;
}

/// Greets whoever is named in the request.
#[derive(Debug, Clone, Copy, Default)]
pub struct Greeter;

impl HelloService for Greeter {
    fn hello(&self, _ctx: &CallContext, request: HelloRequest) -> HandlerResult<HelloReply> {
        Ok(HelloReply {
            msg: format!("Hello, {}!", request.name),
        })
    }
}

/// Wrap `service` with its method table.
pub fn hello_service<S: HelloService>(service: S) -> Service {
    Service::builder(service)
        .method("Hello", S::hello)
        .build()
}

pub fn register_hello_server<R, S>(registrar: &mut R, service: S)
where
    R: ServiceRegistrar + ?Sized,
    S: HelloService,
{
    registrar.register_service(SERVICE_NAME, hello_service(service));
}

/// Typed calls to `hello_service` over a borrowed client.
pub struct HelloClient<'a> {
    client: &'a mut Client,
}

impl<'a> HelloClient<'a> {
    pub fn new(client: &'a mut Client) -> Self {
        Self { client }
    }

    pub fn hello(
        &mut self,
        ctx: &CallContext,
        request: &HelloRequest,
    ) -> Result<HelloReply, ClientError> {
        self.client.invoke(ctx, HELLO_METHOD, request)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use trpc_service::{Dispatcher, ServiceRegistry};

    use super::*;

    #[test]
    fn greeter_formats_message() {
        let reply = Greeter
            .hello(&CallContext::background(), HelloRequest::new("World"))
            .expect("greeting should succeed");
        assert_eq!(reply.msg, "Hello, World!");
    }

    #[test]
    fn request_and_reply_use_wire_field_names() {
        let json = serde_json::to_string(&HelloRequest::new("a")).expect("request should encode");
        assert_eq!(json, r#"{"Name":"a"}"#);

        let reply: HelloReply =
            serde_json::from_str(r#"{"Msg":"hi"}"#).expect("reply should decode");
        assert_eq!(reply.msg, "hi");
    }

    #[test]
    fn registered_service_dispatches_by_name() {
        let mut registry = ServiceRegistry::new();
        register_hello_server(&mut registry, Greeter);
        assert!(registry.contains(SERVICE_NAME));

        let dispatcher = Dispatcher::new(Arc::new(registry));
        let reply = dispatcher
            .dispatch(
                &CallContext::background(),
                SERVICE_NAME,
                "Hello",
                br#"{"Name":"Dispatch"}"#,
            )
            .expect("dispatch should succeed");
        assert_eq!(reply, br#"{"Msg":"Hello, Dispatch!"}"#);
    }

    #[test]
    fn method_address_matches_names() {
        assert_eq!(HELLO_METHOD, format!("{SERVICE_NAME}.Hello"));
    }
}
