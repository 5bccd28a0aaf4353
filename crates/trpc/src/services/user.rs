use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use trpc_peer::{Client, ClientError};
use trpc_service::{CallContext, HandlerResult, Service, ServiceRegistrar};

pub const SERVICE_NAME: &str = "user_service";
pub const USER_METHOD: &str = "user_service.User";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct User {
    pub uid: i64,
    pub name: String,
    pub age: i64,
    pub sex: i64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UserRequest {
    pub uid: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct UserReply {
    pub user: User,
}

/// Lookup of an unknown uid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("user not found: {0}")]
pub struct UserNotFound(pub i64);

pub trait UserService: Send + Sync + 'static {
    fn user(&self, ctx: &CallContext, request: UserRequest) -> HandlerResult<UserReply>;
}

/// In-memory user table.
#[derive(Debug, Clone, Default)]
pub struct UserDirectory {
    users: HashMap<i64, User>,
}

impl UserDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A small fixed table for demos and tests.
    pub fn sample() -> Self {
        Self::new()
            .with_user(User {
                uid: 1,
                name: "Alice".to_string(),
                age: 30,
                sex: 0,
            })
            .with_user(User {
                uid: 2,
                name: "Bob".to_string(),
                age: 25,
                sex: 1,
            })
    }

    pub fn with_user(mut self, user: User) -> Self {
        self.users.insert(user.uid, user);
        self
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl UserService for UserDirectory {
    fn user(&self, _ctx: &CallContext, request: UserRequest) -> HandlerResult<UserReply> {
        let user = self
            .users
            .get(&request.uid)
            .cloned()
            .ok_or(UserNotFound(request.uid))?;
        Ok(UserReply { user })
    }
}

pub fn user_service<S: UserService>(service: S) -> Service {
    Service::builder(service).method("User", S::user).build()
}

pub fn register_user_server<R, S>(registrar: &mut R, service: S)
where
    R: ServiceRegistrar + ?Sized,
    S: UserService,
{
    registrar.register_service(SERVICE_NAME, user_service(service));
}

/// Typed calls to `user_service` over a borrowed client.
pub struct UserClient<'a> {
    client: &'a mut Client,
}

impl<'a> UserClient<'a> {
    pub fn new(client: &'a mut Client) -> Self {
        Self { client }
    }

    pub fn user(
        &mut self,
        ctx: &CallContext,
        request: &UserRequest,
    ) -> Result<UserReply, ClientError> {
        self.client.invoke(ctx, USER_METHOD, request)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_known_user() {
        let reply = UserDirectory::sample()
            .user(&CallContext::background(), UserRequest { uid: 1 })
            .expect("uid 1 should exist");
        assert_eq!(reply.user.name, "Alice");
        assert_eq!(reply.user.uid, 1);
    }

    #[test]
    fn unknown_user_is_handler_error() {
        let err = UserDirectory::sample()
            .user(&CallContext::background(), UserRequest { uid: 99 })
            .expect_err("uid 99 should not exist");
        assert_eq!(err.to_string(), "user not found: 99");
        assert!(err.downcast_ref::<UserNotFound>().is_some());
    }

    #[test]
    fn reply_uses_wire_field_names() {
        let reply = UserReply {
            user: User {
                uid: 7,
                name: "Eve".to_string(),
                age: 41,
                sex: 1,
            },
        };
        let json = serde_json::to_string(&reply).expect("reply should encode");
        assert_eq!(
            json,
            r#"{"User":{"Uid":7,"Name":"Eve","Age":41,"Sex":1}}"#
        );
    }

    #[test]
    fn registers_under_service_name() {
        let mut registry = trpc_service::ServiceRegistry::new();
        register_user_server(&mut registry, UserDirectory::sample());
        let service = registry
            .lookup(SERVICE_NAME)
            .expect("user service should be registered");
        assert!(service.has_method("User"));
    }
}
