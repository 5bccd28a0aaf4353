use std::collections::HashMap;

use crate::service::Service;

/// Name-keyed table of registered services.
///
/// Populated before serving and read-only afterwards: once wrapped in an
/// `Arc` and handed to a [`Dispatcher`](crate::Dispatcher) it can no longer
/// be mutated, so lookups need no locking.
#[derive(Debug, Default)]
pub struct ServiceRegistry {
    services: HashMap<String, Service>,
}

impl ServiceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `service` under `name`.
    ///
    /// Re-registering a name replaces the previous service, which is returned.
    pub fn register(&mut self, name: impl Into<String>, service: Service) -> Option<Service> {
        let name = name.into();
        tracing::debug!(
            service = %name,
            methods = ?service.method_names(),
            "registering service"
        );
        self.services.insert(name, service)
    }

    /// Find the service registered under `name`.
    pub fn lookup(&self, name: &str) -> Option<&Service> {
        self.services.get(name)
    }

    /// Check if a service is registered under `name`.
    pub fn contains(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Registered service names, sorted.
    pub fn service_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.services.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

/// Anything services can be registered into.
///
/// Implemented by [`ServiceRegistry`] and by servers that own one, so
/// per-service `register_*` helpers work with either.
pub trait ServiceRegistrar {
    fn register_service(&mut self, name: &str, service: Service);
}

impl ServiceRegistrar for ServiceRegistry {
    fn register_service(&mut self, name: &str, service: Service) {
        self.register(name, service);
    }
}
