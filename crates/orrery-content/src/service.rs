//! Service lookup for readers.
//!
//! A [`ServiceProvider`] is an opaque capability container owned by the application. Content
//! managers only pass it through to their readers; readers fetch platform services such as the
//! graphics device from it.

use std::any::{Any, TypeId};
use std::sync::Arc;

use orrery_core::alloc::HashMap;

/// Marker trait for types that can be registered as services.
pub trait Service: Send + Sync + 'static {}

impl<T: Send + Sync + 'static> Service for T {}

struct ServiceEntry {
    service: Arc<dyn Any + Send + Sync>,
    type_name: &'static str,
}

/// Type-keyed service container. Each service type can be registered once.
///
/// # Example
///
/// ```
/// use orrery_content::ServiceProvider;
///
/// struct GraphicsDevice {
///     adapter: String,
/// }
///
/// let mut services = ServiceProvider::new();
/// services.insert(GraphicsDevice { adapter: "mock".to_string() });
///
/// let device = services.get::<GraphicsDevice>().unwrap();
/// assert_eq!(device.adapter, "mock");
/// ```
#[derive(Default)]
pub struct ServiceProvider {
    services: HashMap<TypeId, ServiceEntry>,
}

impl ServiceProvider {
    /// Create an empty provider.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a service, replacing any existing service of the same type.
    ///
    /// Returns the previous service if one existed.
    pub fn insert<S: Service>(&mut self, service: S) -> Option<Arc<S>> {
        self.insert_arc(Arc::new(service))
    }

    /// Register a service that is already shared elsewhere.
    pub fn insert_arc<S: Service>(&mut self, service: Arc<S>) -> Option<Arc<S>> {
        let entry = ServiceEntry {
            service,
            type_name: std::any::type_name::<S>(),
        };

        self.services
            .insert(TypeId::of::<S>(), entry)
            .and_then(|old| old.service.downcast::<S>().ok())
    }

    /// Look up a service.
    pub fn get<S: Service>(&self) -> Option<Arc<S>> {
        self.services
            .get(&TypeId::of::<S>())
            .and_then(|entry| entry.service.clone().downcast::<S>().ok())
    }

    /// Check if a service is registered.
    pub fn contains<S: Service>(&self) -> bool {
        self.services.contains_key(&TypeId::of::<S>())
    }

    /// Remove a service.
    pub fn remove<S: Service>(&mut self) -> Option<Arc<S>> {
        self.services
            .remove(&TypeId::of::<S>())
            .and_then(|entry| entry.service.downcast::<S>().ok())
    }

    /// Number of registered services.
    pub fn len(&self) -> usize {
        self.services.len()
    }

    /// Check if no services are registered.
    pub fn is_empty(&self) -> bool {
        self.services.is_empty()
    }

    /// Names of the registered service types (for debugging).
    pub fn type_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.services.values().map(|entry| entry.type_name)
    }
}

impl std::fmt::Debug for ServiceProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceProvider")
            .field("count", &self.services.len())
            .field("types", &self.type_names().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_insert_and_get() {
        let mut services = ServiceProvider::new();
        services.insert(42i32);
        services.insert("hello".to_string());

        assert_eq!(*services.get::<i32>().unwrap(), 42);
        assert_eq!(services.get::<String>().unwrap().as_str(), "hello");
        assert!(services.get::<u8>().is_none());
    }

    #[test]
    fn test_replace() {
        let mut services = ServiceProvider::new();
        services.insert(10i32);
        let old = services.insert(20i32);

        assert_eq!(old.as_deref(), Some(&10));
        assert_eq!(*services.get::<i32>().unwrap(), 20);
    }

    #[test]
    fn test_shared_instance() {
        let shared = Arc::new(7u64);
        let mut services = ServiceProvider::new();
        services.insert_arc(shared.clone());

        assert!(Arc::ptr_eq(&shared, &services.get::<u64>().unwrap()));
    }

    #[test]
    fn test_remove_and_contains() {
        let mut services = ServiceProvider::new();
        services.insert(1i32);
        assert!(services.contains::<i32>());

        assert_eq!(services.remove::<i32>().as_deref(), Some(&1));
        assert!(!services.contains::<i32>());
        assert!(services.is_empty());
    }
}
