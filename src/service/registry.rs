//! Service Registry
//!
//! Application-owned container holding exactly one instance per service type.

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::debug;

use crate::error::{CacheError, Result};

type Service = Arc<dyn Any + Send + Sync>;

#[derive(Default)]
pub struct ServiceRegistry {
    services: Mutex<HashMap<TypeId, Service>>,
}

impl ServiceRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    // == Register ==
    /// Registers the instance for `T`. A second registration is refused.
    pub fn register<T>(&self, service: Arc<T>) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let mut services = self.services.lock();
        if services.contains_key(&TypeId::of::<T>()) {
            return Err(CacheError::Internal(format!(
                "{} is already registered",
                type_name::<T>()
            )));
        }
        services.insert(TypeId::of::<T>(), service.clone() as Service);
        debug!(service = type_name::<T>(), "service registered");
        Ok(service)
    }

    // == Get Or Init ==
    /// Returns the instance for `T`, creating it on first use.
    ///
    /// `init` runs outside the registry lock, so it may resolve other
    /// services. If two callers race, the first instance stored wins and
    /// the other is dropped.
    pub fn get_or_init<T, F>(&self, init: F) -> Arc<T>
    where
        T: Send + Sync + 'static,
        F: FnOnce() -> T,
    {
        if let Ok(existing) = self.get::<T>() {
            return existing;
        }

        let created: Service = Arc::new(init());
        let stored = Arc::clone(
            self.services
                .lock()
                .entry(TypeId::of::<T>())
                .or_insert(created),
        );
        downcast::<T>(stored)
    }

    // == Get ==
    /// The instance for `T`, or `ConfigurationMissing` if none was registered.
    pub fn get<T>(&self) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let stored = self.services.lock().get(&TypeId::of::<T>()).cloned();
        stored.map(downcast::<T>).ok_or_else(|| {
            CacheError::ConfigurationMissing(format!("{} is not registered", type_name::<T>()))
        })
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.services.lock().contains_key(&TypeId::of::<T>())
    }

    pub fn len(&self) -> usize {
        self.services.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.services.lock().is_empty()
    }
}

// Entries are keyed by their own TypeId, so the downcast cannot fail.
fn downcast<T: Send + Sync + 'static>(service: Service) -> Arc<T> {
    match service.downcast::<T>() {
        Ok(typed) => typed,
        Err(_) => unreachable!("registry entry stored under a foreign TypeId"),
    }
}
