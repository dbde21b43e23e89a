// Service container: one binding per service type, looked up by type or name

use crate::{Error, Result};
use parking_lot::RwLock;
use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

type Instance = Box<dyn Any + Send + Sync>;
type InstanceFactory = Arc<dyn Fn() -> Result<Instance> + Send + Sync>;

/// How a binding produces instances.
enum Lifetime {
    /// One shared instance, created at registration.
    Singleton(Arc<dyn Any + Send + Sync>),
    /// A fresh instance per resolve.
    PerRequest(InstanceFactory),
}

struct Binding {
    name: String,
    type_name: &'static str,
    lifetime: Lifetime,
}

#[derive(Default)]
struct Bindings {
    by_type: HashMap<TypeId, Binding>,
    by_name: HashMap<String, TypeId>,
}

/// The service container.
///
/// Instances are stored as `Arc<S>`, so `S` may be a trait object such as
/// `dyn CalculatorClient`. Service names are unique.
#[derive(Clone, Default)]
pub struct Container {
    bindings: Arc<RwLock<Bindings>>,
}

impl Container {
    pub fn new() -> Self {
        debug!("Creating new service container");
        Self::default()
    }

    /// Register one shared instance of `S` under `name`.
    pub fn register_singleton<S>(&self, name: &str, instance: Arc<S>) -> Result<()>
    where
        S: ?Sized + Send + Sync + 'static,
    {
        self.bind::<S>(name, Lifetime::Singleton(Arc::new(instance)))
    }

    /// Register a factory producing a fresh `S` on every resolve.
    pub fn register_factory<S, F>(&self, name: &str, factory: F) -> Result<()>
    where
        S: ?Sized + Send + Sync + 'static,
        F: Fn() -> Result<Arc<S>> + Send + Sync + 'static,
    {
        let erased: InstanceFactory = Arc::new(move || {
            let instance: Instance = Box::new(factory()?);
            Ok(instance)
        });
        self.bind::<S>(name, Lifetime::PerRequest(erased))
    }

    fn bind<S: ?Sized + 'static>(&self, name: &str, lifetime: Lifetime) -> Result<()> {
        let type_id = TypeId::of::<S>();
        let type_name = type_name::<S>();

        trace!(service = name, provider = type_name, "Acquiring write lock for registration");
        let mut bindings = self.bindings.write();

        if let Some(existing) = bindings.by_name.get(name).and_then(|id| bindings.by_type.get(id)) {
            return Err(Error::DuplicateService {
                name: name.to_string(),
                existing: existing.type_name,
                duplicate: type_name,
            });
        }
        if let Some(existing) = bindings.by_type.get(&type_id) {
            return Err(Error::DuplicateService {
                name: existing.name.clone(),
                existing: existing.type_name,
                duplicate: type_name,
            });
        }

        bindings.by_name.insert(name.to_string(), type_id);
        bindings.by_type.insert(
            type_id,
            Binding {
                name: name.to_string(),
                type_name,
                lifetime,
            },
        );

        debug!(service = name, provider = type_name, "Service registered in container");
        Ok(())
    }

    /// Resolve the instance bound to `S`.
    pub fn resolve<S: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<S>> {
        let type_name = type_name::<S>();
        trace!(provider = type_name, "Attempting to resolve service");

        // Clone out of the lock so per-request factories run without holding it.
        let lifetime = {
            let bindings = self.bindings.read();
            match bindings.by_type.get(&TypeId::of::<S>()).map(|b| &b.lifetime) {
                Some(Lifetime::Singleton(instance)) => Lifetime::Singleton(instance.clone()),
                Some(Lifetime::PerRequest(factory)) => Lifetime::PerRequest(factory.clone()),
                None => {
                    debug!(provider = type_name, "Service not found in container");
                    return Err(Error::ProviderNotFound(type_name.to_string()));
                }
            }
        };

        let resolved = match lifetime {
            Lifetime::Singleton(instance) => instance.downcast_ref::<Arc<S>>().cloned(),
            Lifetime::PerRequest(factory) => factory()?.downcast::<Arc<S>>().ok().map(|b| *b),
        };

        resolved.ok_or_else(|| Error::ProviderNotFound(type_name.to_string()))
    }

    /// Resolve by service name; `S` must be the bound type.
    pub fn resolve_named<S: ?Sized + Send + Sync + 'static>(&self, name: &str) -> Result<Arc<S>> {
        let bound = self.bindings.read().by_name.get(name).copied();
        match bound {
            Some(type_id) if type_id == TypeId::of::<S>() => self.resolve::<S>(),
            _ => Err(Error::ProviderNotFound(name.to_string())),
        }
    }

    /// Check if `S` is bound
    pub fn has<S: ?Sized + 'static>(&self) -> bool {
        self.bindings.read().by_type.contains_key(&TypeId::of::<S>())
    }

    /// Check if a service name is taken
    pub fn has_name(&self, name: &str) -> bool {
        self.bindings.read().by_name.contains_key(name)
    }

    /// Registered service names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<_> = self.bindings.read().by_name.keys().cloned().collect();
        names.sort();
        names
    }

    /// Whether `S` is bound as a singleton
    pub fn is_singleton<S: ?Sized + 'static>(&self) -> Option<bool> {
        self.bindings
            .read()
            .by_type
            .get(&TypeId::of::<S>())
            .map(|b| matches!(b.lifetime, Lifetime::Singleton(_)))
    }

    /// Clear all bindings
    pub fn clear(&self) {
        let mut bindings = self.bindings.write();
        let count = bindings.by_type.len();
        bindings.by_type.clear();
        bindings.by_name.clear();

        debug!(provider_count = count, "Cleared all services from container");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Greeter: Send + Sync {
        fn greet(&self) -> String;
    }

    struct English;

    impl Greeter for English {
        fn greet(&self) -> String {
            "hello".to_string()
        }
    }

    #[test]
    fn test_singleton_trait_object() {
        let container = Container::new();
        let greeter: Arc<dyn Greeter> = Arc::new(English);
        container.register_singleton("greeter", greeter).unwrap();

        let a = container.resolve::<dyn Greeter>().unwrap();
        let b = container.resolve_named::<dyn Greeter>("greeter").unwrap();
        assert_eq!(a.greet(), "hello");
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(container.is_singleton::<dyn Greeter>(), Some(true));
    }

    #[test]
    fn test_per_request_creates_fresh_instances() {
        let container = Container::new();
        let created = Arc::new(AtomicUsize::new(0));
        let counter = created.clone();
        container
            .register_factory::<dyn Greeter, _>("greeter", move || {
                counter.fetch_add(1, Ordering::SeqCst);
                Ok(Arc::new(English) as Arc<dyn Greeter>)
            })
            .unwrap();

        let a = container.resolve::<dyn Greeter>().unwrap();
        let b = container.resolve::<dyn Greeter>().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_eq!(created.load(Ordering::SeqCst), 2);
        assert_eq!(container.is_singleton::<dyn Greeter>(), Some(false));
    }

    #[test]
    fn test_duplicate_names_rejected() {
        let container = Container::new();
        container.register_singleton("svc", Arc::new(1u32)).unwrap();

        let err = container.register_singleton("svc", Arc::new(English)).unwrap_err();
        assert!(matches!(err, Error::DuplicateService { ref name, .. } if name == "svc"));

        let err = container.register_singleton("other", Arc::new(2u32)).unwrap_err();
        assert!(matches!(err, Error::DuplicateService { .. }));
        assert_eq!(container.names(), vec!["svc"]);
    }

    #[test]
    fn test_resolve_missing() {
        let container = Container::new();
        assert!(container.resolve::<dyn Greeter>().is_err());
        assert!(container.resolve_named::<u32>("nope").is_err());
        assert!(!container.has::<dyn Greeter>());
    }

    #[test]
    fn test_clear() {
        let container = Container::new();
        container.register_singleton("n", Arc::new(1u8)).unwrap();
        assert!(container.has_name("n"));
        container.clear();
        assert!(!container.has::<u8>());
    }
}
