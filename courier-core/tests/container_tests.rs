use courier_core::{Container, Error};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

struct TestService {
    name: String,
}

trait Clock: Send + Sync {
    fn now(&self) -> u64;
}

struct FixedClock(u64);

impl Clock for FixedClock {
    fn now(&self) -> u64 {
        self.0
    }
}

#[test]
fn test_register_and_resolve() {
    let container = Container::new();

    container
        .register_singleton(
            "test",
            Arc::new(TestService {
                name: "test".to_string(),
            }),
        )
        .unwrap();

    let resolved = container.resolve::<TestService>().unwrap();
    assert_eq!(resolved.name, "test");
}

#[test]
fn test_resolve_nonexistent() {
    let container = Container::new();
    let result = container.resolve::<TestService>();
    assert!(matches!(result, Err(Error::ProviderNotFound(_))));
}

#[test]
fn test_has_provider() {
    let container = Container::new();

    assert!(!container.has::<TestService>());

    container
        .register_singleton(
            "test",
            Arc::new(TestService {
                name: "test".to_string(),
            }),
        )
        .unwrap();

    assert!(container.has::<TestService>());
    assert!(container.has_name("test"));
}

#[test]
fn test_trait_object_by_name() {
    let container = Container::new();
    let clock: Arc<dyn Clock> = Arc::new(FixedClock(42));
    container.register_singleton::<dyn Clock>("clock", clock).unwrap();

    assert_eq!(container.resolve_named::<dyn Clock>("clock").unwrap().now(), 42);
    assert!(container.resolve_named::<TestService>("clock").is_err());
    assert_eq!(container.names(), vec!["clock"]);
}

#[test]
fn test_factory_runs_per_resolve() {
    let container = Container::new();
    let created = Arc::new(AtomicUsize::new(0));
    let counter = created.clone();

    container
        .register_factory::<dyn Clock, _>("clock", move || {
            let n = counter.fetch_add(1, Ordering::SeqCst) as u64;
            Ok(Arc::new(FixedClock(n)) as Arc<dyn Clock>)
        })
        .unwrap();

    assert_eq!(created.load(Ordering::SeqCst), 0);
    assert_eq!(container.resolve::<dyn Clock>().unwrap().now(), 0);
    assert_eq!(container.resolve::<dyn Clock>().unwrap().now(), 1);
    assert_eq!(container.is_singleton::<dyn Clock>(), Some(false));
}

#[test]
fn test_duplicate_name_and_type() {
    let container = Container::new();
    container
        .register_singleton("svc", Arc::new(TestService { name: "a".into() }))
        .unwrap();

    let same_name = container.register_singleton::<dyn Clock>("svc", Arc::new(FixedClock(1)));
    assert!(matches!(same_name, Err(Error::DuplicateService { .. })));

    let same_type =
        container.register_singleton("other", Arc::new(TestService { name: "b".into() }));
    assert!(matches!(same_type, Err(Error::DuplicateService { .. })));

    container.clear();
    assert!(container.names().is_empty());
}
