//! Resolution, caching and construction behaviour of a built container.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use anbar::StdInjector;
use anbar::prelude::*;
use common::init_tracing;

#[derive(Injectable)]
#[injectable(name = "props::Logger")]
struct Logger;

#[derive(Injectable)]
#[injectable(name = "props::Service")]
struct Service {
    #[inject(key = "Logger")]
    logger: Inject<Logger>,
}

static POOL_BUILDS: AtomicUsize = AtomicUsize::new(0);

#[derive(Injectable)]
#[injectable(name = "props::Pool", construct = "Pool::init")]
struct Pool {
    size: usize,
}

impl Pool {
    fn init(&mut self, args: &Args) -> Result<()> {
        POOL_BUILDS.fetch_add(1, Ordering::SeqCst);
        self.size = args.cloned::<usize>(0).unwrap_or(1);
        Ok(())
    }
}

#[derive(Injectable)]
#[injectable(name = "props::Session")]
struct Session;

#[derive(Injectable)]
#[injectable(name = "props::Greeter", construct = "Greeter::init")]
struct Greeter {
    #[inject(key = "Logger")]
    logger: Inject<Logger>,
    saw_logger: bool,
}

impl Greeter {
    fn init(&mut self, _args: &Args) -> Result<()> {
        self.saw_logger = self.logger.get().is_ok();
        Ok(())
    }
}

static EXPENSIVE_BUILDS: AtomicUsize = AtomicUsize::new(0);

#[derive(Injectable)]
#[injectable(name = "props::ExpensiveResource", construct = "ExpensiveResource::init")]
struct ExpensiveResource;

impl ExpensiveResource {
    fn init(&mut self, _args: &Args) -> Result<()> {
        EXPENSIVE_BUILDS.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[derive(Injectable)]
#[injectable(name = "props::Consumer")]
struct Consumer {
    #[inject(on_demand, key = "ExpensiveResource")]
    resource: OnDemand<ExpensiveResource>,
}

/// Factory answering every key it was given with a fixed value.
struct Fixed {
    key: TypeKey,
    value: Instance,
}

impl DependencyFactory for Fixed {
    fn create_dependency(
        &self,
        key: &TypeKey,
        _container: &dyn DependencyContainer,
        _activator: &dyn Activator,
    ) -> Result<Option<Instance>> {
        Ok((key == &self.key).then(|| self.value.clone()))
    }

    fn dependency_flags(&self, key: &TypeKey) -> Option<DependencyFlags> {
        (key == &self.key).then_some(DependencyFlags::NONE)
    }
}

#[test]
fn singleton_class_is_constructed_once() {
    init_tracing();
    let container = Container::builder()
        .bind_with("props::IPool", "props::Pool", Args::new().with(8usize), DependencyFlags::SINGLETON)
        .build()
        .unwrap();

    let before = POOL_BUILDS.load(Ordering::SeqCst);
    let a = container.resolve("props::IPool").unwrap();
    let b = container.resolve("props::IPool").unwrap();

    assert!(a.ptr_eq(&b));
    assert_eq!(POOL_BUILDS.load(Ordering::SeqCst) - before, 1);
    assert_eq!(a.downcast::<Pool>().unwrap().size, 8);
}

#[test]
fn transient_registrations_produce_fresh_instances() {
    init_tracing();
    let container = Container::builder()
        .bind_with("props::ISession", "props::Session", Args::new(), DependencyFlags::NONE)
        .transient_callback("props::Token", |_, _| Ok(Instance::new(String::from("token"))))
        .build()
        .unwrap();

    let a = container.resolve("props::ISession").unwrap();
    let b = container.resolve("props::ISession").unwrap();
    assert!(!a.ptr_eq(&b));

    let a = container.resolve("props::Token").unwrap();
    let b = container.resolve("props::Token").unwrap();
    assert!(!a.ptr_eq(&b));
}

#[test]
fn first_factory_wins_until_its_binding_is_removed() {
    init_tracing();
    let key = TypeKey::new("props::Endpoint");
    let container = Container::builder()
        .register(key.clone(), Descriptor::object(Instance::new("from registry")).transient())
        .factory(Fixed {
            key: key.clone(),
            value: Instance::new("from fixed"),
        })
        .build()
        .unwrap();

    assert_eq!(*container.get::<&str>(&key).unwrap(), "from registry");

    assert!(container.registration().unregister(&key));
    assert_eq!(*container.get::<&str>(&key).unwrap(), "from fixed");
}

#[test]
fn unregistered_class_falls_back_to_construction() {
    init_tracing();
    let container = Container::builder().build().unwrap();

    let session = container.resolve("props::Session").unwrap();
    assert!(session.is::<Session>());

    match container.resolve("props::Nothing") {
        Err(ContainerError::DependencyResolution(err)) => {
            assert_eq!(err.key.as_str(), "props::Nothing");
        }
        other => panic!("Expected DependencyResolution, got: {:?}", other.err()),
    }
}

#[test]
fn construction_sees_injected_fields() {
    init_tracing();
    let container = Container::builder().object("props::Logger", Logger).build().unwrap();

    let greeter: Greeter = container.create(Args::new()).unwrap();
    assert!(greeter.saw_logger);
}

#[test]
fn on_demand_field_resolves_once() {
    init_tracing();
    let container = Container::builder()
        .bind("props::ExpensiveResource", "props::ExpensiveResource")
        .build()
        .unwrap();

    let mut consumer = Consumer::allocate();
    let before = EXPENSIVE_BUILDS.load(Ordering::SeqCst);
    container.inject_into(&mut consumer).unwrap();

    assert!(consumer.resource.is_pending());
    assert_eq!(EXPENSIVE_BUILDS.load(Ordering::SeqCst) - before, 0);

    let first = consumer.resource.get().unwrap();
    assert_eq!(EXPENSIVE_BUILDS.load(Ordering::SeqCst) - before, 1);

    let second = consumer.resource.get().unwrap();
    assert_eq!(EXPENSIVE_BUILDS.load(Ordering::SeqCst) - before, 1);
    assert!(Arc::ptr_eq(&first, &second));
}

#[test]
fn service_receives_the_registered_logger() {
    init_tracing();
    let literal = Instance::new(Logger);
    let container = Container::builder()
        .instance("props::Logger", literal.clone())
        .bind_with("props::Service", "props::Service", Args::new(), DependencyFlags::SINGLETON)
        .build()
        .unwrap();

    let service = container.get::<Service>("props::Service").unwrap();
    let logger = service.logger.get().unwrap();
    assert!(literal.is_same(logger));
}

#[test]
fn derived_specs_qualify_relative_keys() {
    let spec = <Service as Injectable>::describe();
    assert_eq!(spec.name, "props::Service");
    assert_eq!(spec.points.len(), 1);
    assert_eq!(spec.points[0].target, Some("Logger"));

    let qualified = StdInjector::qualified_targets(&spec);
    assert_eq!(qualified[0].2, Some(TypeKey::new("props::Logger")));
}
