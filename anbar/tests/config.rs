//! Configuration-driven containers, naming conventions and providers.

mod common;

use std::sync::Arc;

use anbar::convention::{strip_interface_prefix, suffix};
use anbar::prelude::*;
use anbar::{AnbarConfig, ConventionFactory};
use common::init_tracing;

#[derive(Injectable)]
#[injectable(name = "cfg::SmtpMailer")]
struct SmtpMailer;

#[derive(Injectable)]
#[injectable(name = "cfg::SystemClock")]
struct SystemClock;

#[derive(Injectable)]
#[injectable(name = "cfg::Cache")]
struct Cache;

#[derive(Injectable)]
#[injectable(name = "cfg::StoreImpl")]
struct StoreImpl;

#[derive(Injectable)]
#[injectable(name = "cfg::Notifier")]
struct Notifier {
    #[inject(key = "IMailer")]
    mailer: Inject<SmtpMailer>,
}

const CONFIG: &str = r#"{
    "settings": { "validate_on_build": true },
    "bindings": [
        { "key": "cfg::IMailer", "class": "cfg::SmtpMailer" },
        { "key": "cfg::IClock", "class": "cfg::SystemClock", "singleton": false }
    ]
}"#;

#[test]
fn container_from_json_config() {
    init_tracing();
    let config: AnbarConfig = serde_json::from_str(CONFIG).unwrap();
    let container = Container::builder()
        .settings(config.settings.clone())
        .bindings(&config.bindings)
        .build()
        .unwrap();

    let a = container.resolve("cfg::IMailer").unwrap();
    let b = container.resolve("cfg::IMailer").unwrap();
    assert!(a.is::<SmtpMailer>());
    assert!(a.ptr_eq(&b));

    let a = container.resolve("cfg::IClock").unwrap();
    let b = container.resolve("cfg::IClock").unwrap();
    assert!(a.is::<SystemClock>());
    assert!(!a.ptr_eq(&b));

    let notifier = container.get::<Notifier>("cfg::Notifier").unwrap();
    let mailer = container.resolve("cfg::IMailer").unwrap();
    assert!(mailer.is_same(notifier.mailer.get().unwrap()));
}

#[test]
fn settings_control_fallback() {
    init_tracing();
    let config: AnbarConfig = serde_json::from_str(r#"{ "settings": { "fallback_construction": false } }"#).unwrap();
    let container = Container::builder().settings(config.settings).build().unwrap();

    assert!(matches!(
        container.resolve("cfg::Cache"),
        Err(ContainerError::DependencyResolution(_))
    ));
}

#[test]
fn convention_factories_map_interfaces() {
    init_tracing();
    let container = Container::builder()
        .factory(ConventionFactory::new(strip_interface_prefix, DependencyFlags::SINGLETON))
        .factory(ConventionFactory::new(suffix("Impl"), DependencyFlags::NONE))
        .build()
        .unwrap();

    let cache = container.resolve("cfg::ICache").unwrap();
    assert!(cache.is::<Cache>());
    assert!(cache.ptr_eq(&container.resolve("cfg::ICache").unwrap()));

    let store = container.resolve("cfg::Store").unwrap();
    assert!(store.is::<StoreImpl>());
    assert!(!store.ptr_eq(&container.resolve("cfg::Store").unwrap()));
}

struct MailProvider;

impl Provider for MailProvider {
    fn register(&self, registry: &mut dyn ProviderRegistry) {
        registry.register(
            TypeKey::new("cfg::IMailer"),
            Descriptor::class_name("cfg::SmtpMailer", Args::new()),
        );
        registry.register(
            TypeKey::new("cfg::Sender"),
            Descriptor::object(Instance::new(String::from("noreply@example.com"))),
        );
    }
}

#[test]
fn providers_register_into_the_builder() {
    init_tracing();
    let container = Container::builder().provider(&MailProvider).build().unwrap();

    let sender: Arc<String> = container.get("cfg::Sender").unwrap();
    assert_eq!(*sender, "noreply@example.com");
    assert!(container.resolve("cfg::IMailer").unwrap().is::<SmtpMailer>());
    assert!(container.validate().is_ok());
}
