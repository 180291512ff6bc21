//! Basic example of the Anbar container.

use anbar::prelude::*;

// === Define your types ===

#[derive(Injectable)]
struct ConsoleLogger;

impl ConsoleLogger {
    fn log(&self, msg: &str) {
        println!("[LOG] {msg}");
    }
}

struct Config {
    database_url: String,
}

#[derive(Injectable)]
#[injectable(construct = "Database::connect")]
struct Database {
    #[inject(key = "ILogger")]
    logger: Inject<ConsoleLogger>,
    #[inject(key = "Config")]
    config: Inject<Config>,
    url: String,
}

impl Database {
    fn connect(&mut self, _args: &Args) -> Result<()> {
        // Injected fields are already populated here.
        self.url = self.config.get()?.database_url.clone();
        self.logger.get()?.log(&format!("Connected to {}", self.url));
        Ok(())
    }

    fn query(&self, sql: &str) -> Result<String> {
        self.logger.get()?.log(&format!("Executing: {sql}"));
        Ok(format!("Results from {}", self.url))
    }
}

struct Mailer;

#[derive(Injectable)]
struct UserService {
    #[inject(key = "IDatabase")]
    db: Inject<Database>,
    #[inject(on_demand, key = "Mailer")]
    mailer: OnDemand<Mailer>,
}

impl UserService {
    fn get_user(&self, id: u64) -> Result<String> {
        self.db.get()?.query(&format!("SELECT * FROM users WHERE id = {id}"))
    }
}

fn key(name: &str) -> TypeKey {
    TypeKey::new(format!("{}::{name}", module_path!()))
}

fn main() -> Result<()> {
    // Initialize tracing (logging)
    tracing_subscriber::fmt()
        .with_env_filter("anbar_container=debug")
        .init();

    let container = Container::builder()
        .object(key("Config"), Config {
            database_url: "postgres://localhost/myapp".to_string(),
        })
        .bind(key("ILogger"), key("ConsoleLogger"))
        .bind(key("IDatabase"), key("Database"))
        .callback(key("Mailer"), |_, _| {
            println!("[MAIL] Mailer created on first use");
            Ok(Instance::new(Mailer))
        })
        .build()?;

    container.validate()?;

    let service = container.get_class::<UserService>()?;
    println!("{}", service.get_user(42)?);

    println!("Mailer resolved yet? {}", service.mailer.is_resolved());
    service.mailer.get()?;
    println!("Mailer resolved yet? {}", service.mailer.is_resolved());

    Ok(())
}
