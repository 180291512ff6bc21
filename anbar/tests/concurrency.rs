//! Concurrent first resolution from many threads.

mod common;

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use anbar::prelude::*;
use common::init_tracing;

static DATABASE_BUILDS: AtomicUsize = AtomicUsize::new(0);

#[derive(Injectable)]
#[injectable(name = "conc::Database", construct = "Database::connect")]
struct Database;

impl Database {
    fn connect(&mut self, _args: &Args) -> Result<()> {
        DATABASE_BUILDS.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));
        Ok(())
    }
}

static REPORT_BUILDS: AtomicUsize = AtomicUsize::new(0);

#[derive(Injectable)]
#[injectable(name = "conc::Report", construct = "Report::render")]
struct Report;

impl Report {
    fn render(&mut self, _args: &Args) -> Result<()> {
        REPORT_BUILDS.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(20));
        Ok(())
    }
}

#[derive(Injectable)]
#[injectable(name = "conc::Dashboard")]
struct Dashboard {
    #[inject(on_demand, key = "Report")]
    report: OnDemand<Report>,
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn singleton_is_constructed_once_under_contention() {
    init_tracing();
    let container = Container::builder()
        .bind("conc::IDatabase", "conc::Database")
        .build()
        .unwrap();

    let tasks: Vec<_> = (0..16)
        .map(|_| {
            let container = container.clone();
            tokio::task::spawn_blocking(move || container.resolve("conc::IDatabase"))
        })
        .collect();

    let mut instances = Vec::new();
    for task in tasks {
        instances.push(task.await.unwrap().unwrap());
    }

    assert_eq!(DATABASE_BUILDS.load(Ordering::SeqCst), 1);
    assert!(instances.iter().all(|i| i.ptr_eq(&instances[0])));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn on_demand_first_read_is_idempotent() {
    init_tracing();
    // Transient, so every resolution of the key would construct again.
    let container = Container::builder()
        .bind_with("conc::Report", "conc::Report", Args::new(), DependencyFlags::NONE)
        .build()
        .unwrap();

    let dashboard: Arc<Dashboard> = Arc::new(container.create(Args::new()).unwrap());
    assert_eq!(REPORT_BUILDS.load(Ordering::SeqCst), 0);

    let tasks: Vec<_> = (0..8)
        .map(|_| {
            let dashboard = dashboard.clone();
            tokio::task::spawn_blocking(move || dashboard.report.get())
        })
        .collect();

    let mut reports = Vec::new();
    for task in tasks {
        reports.push(task.await.unwrap().unwrap());
    }

    assert_eq!(REPORT_BUILDS.load(Ordering::SeqCst), 1);
    assert!(reports.iter().all(|r| Arc::ptr_eq(r, &reports[0])));
}
