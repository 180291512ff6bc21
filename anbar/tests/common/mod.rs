use tracing_subscriber::EnvFilter;

/// Installs a test-friendly subscriber once per test binary.
pub fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("anbar_container=debug")))
        .with_test_writer()
        .try_init();
}
