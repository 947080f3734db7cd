//! Telemetry helpers for structured logging and tracing.

/// Initialize tracing/telemetry. Users can install their own subscriber; this
/// helper installs a default env-based subscriber if none is set. A `.env`
/// file is loaded first so `RUST_LOG` can be configured there.
pub fn init_tracing() {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    dotenvy::dotenv().ok();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .try_init();
}

/// Initialize tracing with an explicit filter directive, ignoring the
/// environment. Handy in tests and examples where `RUST_LOG` is not set.
pub fn init_tracing_with(filter: &str) {
    if tracing::dispatcher::has_been_set() {
        return;
    }
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::new(filter))
        .try_init();
}
