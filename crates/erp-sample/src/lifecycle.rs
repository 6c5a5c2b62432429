//! Runtime wiring for the sample binary.

/// Initializes the tracing/logging infrastructure for the application.
///
/// Structured logging via the `tracing` crate, filtered through the
/// `RUST_LOG` environment variable:
/// - `RUST_LOG=info` - lifecycle events (actors created, disposed)
/// - `RUST_LOG=debug` - per-operation events (enqueued, completed)
/// - `RUST_LOG=erp_actor=debug` - debug only for the actor crate
pub fn setup_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
