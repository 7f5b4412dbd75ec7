/// Initializes the tracing subscriber for logging.
///
/// Filtering follows `RUST_LOG` (e.g. `RUST_LOG=ferrite_classify=debug` to
/// see per-stage timings). Calling it twice is harmless.
pub fn init_tracing() {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let _ = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env())
        .with(tracing_subscriber::fmt::layer())
        .try_init();
}
