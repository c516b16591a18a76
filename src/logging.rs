use tracing_subscriber::EnvFilter;

/// install the global subscriber
///
/// `RUST_LOG` wins over the configured level, e.g.
/// RUST_LOG=smokedash=debug,tungstenite=warn
pub fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(level))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .compact()
        .try_init();
}
