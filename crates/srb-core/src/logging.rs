use tracing_subscriber::{fmt, EnvFilter};

/// Initialize tracing for the bot.
///
/// Default: info for everything. `RUST_LOG` overrides.
pub fn init(service_name: &str) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("info,{service_name}=info")));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(true)
        .init();
}
