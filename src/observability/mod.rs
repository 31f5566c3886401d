//! Logging setup

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Initialize tracing. `RUST_LOG` wins over `log_level` when set.
pub fn init_observability(log_level: &str, format: &str) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match format {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_target(false))
                .init();
        }
        "compact" => {
            registry
                .with(tracing_subscriber::fmt::layer().compact().with_target(false))
                .init();
        }
        _ => {
            registry
                .with(tracing_subscriber::fmt::layer().with_target(false))
                .init();
        }
    }
}
