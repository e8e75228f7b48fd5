use std::io;
use tracing_subscriber::{fmt, EnvFilter};

fn env_filter(default: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Compact human-readable logs on stdout. `RUST_LOG` overrides the default
/// `info` filter. Safe to call more than once; later calls are no-ops.
pub fn init_logging_default() {
    let _ = fmt()
        .with_env_filter(env_filter("info"))
        .with_target(false)
        .compact()
        .with_writer(io::stdout)
        .try_init();
}

/// Structured JSON logs on stdout for container deployments, with
/// service-layer debug enabled unless `RUST_LOG` says otherwise.
pub fn init_logging_json() {
    let _ = fmt()
        .with_env_filter(env_filter("info,service=debug"))
        .with_target(false)
        .json()
        .with_writer(io::stdout)
        .try_init();
}
