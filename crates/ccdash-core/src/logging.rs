//! `tracing` subscriber setup.

use tracing_subscriber::EnvFilter;

/// Default filter when neither the caller nor `RUST_LOG` supplies one.
pub const DEFAULT_LEVEL: &str = "info";

/// Initialize the global tracing subscriber with compact stderr output.
///
/// `RUST_LOG` takes precedence over `level`. Subsequent calls are no-ops.
pub fn init_subscriber(level: &str) {
    let level = if level.trim().is_empty() { DEFAULT_LEVEL } else { level };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .compact();

    // set_global_default fails if already set
    let _ = subscriber.try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_subscriber_is_repeatable() {
        init_subscriber("warn");
        init_subscriber("debug");
        init_subscriber("");
    }
}
