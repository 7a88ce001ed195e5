//! Tracing subscriber setup for binaries and services embedding the engine.

use tracing_subscriber::EnvFilter;

/// Default filter when `RUST_LOG` is unset.
pub const DEFAULT_FILTER: &str = "info,mercado=debug,sqlx=warn";

/// Installs the global fmt subscriber.
///
/// Honors `RUST_LOG`, falling back to [`DEFAULT_FILTER`]. Calling it again
/// after a subscriber is installed does nothing.
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    // Err only means a global subscriber already exists
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        init_tracing();
        init_tracing();
        tracing::info!("still logging");
    }
}
