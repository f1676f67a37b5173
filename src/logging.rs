//! Tracing subscriber setup for binaries and tests embedding the core.
//!
//! The library only emits `tracing` events; installing a subscriber is left
//! to the host. `init` is idempotent.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the filter directive (e.g. `meridian=debug`).
pub const LOG_ENV: &str = "MERIDIAN_LOG";

/// Install a stderr fmt subscriber filtered by `MERIDIAN_LOG` (default `warn`).
///
/// Returns false when a global subscriber was already installed.
pub fn init() -> bool {
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_is_idempotent() {
        let _ = init();
        assert!(!init(), "second install must report the existing subscriber");
    }
}
