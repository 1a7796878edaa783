//! Tracing setup.
//!
//! `RUST_LOG` wins over the configured filter:
//!
//! ```text
//! RUST_LOG=spark_shell=trace my-bar    # every node allocation and rebuild
//! ```

use tracing_subscriber::EnvFilter;

/// Install a compact fmt subscriber filtered by `RUST_LOG`, else `filter`.
///
/// Returns false when a global subscriber was already installed.
pub fn init(filter: &str) -> bool {
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(filter))
        .unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .try_init()
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_init_is_noop() {
        init("warn");
        assert!(!init("debug"));
    }
}
