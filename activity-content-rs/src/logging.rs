//! Logger setup for binaries, demos and tests

use env_logger::{Builder, Env};

/// Install `env_logger` with an `info` default, overridable through `RUST_LOG`
///
/// Safe to call more than once; only the first call installs a logger.
pub fn init_logging() {
    let installed = Builder::from_env(Env::default().default_filter_or("info"))
        .format_timestamp_millis()
        .try_init()
        .is_ok();

    if installed {
        log::debug!("Logging initialized");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_init_logging_is_idempotent() {
        init_logging();
        init_logging();
        log::info!("still logging");
    }
}
