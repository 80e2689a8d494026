//! Logging setup.
//!
//! All logs go to **stderr**: stdout belongs to the runtime handshake.
//! Filtering follows `RUST_LOG` and falls back to a default level.
//!
//! ```bash
//! # request-level logging for the provider only
//! RUST_LOG=controlplane_provider=debug ./provider
//!
//! # also show HTTP client internals
//! RUST_LOG=debug,hyper=info ./provider
//! ```
//!
//! At `debug`, every lifecycle call logs entry, exit and the decoded
//! control-plane response.

use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Level used when `RUST_LOG` is unset or invalid.
pub const DEFAULT_LOG_LEVEL: &str = "info";

fn env_filter(default_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

fn try_install(default_level: &str) -> Result<(), tracing_subscriber::util::TryInitError> {
    tracing_subscriber::registry()
        .with(env_filter(default_level))
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false),
        )
        .try_init()
}

/// Install the global subscriber at [`DEFAULT_LOG_LEVEL`].
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging() {
    init_logging_with_default(DEFAULT_LOG_LEVEL);
}

/// Install the global subscriber, using `default_level` when `RUST_LOG` is
/// unset.
///
/// # Panics
///
/// Panics if a global subscriber has already been set.
pub fn init_logging_with_default(default_level: &str) {
    if let Err(e) = try_install(default_level) {
        panic!("failed to install the logging subscriber: {}", e);
    }
}

/// Install the global subscriber unless one is already set. Returns whether
/// this call installed it.
pub fn try_init_logging() -> bool {
    try_install(DEFAULT_LOG_LEVEL).is_ok()
}
