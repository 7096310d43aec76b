//! Conditional logging macros gated by a module-level `ENABLE_LOGS` flag and
//! routed to a module-level `LOG_TAG` target.
//!
//! Usage:
//! ```ignore
//! const ENABLE_LOGS: bool = true;
//! const LOG_TAG: &str = "docforensics::signal";
//!
//! use crate::{log_info, log_warn};
//!
//! log_info!("page {} analyzed", index);
//! ```
//!
//! Filtering by target works with `RUST_LOG`, e.g.
//! `RUST_LOG=docforensics::signal=debug`.

/// Install `env_logger` with an `info` default level. `RUST_LOG` overrides it.
///
/// Safe to call more than once; only the first call installs the logger.
pub fn init() {
    let env = env_logger::Env::default().default_filter_or("info");
    if env_logger::Builder::from_env(env).try_init().is_ok() {
        log::info!("docforensics logging initialized");
    }
}

/// Conditional info logging.
#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::info!(target: LOG_TAG, $($arg)*);
        }
    };
}

/// Conditional warn logging.
#[macro_export]
macro_rules! log_warn {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::warn!(target: LOG_TAG, $($arg)*);
        }
    };
}

/// Conditional error logging.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::error!(target: LOG_TAG, $($arg)*);
        }
    };
}

/// Conditional debug logging, for per-page and per-rule detail.
#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => {
        if ENABLE_LOGS {
            log::debug!(target: LOG_TAG, $($arg)*);
        }
    };
}
