//! Logging prelude module for convenient access to tracing macros.
//!
//! # Usage
//!
//! ```ignore
//! use crate::logging::*;
//!
//! info!("Built live inventory");
//! warn!("Skipping unreadable directory");
//! ```

pub use tracing::{debug, error, info, warn};

/// Initialize the tracing subscriber with environment filter support.
///
/// Logs always go to stderr so that stdout carries nothing but reports.
/// `RUST_LOG` takes precedence over `default_level`:
///
/// ```bash
/// RUST_LOG=debug archdiff status
/// RUST_LOG=archdiff::reconcile=debug archdiff status
/// ```
pub fn init_tracing(default_level: &str) {
	let _ = tracing_subscriber::fmt()
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
		)
		.with_writer(std::io::stderr)
		.try_init();
}

/// Log a skipped node at `warn`, or at `debug` when the user asked for quiet.
macro_rules! skip_log {
	($quiet:expr, $($arg:tt)+) => {
		if $quiet {
			tracing::debug!($($arg)+);
		} else {
			tracing::warn!($($arg)+);
		}
	};
}

pub(crate) use skip_log;

// vim: ts=4
