//! Diagnostic logging for proxyshim
//!
//! These are developer diagnostics on stderr, separate from the call log
//! the shim writes for the host process.

use std::sync::Once;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

/// Environment variable raising diagnostics to debug level
pub const ENV_DEBUG: &str = "PROXYSHIM_DEBUG";

// Initialize logging once
static INIT: Once = Once::new();

/// Initialize the tracing system
///
/// This function sets up tracing with an `EnvFilter` that:
/// - Honors the `RUST_LOG` environment variable if set
/// - Uses the `PROXYSHIM_DEBUG` environment variable to control logging level
/// - Only logs warnings and errors by default
///
/// A host that already installed a global subscriber keeps it.
pub fn init_logging() {
	INIT.call_once(|| {
		let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter(std::env::var_os(ENV_DEBUG).is_some()));

		let _ = tracing_subscriber::registry()
			.with(fmt::layer().with_target(true).with_writer(std::io::stderr))
			.with(filter)
			.try_init();
	});
}

fn default_filter(debug: bool) -> EnvFilter {
	if debug {
		EnvFilter::new("proxyshim=debug")
	} else {
		EnvFilter::new("proxyshim=warn")
	}
}
