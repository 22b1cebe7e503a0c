//! Call hook traits and implementations
//!
//! A `CallHook` observes forwarded calls before they reach the real
//! library and receives the per-thread lifecycle events. Hooks are the
//! extension point for deployments that want more than the call log.

use tracing::debug;

/// Identity of a forwarded call
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CallInfo {
	/// Name the shim exports
	pub export: &'static str,
	/// Name looked up in the real library
	pub symbol: &'static str,
	/// Ordinal looked up in the real library, if any
	pub ordinal: Option<u16>,
}

/// Trait for observing forwarded calls
pub trait CallHook: Send + Sync {
	/// Called on the caller's thread before every typed forwarded call
	fn before_call(&self, _call: &CallInfo) {}

	/// Called when the loader reports a new thread
	fn on_thread_attach(&self) {}

	/// Called when the loader reports a thread exiting
	fn on_thread_detach(&self) {}

	/// Get the name of the hook
	///
	/// This is used for debugging and logging purposes.
	fn name(&self) -> &'static str {
		std::any::type_name::<Self>()
	}
}

/// Hook that traces every forwarded call through `tracing`
#[derive(Debug, Default)]
pub struct TracingHook;

impl TracingHook {
	/// Create a new `TracingHook`
	#[must_use]
	pub const fn new() -> Self {
		Self
	}
}

impl CallHook for TracingHook {
	fn before_call(&self, call: &CallInfo) {
		match call.ordinal {
			Some(ordinal) => debug!("Forwarding {} to {} (@{})", call.export, call.symbol, ordinal),
			None => debug!("Forwarding {} to {}", call.export, call.symbol),
		}
	}

	fn on_thread_attach(&self) {
		debug!("Thread attached: {:?}", std::thread::current().id());
	}

	fn on_thread_detach(&self) {
		debug!("Thread detached: {:?}", std::thread::current().id());
	}

	fn name(&self) -> &'static str {
		"TracingHook"
	}
}
