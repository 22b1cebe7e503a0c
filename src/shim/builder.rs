//! Builder for configuring shims
//!
//! This module contains the `ShimBuilder` struct and related
//! functionality for configuring how a shim finds its real library,
//! where it logs, and how it reacts to missing exports.

use crate::loader::{LibraryLoader, ShimIdentity, SystemLoader};
use crate::shim::context::ShimContext;
use crate::shim::filter::{AllowAllFilter, ExportFilter};
use crate::shim::hook::{CallHook, TracingHook};
use std::ffi::OsString;
use std::path::PathBuf;

/// Environment variable overriding the real library path
pub const ENV_REAL_LIBRARY: &str = "PROXYSHIM_REAL_LIBRARY";
/// Environment variable overriding the call log path
pub const ENV_LOG_FILE: &str = "PROXYSHIM_LOG_FILE";
/// Environment variable disabling the call log
pub const ENV_NO_LOG: &str = "PROXYSHIM_NO_LOG";

/// Call log file name used when none is configured
pub const DEFAULT_LOG_FILE: &str = "proxyshim.log";

/// What a forwarding entry does when its real export cannot be found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingExportPolicy {
	/// Log the failure and abort the process
	#[default]
	Abort,
	/// Return the sentinel the entry declares; entries without one abort
	Sentinel,
}

/// Configuration for a shim
#[derive(Debug, Clone)]
pub struct ShimConfig {
	/// Path of the real library
	pub real_library: Option<PathBuf>,
	/// Path of the call log, `None` to disable it
	pub log_file: Option<PathBuf>,
	/// Reaction to missing exports and to an unresolved library
	pub missing_export: MissingExportPolicy,
	/// Whether to resolve every export at attach instead of on first call
	pub eager: bool,
	/// Whether a bare library name may go through the loader search path
	pub allow_search_path: bool,
	/// Whether to trace forwarded calls through `tracing`
	pub trace: bool,
	/// Whether the `PROXYSHIM_*` environment variables apply
	pub env_overrides: bool,
}

impl Default for ShimConfig {
	fn default() -> Self {
		Self {
			real_library: None,
			log_file: Some(PathBuf::from(DEFAULT_LOG_FILE)),
			missing_export: MissingExportPolicy::Abort,
			eager: false,
			allow_search_path: false,
			trace: false,
			env_overrides: true,
		}
	}
}

impl ShimConfig {
	/// Apply the `PROXYSHIM_*` overrides from the process environment
	pub fn apply_env(&mut self) {
		self.apply_overrides(|key| std::env::var_os(key));
	}

	/// Apply overrides from an arbitrary variable lookup
	pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<OsString>) {
		if let Some(path) = lookup(ENV_REAL_LIBRARY).filter(|v| !v.is_empty()) {
			self.real_library = Some(PathBuf::from(path));
		}
		if let Some(path) = lookup(ENV_LOG_FILE).filter(|v| !v.is_empty()) {
			self.log_file = Some(PathBuf::from(path));
		}
		if lookup(ENV_NO_LOG).is_some() {
			self.log_file = None;
		}
	}
}

/// Builder for creating shims
///
/// Deployments hand a builder to the lifecycle controller, which turns
/// it into the process context at attach time.
pub struct ShimBuilder {
	/// The configuration for the shim
	config: ShimConfig,
	/// Observers for forwarded calls
	hooks: Vec<Box<dyn CallHook>>,
	/// The filter for logged calls
	filter: Option<Box<dyn ExportFilter>>,
	/// How the real library is opened
	loader: Option<Box<dyn LibraryLoader>>,
}

impl Default for ShimBuilder {
	fn default() -> Self {
		Self::new()
	}
}

impl std::fmt::Debug for ShimBuilder {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ShimBuilder")
			.field("config", &self.config)
			.field("hooks", &format!("[{} hooks]", self.hooks.len()))
			.field("filter", &self.filter.as_ref().map(|f| f.name()))
			.field("loader", &self.loader.as_ref().map(|l| l.name()))
			.finish()
	}
}

impl ShimBuilder {
	/// Create a new shim builder with default settings
	#[must_use]
	pub fn new() -> Self {
		Self {
			config: ShimConfig::default(),
			hooks: Vec::new(),
			filter: None,
			loader: None,
		}
	}

	/// Set the path of the real library
	#[must_use]
	pub fn real_library(mut self, path: impl Into<PathBuf>) -> Self {
		self.config.real_library = Some(path.into());
		self
	}

	/// Set the path of the call log
	#[must_use]
	pub fn log_file(mut self, path: impl Into<PathBuf>) -> Self {
		self.config.log_file = Some(path.into());
		self
	}

	/// Disable the call log
	#[must_use]
	pub fn no_log(mut self) -> Self {
		self.config.log_file = None;
		self
	}

	/// Choose the reaction to missing exports
	#[must_use]
	pub const fn missing_export(mut self, policy: MissingExportPolicy) -> Self {
		self.config.missing_export = policy;
		self
	}

	/// Resolve every export at attach
	#[must_use]
	pub const fn eager(mut self, eager: bool) -> Self {
		self.config.eager = eager;
		self
	}

	/// Allow a bare library name to go through the loader search path
	#[must_use]
	pub const fn allow_search_path(mut self, allow: bool) -> Self {
		self.config.allow_search_path = allow;
		self
	}

	/// Enable or disable call tracing
	#[must_use]
	pub const fn trace(mut self, trace: bool) -> Self {
		self.config.trace = trace;
		self
	}

	/// Enable or disable the `PROXYSHIM_*` environment overrides
	#[must_use]
	pub const fn env_overrides(mut self, enabled: bool) -> Self {
		self.config.env_overrides = enabled;
		self
	}

	/// Add a call hook
	#[must_use]
	pub fn hook<H: CallHook + 'static>(mut self, hook: H) -> Self {
		self.hooks.push(Box::new(hook));
		self
	}

	/// Set the filter for logged calls
	#[must_use]
	pub fn filter<F: ExportFilter + 'static>(mut self, filter: F) -> Self {
		self.filter = Some(Box::new(filter));
		self
	}

	/// Set the loader used for the real library
	#[must_use]
	pub fn loader<L: LibraryLoader + 'static>(mut self, loader: L) -> Self {
		self.loader = Some(Box::new(loader));
		self
	}

	/// The configuration collected so far
	#[must_use]
	pub const fn config(&self) -> &ShimConfig {
		&self.config
	}

	/// Build the process context, loading the real library
	///
	/// Failing to load the library is not an error here: the context
	/// records the library as unresolved and forwarding calls fail.
	#[must_use]
	pub fn build(self, identity: ShimIdentity) -> ShimContext {
		let mut config = self.config;
		if config.env_overrides {
			config.apply_env();
		}

		let mut hooks = self.hooks;
		if config.trace {
			hooks.push(Box::new(TracingHook::new()));
		}

		let filter = self.filter.unwrap_or_else(|| Box::new(AllowAllFilter::new()));
		let loader = self.loader.unwrap_or_else(|| Box::new(SystemLoader::new()));

		ShimContext::new(config, loader.as_ref(), identity, hooks, filter)
	}
}
