//! Shim context
//!
//! This module contains the `ShimContext` struct, which holds the state
//! every forwarding entry reads: the real library (or the reason it is
//! missing), the call log, and the observers. A context is built once,
//! at process attach, and is never mutated afterwards.

use crate::loader::{LibraryLoader, RealLibrary, ShimIdentity, check_real_path};
use crate::shim::builder::ShimConfig;
use crate::shim::error::{Result, ShimError};
use crate::shim::filter::ExportFilter;
use crate::shim::hook::CallHook;
use crate::sink::LogSink;
use tracing::{info, warn};

/// The outcome of loading the real library
pub enum LibraryState {
	/// The library is loaded
	Resolved(Box<dyn RealLibrary>),
	/// The library could not be loaded; forwarding calls fail
	Unresolved(ShimError),
}

impl std::fmt::Debug for LibraryState {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Resolved(library) => f.debug_tuple("Resolved").field(&library.path()).finish(),
			Self::Unresolved(error) => f.debug_tuple("Unresolved").field(error).finish(),
		}
	}
}

/// Process-wide state of an attached shim
pub struct ShimContext {
	/// The configuration the shim was attached with
	config: ShimConfig,
	/// The real library
	library: LibraryState,
	/// The call log
	sink: Option<LogSink>,
	/// The filter for logged calls
	filter: Box<dyn ExportFilter>,
	/// Observers for forwarded calls
	hooks: Vec<Box<dyn CallHook>>,
}

impl std::fmt::Debug for ShimContext {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ShimContext")
			.field("config", &self.config)
			.field("library", &self.library)
			.field("sink", &self.sink.as_ref().map(LogSink::path))
			.field("filter_type", &self.filter.name())
			.field("hooks_count", &self.hooks.len())
			.finish()
	}
}

impl ShimContext {
	/// Create a context, loading the real library with `loader`
	#[must_use]
	pub fn new(
		config: ShimConfig,
		loader: &dyn LibraryLoader,
		identity: ShimIdentity,
		hooks: Vec<Box<dyn CallHook>>,
		filter: Box<dyn ExportFilter>,
	) -> Self {
		let library = match resolve(&config, loader, identity) {
			Ok(library) => {
				info!("Real library loaded from {}", library.path().display());
				LibraryState::Resolved(library)
			},
			Err(e) => {
				warn!("Real library unresolved, forwarded calls will fail: {}", e);
				LibraryState::Unresolved(e)
			},
		};

		let sink = config.log_file.as_ref().map(LogSink::new);

		Self {
			config,
			library,
			sink,
			filter,
			hooks,
		}
	}

	/// The configuration the shim was attached with
	#[must_use]
	pub const fn config(&self) -> &ShimConfig {
		&self.config
	}

	/// The state of the real library
	#[must_use]
	pub const fn library_state(&self) -> &LibraryState {
		&self.library
	}

	/// The real library, or why it is missing
	pub fn library(&self) -> Result<&dyn RealLibrary> {
		match &self.library {
			LibraryState::Resolved(library) => Ok(library.as_ref()),
			LibraryState::Unresolved(error) => Err(ShimError::Unresolved(error.to_string())),
		}
	}

	/// Whether the real library is loaded
	#[must_use]
	pub const fn is_resolved(&self) -> bool {
		matches!(self.library, LibraryState::Resolved(_))
	}

	/// The call log, if enabled
	#[must_use]
	pub const fn sink(&self) -> Option<&LogSink> {
		self.sink.as_ref()
	}

	/// The filter for logged calls
	#[must_use]
	pub fn filter(&self) -> &dyn ExportFilter {
		self.filter.as_ref()
	}

	/// Observers for forwarded calls
	#[must_use]
	pub fn hooks(&self) -> &[Box<dyn CallHook>] {
		&self.hooks
	}
}

fn resolve(config: &ShimConfig, loader: &dyn LibraryLoader, identity: ShimIdentity) -> Result<Box<dyn RealLibrary>> {
	let path = config.real_library.as_deref().ok_or(ShimError::NoRealLibrary)?;
	let own_path = identity.path();
	check_real_path(path, own_path.as_deref(), config.allow_search_path)?;

	info!("Loading real library {} with {}", path.display(), loader.name());
	loader.load(path)
}
