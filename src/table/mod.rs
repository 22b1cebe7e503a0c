//! Forwarding table
//!
//! A `ForwardingTable` is the set of exports a shim proxies together
//! with the process context they all read. The table is a static; the
//! context inside it is created exactly once, at process attach, and
//! is read-only afterwards, so forwarding entries can consult it from
//! any thread without further locking.

mod entry;
mod trampoline;

pub use entry::{EntryKind, ForwardSlot, ForwardingEntry};
#[doc(hidden)]
pub use trampoline::passthrough_unresolved;

use crate::loader::ShimIdentity;
use crate::shim::{MissingExportPolicy, Result, ShimBuilder, ShimContext, ShimError};
use crate::sink::LogLine;
use once_cell::sync::OnceCell;
use std::ffi::c_void;
use std::ptr::NonNull;
use std::sync::atomic::{AtomicBool, Ordering};
use tracing::{debug, error, info, warn};

/// The exports of one shim and the context they forward through
pub struct ForwardingTable {
	name: &'static str,
	entries: &'static [&'static ForwardingEntry],
	context: OnceCell<ShimContext>,
	detached: AtomicBool,
}

impl std::fmt::Debug for ForwardingTable {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("ForwardingTable")
			.field("name", &self.name)
			.field("entries", &self.entries.len())
			.field("context", &self.context.get())
			.field("detached", &self.detached.load(Ordering::Relaxed))
			.finish()
	}
}

impl ForwardingTable {
	/// Create a table over a fixed set of entries
	#[must_use]
	pub const fn new(name: &'static str, entries: &'static [&'static ForwardingEntry]) -> Self {
		Self {
			name,
			entries,
			context: OnceCell::new(),
			detached: AtomicBool::new(false),
		}
	}

	/// Name of the table, for diagnostics
	#[must_use]
	pub const fn name(&self) -> &'static str {
		self.name
	}

	/// All entries of the table
	#[must_use]
	pub const fn entries(&self) -> &'static [&'static ForwardingEntry] {
		self.entries
	}

	/// Find an entry by its exported name
	#[must_use]
	pub fn entry(&self, export: &str) -> Option<&'static ForwardingEntry> {
		self.entries.iter().copied().find(|entry| entry.export() == export)
	}

	/// The process context, once attached
	#[must_use]
	pub fn context(&self) -> Option<&ShimContext> {
		self.context.get()
	}

	/// Whether process detach has been seen
	#[must_use]
	pub fn is_detached(&self) -> bool {
		self.detached.load(Ordering::Acquire)
	}

	/// Build the process context and bind the table to it
	///
	/// The real library is loaded at most once per table: a second
	/// attach leaves the first context in place and reports
	/// `AlreadyAttached`. Failing to load the library is not an error;
	/// the context records it and forwarding calls fail.
	pub fn attach(&'static self, builder: ShimBuilder, identity: ShimIdentity) -> Result<&'static ShimContext> {
		let mut fresh = false;
		let context = self.context.get_or_init(|| {
			fresh = true;
			builder.build(identity)
		});
		if !fresh {
			return Err(ShimError::AlreadyAttached);
		}

		crate::shim::set_active_table(self);
		self.bind_entries(context);

		info!(
			"Forwarding table {} attached with {} entries (resolved: {})",
			self.name,
			self.entries.len(),
			context.is_resolved()
		);
		Ok(context)
	}

	/// Bind passthrough slots and, if configured, every typed entry
	fn bind_entries(&self, context: &ShimContext) {
		if !context.is_resolved() {
			return;
		}

		for entry in self.entries {
			let eager = entry.kind() == EntryKind::Passthrough || context.config().eager;
			if !eager {
				continue;
			}
			match self.lookup(entry) {
				Ok(addr) => debug!("Bound {} to {:p}", entry.export(), addr),
				Err(e) => warn!("Export {} cannot be forwarded: {}", entry.export(), e),
			}
		}
	}

	/// Run hooks for a thread the loader reports as new
	pub fn thread_attach(&self) {
		if let Some(context) = self.context.get() {
			for hook in context.hooks() {
				hook.on_thread_attach();
			}
		}
	}

	/// Run hooks for a thread the loader reports as exiting
	pub fn thread_detach(&self) {
		if let Some(context) = self.context.get() {
			for hook in context.hooks() {
				hook.on_thread_detach();
			}
		}
	}

	/// Note process detach
	///
	/// Nothing is released; the process is going away. Later calls still
	/// forward but no longer log.
	pub fn detach(&self) {
		self.detached.store(true, Ordering::Release);
	}

	/// Observe a call to `entry`: run hooks and write the log line
	pub fn enter(&self, entry: &ForwardingEntry) {
		self.observe(entry, None::<fn() -> String>);
	}

	/// Like `enter`, with an argument summary rendered only if logged
	pub fn enter_with<F: FnOnce() -> String>(&self, entry: &ForwardingEntry, args: F) {
		self.observe(entry, Some(args));
	}

	fn observe<F: FnOnce() -> String>(&self, entry: &ForwardingEntry, args: Option<F>) {
		if self.is_detached() {
			return;
		}
		let Some(context) = self.context.get() else {
			return;
		};

		let call = entry.call_info();
		for hook in context.hooks() {
			hook.before_call(&call);
		}

		if !entry.is_logged() {
			return;
		}
		let Some(sink) = context.sink() else {
			return;
		};
		if !context.filter().allow_export(&call) {
			return;
		}

		let line = match args {
			Some(args) => LogLine::call_with_args(entry.export(), &args()),
			None => LogLine::call(entry.export()),
		};
		sink.append(&line);
	}

	/// Resolve the real address of `entry`
	///
	/// The first successful lookup is cached in the entry. Ordinals fall
	/// back to the symbol name on platforms without ordinal lookup.
	pub fn lookup(&self, entry: &ForwardingEntry) -> Result<NonNull<c_void>> {
		if let Some(addr) = entry.resolved() {
			return Ok(addr);
		}

		let context = self.context.get().ok_or(ShimError::NotAttached)?;
		let library = context.library()?;
		let addr = match entry.ordinal() {
			Some(ordinal) => match library.ordinal(ordinal) {
				Err(ShimError::OrdinalUnsupported(_)) => library.symbol(entry.symbol()),
				other => other,
			},
			None => library.symbol(entry.symbol()),
		}?;

		entry.bind(addr);
		Ok(addr)
	}

	/// Resolve `entry` or abort the process
	pub fn target(&self, entry: &ForwardingEntry) -> NonNull<c_void> {
		match self.lookup(entry) {
			Ok(addr) => addr,
			Err(e) => self.forwarding_failed(entry, &e),
		}
	}

	/// Resolve `entry`, or return `None` when the caller may use its sentinel
	///
	/// `None` is only returned under `MissingExportPolicy::Sentinel`;
	/// every other failure aborts.
	pub fn try_target(&self, entry: &ForwardingEntry) -> Option<NonNull<c_void>> {
		let error = match self.lookup(entry) {
			Ok(addr) => return Some(addr),
			Err(e) => e,
		};

		let policy = self.context.get().map(|c| c.config().missing_export);
		if policy != Some(MissingExportPolicy::Sentinel) {
			self.forwarding_failed(entry, &error);
		}

		warn!("Forwarding {} failed, returning its sentinel: {}", entry.export(), error);
		self.log_failure(entry, &error);
		None
	}

	/// Report a forwarding failure and abort
	pub fn forwarding_failed(&self, entry: &ForwardingEntry, error: &ShimError) -> ! {
		error!("Forwarding {} failed: {}", entry.export(), error);
		self.log_failure(entry, error);
		std::process::abort()
	}

	fn log_failure(&self, entry: &ForwardingEntry, error: &ShimError) {
		if let Some(sink) = self.context.get().and_then(ShimContext::sink) {
			sink.append(&LogLine::failure(entry.export(), error));
		}
	}
}
