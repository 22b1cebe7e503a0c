//! Forwarding entries
//!
//! One `ForwardingEntry` exists per proxied export. Entries are statics
//! emitted by `forwarding_table!` and never change except for the
//! resolved address, which is filled in once and then only read.

use crate::shim::CallInfo;
use std::ffi::c_void;
use std::ptr::{self, NonNull};
use std::sync::atomic::{AtomicPtr, Ordering};

/// A word holding the resolved address of a real export
///
/// Null until resolved. The layout is a single pointer so trampolines
/// can load it directly.
#[repr(transparent)]
#[derive(Debug)]
pub struct ForwardSlot(AtomicPtr<c_void>);

impl ForwardSlot {
	/// Create an empty slot
	#[must_use]
	pub const fn new() -> Self {
		Self(AtomicPtr::new(ptr::null_mut()))
	}

	/// The stored address, if any
	#[must_use]
	pub fn load(&self) -> Option<NonNull<c_void>> {
		NonNull::new(self.0.load(Ordering::Acquire))
	}

	/// Store a resolved address
	///
	/// Every writer stores the same address for a given entry, so racing
	/// stores are harmless.
	pub fn store(&self, addr: NonNull<c_void>) {
		self.0.store(addr.as_ptr(), Ordering::Release);
	}
}

impl Default for ForwardSlot {
	fn default() -> Self {
		Self::new()
	}
}

/// How an entry reaches the real export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
	/// A typed Rust function that logs and calls through a function pointer
	Typed,
	/// A naked trampoline that jumps through the slot bound at attach
	Passthrough,
}

/// Static description of one proxied export
#[repr(C)]
#[derive(Debug)]
pub struct ForwardingEntry {
	/// Must stay the first field: passthrough trampolines load it at offset 0
	resolved: ForwardSlot,
	export: &'static str,
	symbol: &'static str,
	ordinal: Option<u16>,
	logged: bool,
	kind: EntryKind,
}

impl ForwardingEntry {
	/// An entry forwarded through a typed function pointer
	#[must_use]
	pub const fn typed(export: &'static str, symbol: &'static str) -> Self {
		Self {
			resolved: ForwardSlot::new(),
			export,
			symbol,
			ordinal: None,
			logged: true,
			kind: EntryKind::Typed,
		}
	}

	/// An entry forwarded by a tail jump
	#[must_use]
	pub const fn passthrough(export: &'static str, symbol: &'static str) -> Self {
		Self {
			resolved: ForwardSlot::new(),
			export,
			symbol,
			ordinal: None,
			logged: false,
			kind: EntryKind::Passthrough,
		}
	}

	/// Resolve by ordinal where the platform supports it
	#[must_use]
	pub const fn with_ordinal(mut self, ordinal: u16) -> Self {
		self.ordinal = Some(ordinal);
		self
	}

	/// Do not write call log lines for this entry
	#[must_use]
	pub const fn quiet(mut self) -> Self {
		self.logged = false;
		self
	}

	/// Name the shim exports
	#[must_use]
	pub const fn export(&self) -> &'static str {
		self.export
	}

	/// Name looked up in the real library
	#[must_use]
	pub const fn symbol(&self) -> &'static str {
		self.symbol
	}

	/// Ordinal looked up in the real library
	#[must_use]
	pub const fn ordinal(&self) -> Option<u16> {
		self.ordinal
	}

	/// Whether calls are written to the call log
	#[must_use]
	pub const fn is_logged(&self) -> bool {
		self.logged
	}

	/// How the entry reaches the real export
	#[must_use]
	pub const fn kind(&self) -> EntryKind {
		self.kind
	}

	/// Identity handed to hooks and filters
	#[must_use]
	pub const fn call_info(&self) -> CallInfo {
		CallInfo {
			export: self.export,
			symbol: self.symbol,
			ordinal: self.ordinal,
		}
	}

	/// The resolved address, if resolution already happened
	#[must_use]
	pub fn resolved(&self) -> Option<NonNull<c_void>> {
		self.resolved.load()
	}

	pub(crate) fn bind(&self, addr: NonNull<c_void>) {
		self.resolved.store(addr);
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	static ENTRY: ForwardingEntry = ForwardingEntry::typed("Add", "RealAdd").with_ordinal(3).quiet();

	#[test]
	fn builders_are_usable_in_statics() {
		assert_eq!(ENTRY.export(), "Add");
		assert_eq!(ENTRY.symbol(), "RealAdd");
		assert_eq!(ENTRY.ordinal(), Some(3));
		assert!(!ENTRY.is_logged());
		assert_eq!(ENTRY.kind(), EntryKind::Typed);
	}

	#[test]
	fn passthrough_entries_are_never_logged() {
		let entry = ForwardingEntry::passthrough("printf", "printf");
		assert!(!entry.is_logged());
		assert_eq!(entry.kind(), EntryKind::Passthrough);
	}

	#[test]
	fn slot_sits_at_offset_zero() {
		let entry = ForwardingEntry::typed("Add", "Add");
		let marker = NonNull::from(&entry).cast::<c_void>();
		entry.bind(marker);
		let first_word = unsafe { *(&entry as *const ForwardingEntry).cast::<*mut c_void>() };
		assert_eq!(first_word, marker.as_ptr());
		assert_eq!(entry.resolved(), Some(marker));
	}
}
