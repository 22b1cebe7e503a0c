//! Export filtering
//!
//! This module contains the `ExportFilter` trait and implementations
//! for common filters. A filter decides which forwarded calls are
//! written to the call log; it never affects forwarding itself.

use crate::shim::hook::CallInfo;

/// Trait for filtering logged exports
pub trait ExportFilter: Send + Sync {
	/// Determine if a call to this export should be logged
	fn allow_export(&self, call: &CallInfo) -> bool;

	/// Get the name of the filter
	///
	/// This is used for debugging and logging purposes.
	fn name(&self) -> &'static str {
		std::any::type_name::<Self>()
	}
}

/// Filter that logs every export
#[derive(Debug, Clone, Default)]
pub struct AllowAllFilter;

impl AllowAllFilter {
	/// Create a new `AllowAllFilter`
	#[must_use]
	pub const fn new() -> Self {
		Self
	}
}

impl ExportFilter for AllowAllFilter {
	fn allow_export(&self, _call: &CallInfo) -> bool {
		true
	}

	fn name(&self) -> &'static str {
		"AllowAllFilter"
	}
}

/// Filter that logs only the listed exports
///
/// Names are compared case-insensitively, the way export lists handed
/// over from the command line usually are.
#[derive(Debug, Clone, Default)]
pub struct AllowListFilter {
	allowed: Vec<String>,
}

impl AllowListFilter {
	/// Create a new `AllowListFilter` with the specified export names
	pub fn new<S: Into<String>>(exports: impl IntoIterator<Item = S>) -> Self {
		Self {
			allowed: exports.into_iter().map(Into::into).collect(),
		}
	}

	/// Add an export to the allow list
	pub fn allow(&mut self, export: impl Into<String>) -> &mut Self {
		self.allowed.push(export.into());
		self
	}
}

impl ExportFilter for AllowListFilter {
	fn allow_export(&self, call: &CallInfo) -> bool {
		self.allowed.iter().any(|name| name.eq_ignore_ascii_case(call.export))
	}

	fn name(&self) -> &'static str {
		"AllowListFilter"
	}
}

/// Filter that logs everything except the listed exports
#[derive(Debug, Clone, Default)]
pub struct BlockListFilter {
	blocked: Vec<String>,
}

impl BlockListFilter {
	/// Create a new `BlockListFilter` with the specified export names
	pub fn new<S: Into<String>>(exports: impl IntoIterator<Item = S>) -> Self {
		Self {
			blocked: exports.into_iter().map(Into::into).collect(),
		}
	}

	/// Add an export to the block list
	pub fn block(&mut self, export: impl Into<String>) -> &mut Self {
		self.blocked.push(export.into());
		self
	}
}

impl ExportFilter for BlockListFilter {
	fn allow_export(&self, call: &CallInfo) -> bool {
		!self.blocked.iter().any(|name| name.eq_ignore_ascii_case(call.export))
	}

	fn name(&self) -> &'static str {
		"BlockListFilter"
	}
}
