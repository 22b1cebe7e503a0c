//! proxyshim - A framework for building load-time proxy shims
//!
//! A proxy shim is a shared library installed under the file name of a
//! real library. When the host process loads it, the shim loads the
//! real library from another path and forwards every proxied export to
//! it, appending a line per call to a log file in the working directory.
//!
//! # Getting Started
//!
//! ```ignore
//! use std::ffi::c_char;
//!
//! proxyshim::forwarding_table! {
//!     static TABLE;
//!
//!     pub unsafe extern "C" fn Add(a: i32, b: i32) -> i32;
//!
//!     #[log_args]
//!     #[on_missing(-1)]
//!     pub unsafe extern "C" fn Sub(a: i32, b: i32) -> i32;
//!
//!     // Variadic exports become passthrough trampolines
//!     pub unsafe extern "C" fn Format(buf: *mut c_char, fmt: *const c_char, ...) -> i32;
//! }
//!
//! proxyshim::entry_point!(TABLE, || {
//!     proxyshim::new()
//!         .real_library("/opt/real/libmath.so")
//!         .missing_export(proxyshim::MissingExportPolicy::Sentinel)
//! });
//! ```

pub mod lifecycle;
pub mod linkage;
pub mod loader;
pub mod shim;
pub mod sink;
pub mod table;
pub mod util;

pub use proxyshim_macros::forwarding_table;

pub use lifecycle::LifecycleEvent;
pub use loader::{LibraryLoader, RealLibrary, ShimIdentity, SystemLoader};
pub use shim::{
	AllowAllFilter, AllowListFilter, BlockListFilter, CallHook, CallInfo, ExportFilter, LibraryState,
	MissingExportPolicy, Result, ShimBuilder, ShimConfig, ShimContext, ShimError, TracingHook, active_table,
};
pub use sink::{LogLine, LogSink};
pub use table::{EntryKind, ForwardSlot, ForwardingEntry, ForwardingTable};

/// Create a new shim builder
#[must_use]
pub fn new() -> ShimBuilder {
	ShimBuilder::new()
}
