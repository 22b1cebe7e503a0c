//! Module lifecycle
//!
//! The loader notifies the shim of four events. Process attach builds
//! the context and loads the real library; the thread events are handed
//! to the configured hooks; process detach only flags the table, since
//! the loader lock is held and the process is going away anyway.
//!
//! `entry_point!` wires a table to the platform's notification
//! mechanism: `DllMain` on Windows, `.init_array`/`.fini_array`
//! elsewhere. Unix loaders have no thread notifications.

use crate::loader::ShimIdentity;
use crate::shim::ShimBuilder;
use crate::table::ForwardingTable;
use std::ffi::c_void;
use tracing::{debug, warn};

/// A loader notification
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LifecycleEvent {
	/// The process is unloading the shim
	ProcessDetach,
	/// The process has loaded the shim
	ProcessAttach,
	/// A thread was created
	ThreadAttach,
	/// A thread is exiting
	ThreadDetach,
}

impl LifecycleEvent {
	/// Map a `DllMain` reason code
	#[must_use]
	pub const fn from_reason(reason: u32) -> Option<Self> {
		match reason {
			0 => Some(Self::ProcessDetach),
			1 => Some(Self::ProcessAttach),
			2 => Some(Self::ThreadAttach),
			3 => Some(Self::ThreadDetach),
			_ => None,
		}
	}

	/// The `DllMain` reason code for this event
	#[must_use]
	pub const fn reason(self) -> u32 {
		match self {
			Self::ProcessDetach => 0,
			Self::ProcessAttach => 1,
			Self::ThreadAttach => 2,
			Self::ThreadDetach => 3,
		}
	}
}

/// Handle a loader notification for `table`
///
/// Always returns `true`: a shim whose real library is missing still
/// lets the host finish loading and fails on the first forwarded call.
pub fn dispatch(
	table: &'static ForwardingTable,
	event: LifecycleEvent,
	identity: ShimIdentity,
	configure: fn() -> ShimBuilder,
) -> bool {
	match event {
		LifecycleEvent::ProcessAttach => {
			crate::util::init_logging();
			debug!("Process attach for table {}", table.name());
			if let Err(e) = table.attach(configure(), identity) {
				warn!("Ignoring process attach for table {}: {}", table.name(), e);
			}
		},
		LifecycleEvent::ThreadAttach => table.thread_attach(),
		LifecycleEvent::ThreadDetach => table.thread_detach(),
		LifecycleEvent::ProcessDetach => table.detach(),
	}
	true
}

/// `DllMain` body for `table`
///
/// Unknown reason codes are acknowledged and otherwise ignored.
pub fn dll_main(table: &'static ForwardingTable, module: *mut c_void, reason: u32, configure: fn() -> ShimBuilder) -> i32 {
	match LifecycleEvent::from_reason(reason) {
		Some(event) => i32::from(dispatch(table, event, ShimIdentity::Module(module as usize), configure)),
		None => 1,
	}
}

/// Install the loader entry point for a forwarding table
///
/// The second argument is a function or non-capturing closure returning
/// the `ShimBuilder` used at process attach.
///
/// ```ignore
/// proxyshim::entry_point!(TABLE, || proxyshim::new().real_library("/opt/real/libmath.so"));
/// ```
#[macro_export]
macro_rules! entry_point {
	($table:path, $configure:expr $(,)?) => {
		const _: () = {
			fn __proxyshim_configure() -> $crate::ShimBuilder {
				($configure)()
			}

			#[cfg(windows)]
			#[unsafe(no_mangle)]
			pub unsafe extern "system" fn DllMain(
				module: *mut ::core::ffi::c_void,
				reason: u32,
				_reserved: *mut ::core::ffi::c_void,
			) -> i32 {
				$crate::lifecycle::dll_main(&$table, module, reason, __proxyshim_configure)
			}

			#[cfg(not(windows))]
			extern "C" fn __proxyshim_attach() {
				$crate::lifecycle::dispatch(
					&$table,
					$crate::LifecycleEvent::ProcessAttach,
					$crate::ShimIdentity::current(),
					__proxyshim_configure,
				);
			}

			#[cfg(not(windows))]
			#[cfg_attr(target_vendor = "apple", unsafe(link_section = "__DATA,__mod_init_func"))]
			#[cfg_attr(not(target_vendor = "apple"), unsafe(link_section = ".init_array"))]
			#[used]
			static __PROXYSHIM_ATTACH: extern "C" fn() = __proxyshim_attach;

			#[cfg(all(not(windows), not(target_vendor = "apple")))]
			extern "C" fn __proxyshim_detach() {
				$crate::lifecycle::dispatch(
					&$table,
					$crate::LifecycleEvent::ProcessDetach,
					$crate::ShimIdentity::Unknown,
					__proxyshim_configure,
				);
			}

			#[cfg(all(not(windows), not(target_vendor = "apple")))]
			#[unsafe(link_section = ".fini_array")]
			#[used]
			static __PROXYSHIM_DETACH: extern "C" fn() = __proxyshim_detach;
		};
	};
}
