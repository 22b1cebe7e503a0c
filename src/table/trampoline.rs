//! Passthrough trampolines
//!
//! A passthrough export is a naked function that loads the entry's
//! resolved address and jumps to it, leaving every argument register,
//! the stack and the return address untouched. This is how variadic
//! exports and exports with unusual return conventions are forwarded.
//!
//! A slot that was never bound sends the call to
//! `passthrough_unresolved`, which reports the export and aborts.

use crate::shim::ShimError;
use crate::table::ForwardingEntry;

/// Landing point for a passthrough export whose slot is empty
///
/// Reports the export and aborts.
///
/// # Safety
///
/// Only meant to be reached from a passthrough trampoline, with a
/// reference to the trampoline's own entry as first argument.
pub unsafe extern "C" fn passthrough_unresolved(entry: &'static ForwardingEntry) -> ! {
	let Some(table) = crate::shim::active_table() else {
		tracing::error!("Forwarding {} failed: {}", entry.export(), ShimError::NotAttached);
		std::process::abort()
	};

	let reason = match table.lookup(entry) {
		Err(e) => e,
		Ok(_) => ShimError::Other("export was called before its trampoline was bound".to_string()),
	};
	table.forwarding_failed(entry, &reason)
}

#[cfg(all(target_arch = "x86_64", not(windows)))]
#[doc(hidden)]
#[macro_export]
macro_rules! __passthrough_jump {
	($entry:path) => {
		::core::arch::naked_asm!(
			"mov r11, qword ptr [rip + {entry}]",
			"test r11, r11",
			"jz 2f",
			"jmp r11",
			"2:",
			"lea rdi, [rip + {entry}]",
			"jmp {trap}",
			entry = sym $entry,
			trap = sym $crate::table::passthrough_unresolved,
		)
	};
}

#[cfg(all(target_arch = "x86_64", windows))]
#[doc(hidden)]
#[macro_export]
macro_rules! __passthrough_jump {
	($entry:path) => {
		::core::arch::naked_asm!(
			"mov r11, qword ptr [rip + {entry}]",
			"test r11, r11",
			"jz 2f",
			"jmp r11",
			"2:",
			"lea rcx, [rip + {entry}]",
			"jmp {trap}",
			entry = sym $entry,
			trap = sym $crate::table::passthrough_unresolved,
		)
	};
}

#[cfg(all(target_arch = "aarch64", not(target_vendor = "apple"), not(windows)))]
#[doc(hidden)]
#[macro_export]
macro_rules! __passthrough_jump {
	($entry:path) => {
		::core::arch::naked_asm!(
			"adrp x16, {entry}",
			"ldr x16, [x16, :lo12:{entry}]",
			"cbz x16, 2f",
			"br x16",
			"2:",
			"adrp x0, {entry}",
			"add x0, x0, :lo12:{entry}",
			"b {trap}",
			entry = sym $entry,
			trap = sym $crate::table::passthrough_unresolved,
		)
	};
}

#[cfg(all(target_arch = "aarch64", target_vendor = "apple"))]
#[doc(hidden)]
#[macro_export]
macro_rules! __passthrough_jump {
	($entry:path) => {
		::core::arch::naked_asm!(
			"adrp x16, {entry}@PAGE",
			"ldr x16, [x16, {entry}@PAGEOFF]",
			"cbz x16, 2f",
			"br x16",
			"2:",
			"adrp x0, {entry}@PAGE",
			"add x0, x0, {entry}@PAGEOFF",
			"b {trap}",
			entry = sym $entry,
			trap = sym $crate::table::passthrough_unresolved,
		)
	};
}

#[cfg(not(any(target_arch = "x86_64", all(target_arch = "aarch64", not(windows)))))]
#[doc(hidden)]
#[macro_export]
macro_rules! __passthrough_jump {
	($entry:path) => {
		::core::compile_error!("passthrough exports are not supported on this target")
	};
}
