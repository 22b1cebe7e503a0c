//! Proxy shim for mathlib
//!
//! Install this library under mathlib's file name and move the real
//! library to `real/` below the host's working directory, or point
//! `PROXYSHIM_REAL_LIBRARY` at it. Calls land in `proxyshim.log`.
//!
//! ```bash
//! mkdir -p real
//! cp target/release/libmathlib_real.so real/libmathlib.so
//! cp target/release/libmathlib.so .
//! PROXYSHIM_DEBUG=1 ./host
//! ```

use proxyshim::{MissingExportPolicy, ShimBuilder};
use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::path::PathBuf;

proxyshim::forwarding_table! {
	static MATHLIB;

	pub unsafe extern "C" fn Add(a: i32, b: i32) -> i32;

	#[log_args]
	#[on_missing(i32::MIN)]
	pub unsafe extern "C" fn Sub(a: i32, b: i32) -> i32;

	#[passthrough]
	pub unsafe extern "C" fn Mul(a: i32, b: i32) -> i32;

	// MSVC builds forward it through the linker, see build.rs
	#[cfg(not(all(windows, target_env = "msvc")))]
	#[passthrough]
	pub unsafe extern "C" fn Version() -> u32;
}

proxyshim::entry_point!(MATHLIB, configure);

fn configure() -> ShimBuilder {
	proxyshim::new()
		.real_library(default_real_library())
		.missing_export(MissingExportPolicy::Sentinel)
}

/// `real/<prefix>mathlib<suffix>` relative to the working directory
fn default_real_library() -> PathBuf {
	PathBuf::from("real").join(format!("{DLL_PREFIX}mathlib{DLL_SUFFIX}"))
}
