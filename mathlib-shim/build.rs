//! Build script for the mathlib shim
//!
//! On MSVC targets, exports the shim does not proxy are forwarded by the
//! linker straight to the real library.

use proxyshim::linkage::{RealExport, emit_cargo_link_args, msvc_forwarders};
use std::path::PathBuf;

const PROXIED: &[&str] = &["Add", "Sub", "Mul"];

fn main() {
	println!("cargo:rerun-if-env-changed=MATHLIB_REAL_PATH");

	let target = std::env::var("TARGET").unwrap_or_default();
	if !target.ends_with("windows-msvc") {
		return;
	}

	let real = std::env::var_os("MATHLIB_REAL_PATH").map_or_else(|| PathBuf::from("real\\mathlib.dll"), PathBuf::from);
	let exports = [
		RealExport::named("Add"),
		RealExport::named("Sub"),
		RealExport::named("Mul"),
		RealExport::named("Version"),
	];
	emit_cargo_link_args(&msvc_forwarders(&real, &exports, PROXIED));
}
