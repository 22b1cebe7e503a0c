//! Forwarding to a real system library through the platform loader
#![cfg(target_os = "linux")]

use proxyshim::{LibraryLoader, ShimError, ShimIdentity, SystemLoader};
use std::path::{Path, PathBuf};

proxyshim::forwarding_table! {
	static TABLE;

	#[symbol("cos")]
	pub unsafe extern "C" fn Cosine(x: f64) -> f64;

	#[symbol("no_such_export_in_libm")]
	#[on_missing(f64::NAN)]
	pub unsafe extern "C" fn Missing(x: f64) -> f64;
}

const LIBM_CANDIDATES: &[&str] = &[
	"/lib/x86_64-linux-gnu/libm.so.6",
	"/usr/lib/x86_64-linux-gnu/libm.so.6",
	"/lib/aarch64-linux-gnu/libm.so.6",
	"/usr/lib/aarch64-linux-gnu/libm.so.6",
	"/usr/lib64/libm.so.6",
	"/lib64/libm.so.6",
	"/usr/lib/libm.so.6",
	"/lib/libm.so.6",
];

fn libm() -> Option<PathBuf> {
	let found = LIBM_CANDIDATES.iter().map(Path::new).find(|p| p.exists()).map(Path::to_path_buf);
	if found.is_none() {
		eprintln!("libm not found, skipping");
	}
	found
}

#[test]
fn loads_and_looks_up_symbols() {
	let Some(path) = libm() else {
		return;
	};

	let library = SystemLoader::new().load(&path).unwrap();
	assert_eq!(library.path(), path.as_path());
	assert!(library.symbol("cos").is_ok());
	assert!(matches!(library.symbol("no_such_export_in_libm"), Err(ShimError::SymbolNotFound(_))));
	assert!(matches!(library.ordinal(1), Err(ShimError::OrdinalUnsupported(1))));
}

#[test]
fn missing_library_is_a_load_failure() {
	let dir = tempfile::tempdir().unwrap();
	let err = SystemLoader::new().load(&dir.path().join("libnothing.so")).err().unwrap();
	assert!(matches!(err, ShimError::LoadFailed { .. }));
}

#[test]
fn forwards_to_libm() {
	let Some(path) = libm() else {
		return;
	};

	let builder = proxyshim::new()
		.env_overrides(false)
		.no_log()
		.eager(true)
		.real_library(path)
		.missing_export(proxyshim::MissingExportPolicy::Sentinel);
	TABLE.attach(builder, ShimIdentity::current()).unwrap();

	assert!(TABLE.entry("Cosine").unwrap().resolved().is_some());
	assert!(TABLE.entry("Missing").unwrap().resolved().is_none());
	for x in [0.0, 0.5, 1.0, std::f64::consts::PI] {
		assert!((unsafe { Cosine(x) } - x.cos()).abs() < 1e-12);
	}
	assert!(unsafe { Missing(1.0) }.is_nan());
}
