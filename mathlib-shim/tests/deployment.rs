//! The built shim loaded under mathlib's name by a separate host
//!
//! Every case stages a directory, then re-runs this test binary inside
//! it as the host: the shim resolves `real/` and its call log against
//! the working directory, which is process-wide.
#![cfg(unix)]

use std::env;
use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::ffi::{CString, c_void};
use std::path::{Path, PathBuf};
use std::process::{Command, ExitStatus};
use tempfile::TempDir;

// Set in the host process to the shim it must load
const HOST_SHIM: &str = "MATHLIB_TEST_HOST_SHIM";

fn library_file(name: &str) -> String {
	format!("{DLL_PREFIX}{name}{DLL_SUFFIX}")
}

/// Find a cdylib built next to this test binary
fn built_library(name: &str) -> Option<PathBuf> {
	let exe = env::current_exe().ok()?;
	let deps = exe.parent()?;
	let found = [deps.parent()?, deps]
		.iter()
		.map(|dir| dir.join(library_file(name)))
		.find(|path| path.exists());
	if found.is_none() {
		eprintln!("{} not built, skipping", library_file(name));
	}
	found
}

struct Stage {
	dir: TempDir,
	shim: PathBuf,
}

impl Stage {
	/// Install the shim under mathlib's name, and the real library in `real/` if asked
	fn new(with_real: bool) -> Option<Self> {
		let shim_built = built_library("mathlib")?;
		let real_built = built_library("mathlib_real")?;

		let dir = tempfile::tempdir().unwrap();
		let shim = dir.path().join(library_file("mathlib"));
		std::fs::copy(shim_built, &shim).unwrap();
		if with_real {
			std::fs::create_dir(dir.path().join("real")).unwrap();
			std::fs::copy(real_built, dir.path().join("real").join(library_file("mathlib"))).unwrap();
		}
		Some(Self { dir, shim })
	}

	/// Run `test` as the host inside the stage
	fn run_host(&self, test: &str, envs: &[(&str, &Path)]) -> ExitStatus {
		let mut command = Command::new(env::current_exe().unwrap());
		command
			.args([test, "--exact", "--test-threads=1", "--nocapture"])
			.current_dir(self.dir.path())
			.env(HOST_SHIM, &self.shim);
		for var in ["PROXYSHIM_REAL_LIBRARY", "PROXYSHIM_LOG_FILE", "PROXYSHIM_NO_LOG"] {
			command.env_remove(var);
		}
		for (key, value) in envs {
			command.env(key, value);
		}
		command.status().unwrap()
	}

	fn log(&self) -> Vec<String> {
		std::fs::read_to_string(self.dir.path().join("proxyshim.log"))
			.map(|contents| contents.lines().map(str::to_string).collect())
			.unwrap_or_default()
	}
}

/// The shim as the host sees it after `dlopen`
struct Host {
	handle: *mut c_void,
}

impl Host {
	fn open() -> Option<Self> {
		let shim = env::var_os(HOST_SHIM)?;
		let path = CString::new(shim.into_encoded_bytes()).unwrap();
		let handle = unsafe { libc::dlopen(path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
		assert!(!handle.is_null(), "dlopen of the shim failed");
		Some(Self { handle })
	}

	fn symbol(&self, name: &str) -> *mut c_void {
		let name = CString::new(name).unwrap();
		let addr = unsafe { libc::dlsym(self.handle, name.as_ptr()) };
		assert!(!addr.is_null(), "shim does not export {name:?}");
		addr
	}

	fn binary(&self, name: &str) -> extern "C" fn(i32, i32) -> i32 {
		unsafe { std::mem::transmute::<*mut c_void, extern "C" fn(i32, i32) -> i32>(self.symbol(name)) }
	}

	fn version(&self) -> extern "C" fn() -> u32 {
		unsafe { std::mem::transmute::<*mut c_void, extern "C" fn() -> u32>(self.symbol("Version")) }
	}
}

#[test]
fn forwards_every_export_to_the_real_library() {
	if let Some(host) = Host::open() {
		assert_eq!(host.binary("Add")(2, 3), 5);
		assert_eq!(host.binary("Sub")(7, 2), 5);
		assert_eq!(host.binary("Mul")(6, 7), 42);
		assert_eq!(host.version()(), 1 << 16);
		return;
	}
	let Some(stage) = Stage::new(true) else {
		return;
	};

	assert!(stage.run_host("forwards_every_export_to_the_real_library", &[]).success());

	// Passthrough exports are not logged
	assert_eq!(stage.log(), ["Add", "Sub(7, 2)"]);
}

/// Host body shared by the failure cases: sentinel first, then abort
fn call_until_abort(host: &Host) {
	assert_eq!(host.binary("Sub")(7, 2), i32::MIN);
	host.binary("Add")(2, 3);
}

fn assert_failure_log(lines: &[String], reason: &str) {
	assert_eq!(lines.len(), 4, "{lines:?}");
	assert_eq!(lines[0], "Sub(7, 2)");
	assert!(lines[1].starts_with("Sub: forwarding failed: ") && lines[1].contains(reason), "{}", lines[1]);
	assert_eq!(lines[2], "Add");
	assert!(lines[3].starts_with("Add: forwarding failed: ") && lines[3].contains(reason), "{}", lines[3]);
}

#[test]
fn missing_real_library_returns_sentinel_then_aborts() {
	if let Some(host) = Host::open() {
		call_until_abort(&host);
		return;
	}
	let Some(stage) = Stage::new(false) else {
		return;
	};

	let status = stage.run_host("missing_real_library_returns_sentinel_then_aborts", &[]);
	assert!(!status.success());
	assert_failure_log(&stage.log(), "Failed to load real library");
}

#[test]
fn refuses_itself_as_real_library() {
	if let Some(host) = Host::open() {
		call_until_abort(&host);
		return;
	}
	let Some(stage) = Stage::new(true) else {
		return;
	};

	let shim = stage.shim.clone();
	let status = stage.run_host("refuses_itself_as_real_library", &[("PROXYSHIM_REAL_LIBRARY", shim.as_path())]);
	assert!(!status.success());
	assert_failure_log(&stage.log(), "resolves to the shim itself");
}
