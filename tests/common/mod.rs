//! Shared fixtures: an in-process stand-in for a real library
#![allow(dead_code)]

use proxyshim::{CallHook, CallInfo, LibraryLoader, RealLibrary, Result, ShimError};
use std::collections::HashMap;
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

pub extern "C" fn real_add(a: i32, b: i32) -> i32 {
	a + b
}

pub extern "C" fn real_sub(a: i32, b: i32) -> i32 {
	a - b
}

pub extern "C" fn real_mul(a: i32, b: i32) -> i32 {
	a * b
}

pub extern "C" fn real_twice(a: i32) -> i32 {
	a * 2
}

pub extern "C" fn real_square(a: i32) -> i32 {
	a * a
}

pub extern "C" fn real_negate(a: i32) -> i32 {
	-a
}

pub extern "C" fn real_halve(a: i32) -> i32 {
	a / 2
}

/// Exports of the fake library, by name
pub fn math_symbols() -> Vec<(&'static str, usize)> {
	vec![
		("Add", real_add as extern "C" fn(i32, i32) -> i32 as usize),
		("Sub", real_sub as extern "C" fn(i32, i32) -> i32 as usize),
		("Mul", real_mul as extern "C" fn(i32, i32) -> i32 as usize),
		("RealTwice", real_twice as extern "C" fn(i32) -> i32 as usize),
		("Negate", real_negate as extern "C" fn(i32) -> i32 as usize),
		("Halve", real_halve as extern "C" fn(i32) -> i32 as usize),
	]
}

/// Exports of the fake library, by ordinal
pub fn math_ordinals() -> Vec<(u16, usize)> {
	vec![(7, real_square as extern "C" fn(i32) -> i32 as usize)]
}

pub struct FakeLibrary {
	path: PathBuf,
	symbols: HashMap<&'static str, usize>,
	ordinals: HashMap<u16, usize>,
}

impl RealLibrary for FakeLibrary {
	fn path(&self) -> &Path {
		&self.path
	}

	fn symbol(&self, name: &str) -> Result<NonNull<c_void>> {
		self.symbols
			.get(name)
			.and_then(|addr| NonNull::new(*addr as *mut c_void))
			.ok_or_else(|| ShimError::SymbolNotFound(name.to_string()))
	}

	fn ordinal(&self, ordinal: u16) -> Result<NonNull<c_void>> {
		self.ordinals
			.get(&ordinal)
			.and_then(|addr| NonNull::new(*addr as *mut c_void))
			.ok_or(ShimError::OrdinalNotFound(ordinal))
	}
}

/// Loader handing out `FakeLibrary` and counting loads
#[derive(Clone)]
pub struct FakeLoader {
	pub loads: Arc<AtomicUsize>,
}

impl FakeLoader {
	pub fn new() -> Self {
		Self {
			loads: Arc::new(AtomicUsize::new(0)),
		}
	}

	pub fn loads(&self) -> usize {
		self.loads.load(Ordering::SeqCst)
	}
}

impl LibraryLoader for FakeLoader {
	fn load(&self, path: &Path) -> Result<Box<dyn RealLibrary>> {
		self.loads.fetch_add(1, Ordering::SeqCst);
		Ok(Box::new(FakeLibrary {
			path: path.to_path_buf(),
			symbols: math_symbols().into_iter().collect(),
			ordinals: math_ordinals().into_iter().collect(),
		}))
	}

	fn name(&self) -> &'static str {
		"FakeLoader"
	}
}

/// Hook recording the exports it sees and the thread events
#[derive(Clone, Default)]
pub struct RecordingHook {
	pub calls: Arc<Mutex<Vec<&'static str>>>,
	pub thread_attaches: Arc<AtomicUsize>,
	pub thread_detaches: Arc<AtomicUsize>,
}

impl RecordingHook {
	pub fn count(&self, export: &str) -> usize {
		self.calls.lock().unwrap().iter().filter(|name| **name == export).count()
	}
}

impl CallHook for RecordingHook {
	fn before_call(&self, call: &CallInfo) {
		self.calls.lock().unwrap().push(call.export);
	}

	fn on_thread_attach(&self) {
		self.thread_attaches.fetch_add(1, Ordering::SeqCst);
	}

	fn on_thread_detach(&self) {
		self.thread_detaches.fetch_add(1, Ordering::SeqCst);
	}

	fn name(&self) -> &'static str {
		"RecordingHook"
	}
}

/// Lines of the log file, empty if it does not exist yet
pub fn log_lines(path: &Path) -> Vec<String> {
	std::fs::read_to_string(path)
		.map(|contents| contents.lines().map(str::to_string).collect())
		.unwrap_or_default()
}

/// A real-library path that never exists, with a directory component
pub const FAKE_REAL_LIBRARY: &str = "/nonexistent/real/libmath.so";
