//! `LoadLibraryW`-based loading

use crate::loader::RealLibrary;
use crate::shim::{Result, ShimError};
use std::ffi::{CString, OsString, c_void};
use std::os::windows::ffi::{OsStrExt, OsStringExt};
use std::path::{Path, PathBuf};
use std::ptr::NonNull;
use windows::Win32::Foundation::HMODULE;
use windows::Win32::System::LibraryLoader::{GetModuleFileNameW, GetProcAddress, LoadLibraryW};
use windows::core::{PCSTR, PCWSTR};

/// Longest path `GetModuleFileNameW` can report
const MAX_MODULE_PATH: usize = 32_768;

/// A library opened with `LoadLibraryW`
///
/// The module is never freed: it lives as long as the process.
#[derive(Debug)]
pub(super) struct WinLibrary {
	module: HMODULE,
	path: PathBuf,
}

// SAFETY: module handles are process-wide; GetProcAddress is thread-safe.
unsafe impl Send for WinLibrary {}
unsafe impl Sync for WinLibrary {}

impl WinLibrary {
	pub(super) fn open(path: &Path) -> Result<Self> {
		let wide: Vec<u16> = path.as_os_str().encode_wide().chain(std::iter::once(0)).collect();
		let module = unsafe { LoadLibraryW(PCWSTR(wide.as_ptr())) }.map_err(|e| ShimError::LoadFailed {
			path: path.to_path_buf(),
			reason: e.to_string(),
		})?;

		Ok(Self {
			module,
			path: path.to_path_buf(),
		})
	}

	fn lookup(&self, name: PCSTR) -> Option<NonNull<c_void>> {
		let proc = unsafe { GetProcAddress(self.module, name) }?;
		NonNull::new(proc as *mut c_void)
	}
}

impl RealLibrary for WinLibrary {
	fn path(&self) -> &Path {
		&self.path
	}

	fn symbol(&self, name: &str) -> Result<NonNull<c_void>> {
		let c_name = CString::new(name).map_err(|_| ShimError::InvalidSymbolName(name.to_string()))?;
		self.lookup(PCSTR(c_name.as_ptr().cast()))
			.ok_or_else(|| ShimError::SymbolNotFound(name.to_string()))
	}

	fn ordinal(&self, ordinal: u16) -> Result<NonNull<c_void>> {
		// MAKEINTRESOURCEA: the ordinal travels in the low word of the pointer
		self.lookup(PCSTR(ordinal as usize as *const u8))
			.ok_or(ShimError::OrdinalNotFound(ordinal))
	}
}

/// File path of the module with handle `module`
pub(super) fn module_path(module: usize) -> Option<PathBuf> {
	let module = HMODULE(module as *mut c_void);
	let mut buf = vec![0u16; 260];
	loop {
		let len = unsafe { GetModuleFileNameW(module, &mut buf) } as usize;
		if len == 0 {
			return None;
		}
		if len < buf.len() {
			buf.truncate(len);
			return Some(PathBuf::from(OsString::from_wide(&buf)));
		}
		if buf.len() >= MAX_MODULE_PATH {
			return None;
		}
		buf.resize(buf.len() * 2, 0);
	}
}
