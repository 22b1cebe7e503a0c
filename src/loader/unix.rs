//! `dlopen`-based loading

use crate::loader::RealLibrary;
use crate::shim::{Result, ShimError};
use std::ffi::{CStr, CString, OsStr, c_void};
use std::os::unix::ffi::OsStrExt;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

/// A library opened with `dlopen`
///
/// The handle is never closed: the library lives as long as the process.
#[derive(Debug)]
pub(super) struct DlLibrary {
	handle: NonNull<c_void>,
	path: PathBuf,
}

// SAFETY: a dlopen handle is a process-wide token; dlsym may be called
// on it from any thread.
unsafe impl Send for DlLibrary {}
unsafe impl Sync for DlLibrary {}

impl DlLibrary {
	pub(super) fn open(path: &Path) -> Result<Self> {
		let c_path = CString::new(path.as_os_str().as_bytes()).map_err(|_| ShimError::LoadFailed {
			path: path.to_path_buf(),
			reason: "path contains a NUL byte".to_string(),
		})?;

		let handle = unsafe {
			libc::dlerror();
			libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL)
		};

		match NonNull::new(handle) {
			Some(handle) => Ok(Self {
				handle,
				path: path.to_path_buf(),
			}),
			None => Err(ShimError::LoadFailed {
				path: path.to_path_buf(),
				reason: last_error(),
			}),
		}
	}
}

impl RealLibrary for DlLibrary {
	fn path(&self) -> &Path {
		&self.path
	}

	fn symbol(&self, name: &str) -> Result<NonNull<c_void>> {
		let c_name = CString::new(name).map_err(|_| ShimError::InvalidSymbolName(name.to_string()))?;
		let addr = unsafe {
			libc::dlerror();
			libc::dlsym(self.handle.as_ptr(), c_name.as_ptr())
		};
		NonNull::new(addr).ok_or_else(|| ShimError::SymbolNotFound(name.to_string()))
	}
}

fn last_error() -> String {
	let error = unsafe { libc::dlerror() };
	if error.is_null() {
		"unknown error".to_string()
	} else {
		unsafe { CStr::from_ptr(error) }.to_string_lossy().into_owned()
	}
}

/// Path of the object containing `addr`
pub(super) fn module_path(addr: usize) -> Option<PathBuf> {
	let mut info: libc::Dl_info = unsafe { std::mem::zeroed() };
	if unsafe { libc::dladdr(addr as *const c_void, &mut info) } == 0 || info.dli_fname.is_null() {
		return None;
	}
	let name = unsafe { CStr::from_ptr(info.dli_fname) };
	Some(PathBuf::from(OsStr::from_bytes(name.to_bytes())))
}
