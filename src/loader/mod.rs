//! Real library loading
//!
//! This module defines how the shim reaches the library it stands in
//! for. `LibraryLoader` opens a library from a path and `RealLibrary`
//! looks exports up in it. `SystemLoader` is the platform loader
//! (`dlopen`/`dlsym` on Unix, `LoadLibraryW`/`GetProcAddress` on
//! Windows); tests and special deployments plug in their own.

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

use crate::shim::{Result, ShimError};
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::ptr::NonNull;

/// A loaded real library
pub trait RealLibrary: Send + Sync {
	/// Path the library was loaded from
	fn path(&self) -> &Path;

	/// Look an export up by name
	fn symbol(&self, name: &str) -> Result<NonNull<c_void>>;

	/// Look an export up by ordinal
	fn ordinal(&self, ordinal: u16) -> Result<NonNull<c_void>> {
		Err(ShimError::OrdinalUnsupported(ordinal))
	}
}

/// Something that can open a real library
pub trait LibraryLoader: Send + Sync {
	/// Load the library at `path`
	fn load(&self, path: &Path) -> Result<Box<dyn RealLibrary>>;

	/// Get the name of the loader
	///
	/// This is used for debugging and logging purposes.
	fn name(&self) -> &'static str {
		std::any::type_name::<Self>()
	}
}

/// The platform's own dynamic loader
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemLoader;

impl SystemLoader {
	/// Create a new `SystemLoader`
	#[must_use]
	pub const fn new() -> Self {
		Self
	}
}

impl LibraryLoader for SystemLoader {
	fn load(&self, path: &Path) -> Result<Box<dyn RealLibrary>> {
		#[cfg(unix)]
		let library = unix::DlLibrary::open(path)?;
		#[cfg(windows)]
		let library = windows::WinLibrary::open(path)?;

		Ok(Box::new(library))
	}

	fn name(&self) -> &'static str {
		"SystemLoader"
	}
}

/// Where the shim itself lives
///
/// Used to make sure the configured real library is not the shim.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShimIdentity {
	/// Any code address inside the shim module
	Address(usize),
	/// The module handle the loader passed to the entry point
	Module(usize),
	/// The shim's location is not known
	Unknown,
}

impl ShimIdentity {
	/// Identity of the module this code is linked into
	#[must_use]
	pub fn current() -> Self {
		if cfg!(unix) {
			Self::Address(Self::current as fn() -> Self as usize)
		} else {
			Self::Unknown
		}
	}

	/// File path of the shim module, if the platform can tell
	#[must_use]
	pub fn path(&self) -> Option<PathBuf> {
		match *self {
			#[cfg(unix)]
			Self::Address(addr) => unix::module_path(addr),
			#[cfg(windows)]
			Self::Module(module) => windows::module_path(module),
			_ => None,
		}
	}
}

/// Check that `real` can be loaded without landing on the shim again
///
/// A bare file name is handed to the loader's search path, which is
/// exactly where the shim sits, so it is refused unless
/// `allow_search_path` is set. A path naming the shim's own file is
/// always refused.
pub fn check_real_path(real: &Path, shim: Option<&Path>, allow_search_path: bool) -> Result<()> {
	let unqualified = real.parent().is_none_or(|parent| parent.as_os_str().is_empty());
	if unqualified && !allow_search_path {
		return Err(ShimError::UnqualifiedPath(real.to_path_buf()));
	}

	if let Some(shim) = shim {
		let same = match (std::fs::canonicalize(real), std::fs::canonicalize(shim)) {
			(Ok(real), Ok(shim)) => real == shim,
			_ => real == shim,
		};
		if same {
			return Err(ShimError::RecursiveLoad(real.to_path_buf()));
		}
	}

	Ok(())
}
