//! Error types for the shim
//!
//! This module contains error types and a result type for the shim.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for shim operations
pub type Result<T> = std::result::Result<T, ShimError>;

/// Error type for shim operations
#[derive(Debug, Error)]
pub enum ShimError {
	/// No path to the real library was configured
	#[error("No real library configured. Set it on the builder or through PROXYSHIM_REAL_LIBRARY")]
	NoRealLibrary,

	/// The loader refused to load the real library
	#[error("Failed to load real library {path}: {reason}")]
	LoadFailed { path: PathBuf, reason: String },

	/// The configured real library is the shim itself
	#[error("Real library path {0} resolves to the shim itself")]
	RecursiveLoad(PathBuf),

	/// A bare file name would go through the loader search path
	#[error("Real library path {0} has no directory component and would be looked up through the search path")]
	UnqualifiedPath(PathBuf),

	/// The real library does not export the symbol
	#[error("Symbol {0} not found in the real library")]
	SymbolNotFound(String),

	/// The real library does not export the ordinal
	#[error("Ordinal {0} not found in the real library")]
	OrdinalNotFound(u16),

	/// The platform loader cannot look exports up by ordinal
	#[error("Lookup by ordinal {0} is not supported on this platform")]
	OrdinalUnsupported(u16),

	/// The symbol name cannot be passed to the platform loader
	#[error("Invalid symbol name {0:?}")]
	InvalidSymbolName(String),

	/// The real library was never resolved
	#[error("Real library is unresolved: {0}")]
	Unresolved(String),

	/// A forwarding call happened before process attach
	#[error("The shim is not attached")]
	NotAttached,

	/// Process attach ran more than once
	#[error("The shim is already attached")]
	AlreadyAttached,

	/// An I/O error occurred
	#[error("I/O error: {0}")]
	Io(#[from] io::Error),

	/// Other error
	#[error("{0}")]
	Other(String),
}
