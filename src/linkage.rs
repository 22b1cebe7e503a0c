//! Linker directives for exports the shim does not proxy
//!
//! Exports that need no observation can be forwarded by the Windows
//! loader itself: the shim's export table names the real library and
//! export, and the call never enters the shim. These helpers render the
//! directives for a deployment's `build.rs`, either as MSVC `/EXPORT`
//! arguments or as a module definition file.

use std::path::{Path, PathBuf};

/// An export of the real library
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RealExport {
	/// Export name
	pub name: String,
	/// Export ordinal, if it should be preserved
	pub ordinal: Option<u16>,
}

impl RealExport {
	/// An export known by name only
	pub fn named(name: impl Into<String>) -> Self {
		Self {
			name: name.into(),
			ordinal: None,
		}
	}

	/// An export with a fixed ordinal
	pub fn with_ordinal(name: impl Into<String>, ordinal: u16) -> Self {
		Self {
			name: name.into(),
			ordinal: Some(ordinal),
		}
	}
}

/// Forwarder target for `real_library`: its path without the extension
///
/// The Windows loader appends `.dll` itself when resolving forwarders.
#[must_use]
pub fn forwarder_target(real_library: &Path) -> String {
	let stem: PathBuf = real_library.with_extension("");
	stem.to_string_lossy().into_owned()
}

/// `/EXPORT` arguments forwarding every export not in `proxied`
#[must_use]
pub fn msvc_forwarders(real_library: &Path, exports: &[RealExport], proxied: &[&str]) -> Vec<String> {
	let target = forwarder_target(real_library);
	exports
		.iter()
		.filter(|export| !proxied.contains(&export.name.as_str()))
		.map(|export| match export.ordinal {
			Some(ordinal) => format!("/EXPORT:{0}={1}.{0},@{2}", export.name, target, ordinal),
			None => format!("/EXPORT:{0}={1}.{0}", export.name, target),
		})
		.collect()
}

/// A module definition file forwarding every export not in `proxied`
///
/// Proxied exports are listed under their own name so the linker keeps
/// the ordinal; everything else points at the real library.
#[must_use]
pub fn module_definition(library_name: &str, real_library: &Path, exports: &[RealExport], proxied: &[&str]) -> String {
	let target = forwarder_target(real_library);
	let mut lines = vec![format!("LIBRARY {library_name}")];
	if !exports.is_empty() {
		lines.push("EXPORTS".to_string());
	}

	for export in exports {
		let mut line = if proxied.contains(&export.name.as_str()) {
			format!("\t{}", export.name)
		} else {
			format!("\t{0}={1}.{0}", export.name, target)
		};
		if let Some(ordinal) = export.ordinal {
			line.push_str(&format!(" @{ordinal}"));
		}
		lines.push(line);
	}

	lines.join("\r\n")
}

/// Print `args` as `cargo:rustc-cdylib-link-arg` lines
///
/// Meant to be called from a deployment's build script.
pub fn emit_cargo_link_args(args: &[String]) {
	for arg in args {
		println!("cargo:rustc-cdylib-link-arg={arg}");
	}
}
