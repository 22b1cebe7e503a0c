//! Call log sink
//!
//! The sink appends one line per observed call to a file in the host
//! process's working directory. The file is opened in append mode for
//! every line and closed again right after, so no handle outlives a
//! write. Writers are serialized by a process-wide lock, since append
//! semantics alone do not keep concurrent lines whole on every platform.
//!
//! Logging is best-effort: a sink that cannot write never reports that
//! to the forwarded call.

use crate::shim::Result;
use std::fmt;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, PoisonError};
use tracing::warn;

/// One observed event, already rendered as a single line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogLine {
	text: String,
}

impl LogLine {
	/// A call to `export`
	#[must_use]
	pub fn call(export: &str) -> Self {
		Self::from_text(export.to_string())
	}

	/// A call to `export` with a summary of its arguments
	#[must_use]
	pub fn call_with_args(export: &str, args: &str) -> Self {
		Self::from_text(format!("{export}({args})"))
	}

	/// A forwarding failure for `export`
	#[must_use]
	pub fn failure(export: &str, reason: &dyn fmt::Display) -> Self {
		Self::from_text(format!("{export}: forwarding failed: {reason}"))
	}

	/// Line breaks inside the text would split the line in the file
	fn from_text(text: String) -> Self {
		let text = if text.contains(['\n', '\r']) {
			text.replace('\r', "\\r").replace('\n', "\\n")
		} else {
			text
		};
		Self { text }
	}

	/// The text of the line, without the terminating newline
	#[must_use]
	pub fn as_str(&self) -> &str {
		&self.text
	}
}

impl fmt::Display for LogLine {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.text)
	}
}

/// Append-only call log
#[derive(Debug)]
pub struct LogSink {
	path: PathBuf,
	lock: Mutex<()>,
	failed: AtomicBool,
}

impl LogSink {
	/// Create a sink writing to `path`
	///
	/// Relative paths are resolved against the working directory at the
	/// time of each write. Nothing is opened until the first line.
	pub fn new(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			lock: Mutex::new(()),
			failed: AtomicBool::new(false),
		}
	}

	/// Path of the log file
	#[must_use]
	pub fn path(&self) -> &Path {
		&self.path
	}

	/// Append a line, swallowing any failure
	pub fn append(&self, line: &LogLine) {
		if let Err(e) = self.try_append(line) {
			// Report the first failure only; a broken sink stays broken
			if !self.failed.swap(true, Ordering::Relaxed) {
				warn!("Call log {} is not writable: {}", self.path.display(), e);
			}
		}
	}

	/// Append a line, returning the I/O failure if there is one
	pub fn try_append(&self, line: &LogLine) -> Result<()> {
		let mut buf = String::with_capacity(line.as_str().len() + 1);
		buf.push_str(line.as_str());
		buf.push('\n');

		let _guard = self.lock.lock().unwrap_or_else(PoisonError::into_inner);
		let mut file = OpenOptions::new().create(true).append(true).open(&self.path)?;
		file.write_all(buf.as_bytes())?;
		Ok(())
	}

	/// Whether a write has failed since the sink was created
	#[must_use]
	pub fn has_failed(&self) -> bool {
		self.failed.load(Ordering::Relaxed)
	}
}
