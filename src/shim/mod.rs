//! Shim configuration and state
//!
//! This module contains the builder, the process context and the
//! observer traits that make up a configured proxy shim.

mod builder;
mod context;
mod error;
mod filter;
mod hook;

pub use builder::{
	DEFAULT_LOG_FILE, ENV_LOG_FILE, ENV_NO_LOG, ENV_REAL_LIBRARY, MissingExportPolicy, ShimBuilder, ShimConfig,
};
pub use context::{LibraryState, ShimContext};
pub use error::{Result, ShimError};
pub use filter::{AllowAllFilter, AllowListFilter, BlockListFilter, ExportFilter};
pub use hook::{CallHook, CallInfo, TracingHook};

use crate::table::ForwardingTable;
use once_cell::sync::OnceCell;

// The table that was attached in this process
static ACTIVE_TABLE: OnceCell<&'static ForwardingTable> = OnceCell::new();

/// Get the attached forwarding table
pub fn active_table() -> Option<&'static ForwardingTable> {
	ACTIVE_TABLE.get().copied()
}

/// Record `table` as the attached one
pub(crate) fn set_active_table(table: &'static ForwardingTable) {
	if ACTIVE_TABLE.set(table).is_err() {
		tracing::warn!("Another forwarding table is already attached in this process");
	}
}
