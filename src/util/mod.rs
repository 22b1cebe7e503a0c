//! Utility modules for proxyshim
//!
//! This module contains utility functions used across proxyshim.

pub mod logging;

pub use logging::init_logging;
