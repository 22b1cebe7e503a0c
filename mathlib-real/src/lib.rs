//! A small library with C exports
//!
//! Deployed as `real/<prefix>mathlib<suffix>` next to the shim, which
//! takes its file name in the host's search path.

#![allow(non_snake_case)]

/// `a + b`, wrapping on overflow
#[unsafe(no_mangle)]
pub extern "C" fn Add(a: i32, b: i32) -> i32 {
	a.wrapping_add(b)
}

/// `a - b`, wrapping on overflow
#[unsafe(no_mangle)]
pub extern "C" fn Sub(a: i32, b: i32) -> i32 {
	a.wrapping_sub(b)
}

/// `a * b`, wrapping on overflow
#[unsafe(no_mangle)]
pub extern "C" fn Mul(a: i32, b: i32) -> i32 {
	a.wrapping_mul(b)
}

/// Library version, packed as `major << 16 | minor`
#[unsafe(no_mangle)]
pub extern "C" fn Version() -> u32 {
	1 << 16
}
