extern crate proc_macro;

use proc_macro::TokenStream;
use syn::parse_macro_input;

mod forward;
mod table;

use forward::generate_table;
use table::TableInput;

/// Generate the forwarding entries of a proxy shim
///
/// The input names the table static, then lists the proxied exports as
/// foreign-function signatures. Every signature becomes an exported
/// `#[no_mangle]` function with the same name and ABI that forwards to
/// the real library through the table.
///
/// Per-export attributes:
/// - `#[symbol("Name")]` forward to a differently named real export
/// - `#[ordinal(N)]` look the real export up by ordinal where supported
/// - `#[quiet]` do not write call log lines
/// - `#[log_args]` include the `Debug` rendering of the arguments
/// - `#[on_missing(expr)]` value returned when the export cannot be
///   resolved and the shim runs with `MissingExportPolicy::Sentinel`
/// - `#[passthrough]` forward with a naked tail jump; implied for
///   variadic signatures
///
/// # Example
///
/// ```ignore
/// proxyshim::forwarding_table! {
///     static TABLE;
///
///     pub unsafe extern "C" fn Add(a: i32, b: i32) -> i32;
///
///     #[symbol("sum_v2")]
///     #[on_missing(-1)]
///     pub unsafe extern "C" fn Sum(values: *const i32, len: usize) -> i32;
/// }
/// ```
#[proc_macro]
pub fn forwarding_table(input: TokenStream) -> TokenStream {
	let input = parse_macro_input!(input as TableInput);
	match generate_table(&input) {
		Ok(output) => output.into(),
		Err(err) => err.to_compile_error().into(),
	}
}
