//! Parsing for the forwarding_table! macro
//!
//! The input is a table declaration followed by export signatures:
//!
//! ```text
//! [vis] static NAME;
//! (#[attr]* [vis] [unsafe] extern "abi" fn name(args) [-> ret];)*
//! ```

use std::collections::HashSet;
use syn::parse::{Parse, ParseStream};
use syn::{Attribute, Expr, FnArg, Ident, LitInt, LitStr, Signature, Token, Visibility};

/// A parsed `forwarding_table!` invocation
pub struct TableInput {
	/// Attributes on the table static
	pub attrs: Vec<Attribute>,
	/// Visibility of the table static
	pub vis: Visibility,
	/// Name of the table static
	pub name: Ident,
	/// The proxied exports
	pub exports: Vec<ExportDecl>,
}

/// One proxied export
pub struct ExportDecl {
	/// Attributes passed through to the generated function
	pub attrs: Vec<Attribute>,
	/// Visibility of the generated function
	pub vis: Visibility,
	/// The export's signature
	pub sig: Signature,
	/// Forwarding options taken from the attributes
	pub options: ExportOptions,
}

/// Forwarding options of one export
#[derive(Default)]
pub struct ExportOptions {
	pub symbol: Option<LitStr>,
	pub ordinal: Option<u16>,
	pub quiet: bool,
	pub log_args: bool,
	pub on_missing: Option<Expr>,
	pub passthrough: bool,
}

impl Parse for TableInput {
	fn parse(input: ParseStream) -> syn::Result<Self> {
		let attrs = input.call(Attribute::parse_outer)?;
		let vis: Visibility = input.parse()?;
		input.parse::<Token![static]>()?;
		let name: Ident = input.parse()?;
		input.parse::<Token![;]>()?;

		let mut exports: Vec<ExportDecl> = Vec::new();
		let mut seen = HashSet::new();
		while !input.is_empty() {
			let export: ExportDecl = input.parse()?;
			if !seen.insert(export.sig.ident.to_string()) {
				return Err(syn::Error::new_spanned(&export.sig.ident, "export is listed twice"));
			}
			exports.push(export);
		}

		Ok(Self {
			attrs,
			vis,
			name,
			exports,
		})
	}
}

impl Parse for ExportDecl {
	fn parse(input: ParseStream) -> syn::Result<Self> {
		let attrs = input.call(Attribute::parse_outer)?;
		let vis: Visibility = input.parse()?;
		let sig: Signature = input.parse()?;
		input.parse::<Token![;]>()?;

		let (mut options, attrs) = ExportOptions::extract(attrs)?;
		validate_signature(&sig, &mut options)?;

		Ok(Self {
			attrs,
			vis,
			sig,
			options,
		})
	}
}

impl ExportOptions {
	/// Split forwarding options from the attributes kept on the function
	fn extract(attrs: Vec<Attribute>) -> syn::Result<(Self, Vec<Attribute>)> {
		let mut options = Self::default();
		let mut kept = Vec::new();

		for attr in attrs {
			let path = attr.path();
			if path.is_ident("symbol") {
				options.symbol = Some(attr.parse_args::<LitStr>()?);
			} else if path.is_ident("ordinal") {
				let ordinal = attr.parse_args::<LitInt>()?;
				options.ordinal = Some(ordinal.base10_parse::<u16>()?);
			} else if path.is_ident("quiet") {
				attr.meta.require_path_only()?;
				options.quiet = true;
			} else if path.is_ident("log_args") {
				attr.meta.require_path_only()?;
				options.log_args = true;
			} else if path.is_ident("passthrough") {
				attr.meta.require_path_only()?;
				options.passthrough = true;
			} else if path.is_ident("on_missing") {
				options.on_missing = Some(attr.parse_args::<Expr>()?);
			} else {
				kept.push(attr);
			}
		}

		Ok((options, kept))
	}
}

/// Check that the signature can be forwarded
///
/// Variadic signatures switch the export to a passthrough trampoline.
fn validate_signature(sig: &Signature, options: &mut ExportOptions) -> syn::Result<()> {
	if sig.abi.is_none() {
		return Err(syn::Error::new_spanned(
			&sig.ident,
			"forwarded exports need an explicit ABI, e.g. `extern \"C\"`",
		));
	}
	if let Some(constness) = &sig.constness {
		return Err(syn::Error::new_spanned(constness, "forwarded exports cannot be const"));
	}
	if let Some(asyncness) = &sig.asyncness {
		return Err(syn::Error::new_spanned(asyncness, "forwarded exports cannot be async"));
	}
	if !sig.generics.params.is_empty() || sig.generics.where_clause.is_some() {
		return Err(syn::Error::new_spanned(&sig.generics, "forwarded exports cannot be generic"));
	}
	if let Some(FnArg::Receiver(receiver)) = sig.inputs.first() {
		return Err(syn::Error::new_spanned(receiver, "forwarded exports cannot take self"));
	}

	if sig.variadic.is_some() {
		options.passthrough = true;
	}

	if options.passthrough {
		if options.log_args {
			return Err(syn::Error::new_spanned(
				&sig.ident,
				"passthrough exports cannot log their arguments",
			));
		}
		if let Some(expr) = &options.on_missing {
			return Err(syn::Error::new_spanned(
				expr,
				"passthrough exports cannot return a sentinel; unresolved passthrough calls abort",
			));
		}
	}

	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use quote::quote;

	fn parse(tokens: proc_macro2::TokenStream) -> syn::Result<TableInput> {
		syn::parse2(tokens)
	}

	#[test]
	fn parses_options() {
		let input = parse(quote! {
			pub static TABLE;

			#[symbol("RealAdd")]
			#[ordinal(3)]
			#[quiet]
			pub unsafe extern "C" fn Add(a: i32, b: i32) -> i32;

			#[log_args]
			#[on_missing(-1)]
			#[cold]
			pub unsafe extern "C" fn Sub(a: i32, b: i32) -> i32;
		})
		.unwrap();

		assert_eq!(input.name, "TABLE");
		assert_eq!(input.exports.len(), 2);

		let add = &input.exports[0].options;
		assert_eq!(add.symbol.as_ref().unwrap().value(), "RealAdd");
		assert_eq!(add.ordinal, Some(3));
		assert!(add.quiet && !add.log_args && !add.passthrough);

		let sub = &input.exports[1];
		assert!(sub.options.log_args);
		assert!(sub.options.on_missing.is_some());
		assert_eq!(sub.attrs.len(), 1, "#[cold] stays on the function");
	}

	#[test]
	fn variadic_is_passthrough() {
		let input = parse(quote! {
			static TABLE;
			pub unsafe extern "C" fn Format(buf: *mut u8, fmt: *const u8, ...) -> i32;
		})
		.unwrap();
		assert!(input.exports[0].options.passthrough);
	}

	#[test]
	fn rejects_bad_declarations() {
		let duplicate = parse(quote! {
			static TABLE;
			pub unsafe extern "C" fn Add(a: i32) -> i32;
			pub unsafe extern "C" fn Add(a: i32) -> i32;
		});
		assert!(duplicate.is_err());

		let no_abi = parse(quote! {
			static TABLE;
			pub unsafe fn Add(a: i32) -> i32;
		});
		assert!(no_abi.is_err());

		let generic = parse(quote! {
			static TABLE;
			pub unsafe extern "C" fn Add<T>(a: T) -> i32;
		});
		assert!(generic.is_err());

		let sentinel_passthrough = parse(quote! {
			static TABLE;
			#[passthrough]
			#[on_missing(0)]
			pub unsafe extern "C" fn Add(a: i32) -> i32;
		});
		assert!(sentinel_passthrough.is_err());

		let bad_ordinal = parse(quote! {
			static TABLE;
			#[ordinal(70000)]
			pub unsafe extern "C" fn Add(a: i32) -> i32;
		});
		assert!(bad_ordinal.is_err());
	}
}
