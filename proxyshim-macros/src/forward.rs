//! Code generation for the forwarding_table! macro
//!
//! For every export this emits:
//! 1. A `ForwardingEntry` static describing the export
//! 2. An exported function with the export's name and ABI, either a
//!    typed forwarder or a naked passthrough trampoline
//!
//! and finally the `ForwardingTable` static listing all entries.

use crate::table::{ExportDecl, TableInput};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::{FnArg, Ident, Pat, Type};

/// Generate the table static and every export
pub fn generate_table(input: &TableInput) -> syn::Result<TokenStream> {
	let table = &input.name;
	let table_attrs = &input.attrs;
	let table_vis = &input.vis;
	let table_name = table.to_string();

	let mut entry_idents = Vec::with_capacity(input.exports.len());
	let mut items = Vec::with_capacity(input.exports.len());
	for export in &input.exports {
		let entry_ident = format_ident!("__PROXYSHIM_ENTRY_{}", export.sig.ident);
		items.push(generate_export(table, &entry_ident, export)?);
		entry_idents.push(entry_ident);
	}

	Ok(quote! {
		#(#table_attrs)*
		#table_vis static #table: ::proxyshim::ForwardingTable =
			::proxyshim::ForwardingTable::new(#table_name, &[#(&#entry_idents),*]);

		#(#items)*
	})
}

/// Generate the entry static and the exported function for one export
fn generate_export(table: &Ident, entry_ident: &Ident, export: &ExportDecl) -> syn::Result<TokenStream> {
	let options = &export.options;
	let export_name = export.sig.ident.to_string();
	let symbol = options.symbol.as_ref().map_or_else(|| export_name.clone(), syn::LitStr::value);

	let constructor = if options.passthrough {
		quote!(passthrough)
	} else {
		quote!(typed)
	};
	let ordinal = options.ordinal.map(|ordinal| quote!(.with_ordinal(#ordinal)));
	let quiet = options.quiet.then(|| quote!(.quiet()));

	let function = if options.passthrough {
		generate_passthrough(entry_ident, export)?
	} else {
		generate_typed(table, entry_ident, export)?
	};

	Ok(quote! {
		#[allow(non_upper_case_globals)]
		static #entry_ident: ::proxyshim::ForwardingEntry =
			::proxyshim::ForwardingEntry::#constructor(#export_name, #symbol) #ordinal #quiet;

		#function
	})
}

/// Split the arguments into binding names and types
///
/// Arguments bound by anything other than a plain identifier get a
/// generated name.
fn arguments(export: &ExportDecl) -> syn::Result<(Vec<Ident>, Vec<&Type>)> {
	let mut idents = Vec::new();
	let mut types = Vec::new();

	for (index, arg) in export.sig.inputs.iter().enumerate() {
		match arg {
			FnArg::Typed(pat_type) => {
				let ident = match &*pat_type.pat {
					Pat::Ident(pat_ident) if pat_ident.subpat.is_none() => pat_ident.ident.clone(),
					_ => format_ident!("__arg{}", index),
				};
				idents.push(ident);
				types.push(&*pat_type.ty);
			},
			FnArg::Receiver(receiver) => {
				return Err(syn::Error::new_spanned(receiver, "forwarded exports cannot take self"));
			},
		}
	}

	Ok((idents, types))
}

/// A forwarder that logs, resolves and calls through a typed pointer
fn generate_typed(table: &Ident, entry_ident: &Ident, export: &ExportDecl) -> syn::Result<TokenStream> {
	let attrs = &export.attrs;
	let vis = &export.vis;
	let sig = &export.sig;
	let name = &sig.ident;
	let unsafety = &sig.unsafety;
	let abi = &sig.abi;
	let output = &sig.output;
	let (idents, types) = arguments(export)?;

	let enter = if export.options.log_args {
		let format = vec!["{:?}"; idents.len()].join(", ");
		quote! {
			#table.enter_with(&#entry_ident, || ::std::format!(#format, #(&#idents),*));
		}
	} else {
		quote! {
			#table.enter(&#entry_ident);
		}
	};

	let target = match &export.options.on_missing {
		Some(sentinel) => quote! {
			match #table.try_target(&#entry_ident) {
				::core::option::Option::Some(target) => target,
				::core::option::Option::None => return #sentinel,
			}
		},
		None => quote! {
			#table.target(&#entry_ident)
		},
	};

	Ok(quote! {
		#(#attrs)*
		#[allow(non_snake_case)]
		#[unsafe(no_mangle)]
		#vis #unsafety #abi fn #name(#(#idents: #types),*) #output {
			type __ProxyshimReal = unsafe #abi fn(#(#types),*) #output;

			#enter
			let __proxyshim_target = #target;
			let __proxyshim_real = unsafe {
				::core::mem::transmute::<::core::ptr::NonNull<::core::ffi::c_void>, __ProxyshimReal>(
					__proxyshim_target,
				)
			};
			unsafe { __proxyshim_real(#(#idents),*) }
		}
	})
}

/// A naked trampoline that jumps through the entry's bound slot
///
/// Variadic signatures cannot be spelled in a function definition, so
/// they are emitted without parameters; the symbol is what matters to
/// the host.
fn generate_passthrough(entry_ident: &Ident, export: &ExportDecl) -> syn::Result<TokenStream> {
	let attrs = &export.attrs;
	let vis = &export.vis;
	let sig = &export.sig;
	let name = &sig.ident;
	let abi = &sig.abi;

	let signature = if sig.variadic.is_some() {
		quote!(())
	} else {
		let (_, types) = arguments(export)?;
		let params = (0..types.len()).map(|index| format_ident!("_arg{}", index));
		let output = &sig.output;
		quote!((#(#params: #types),*) #output)
	};

	Ok(quote! {
		#(#attrs)*
		#[allow(non_snake_case)]
		#[unsafe(no_mangle)]
		#[unsafe(naked)]
		#vis unsafe #abi fn #name #signature {
			::proxyshim::__passthrough_jump!(#entry_ident)
		}
	})
}
