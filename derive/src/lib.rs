//! Derive macros for `avro_registry_codec`: `#[derive(ReflectType)]` builds a
//! `schema::ReflectType` impl for a struct/enum; `#[derive(AvroValue)]` builds
//! `ToAvroValue`/`FromAvroValue` impls for the same.

mod common;
mod reflect_type;
mod value;

use darling::FromDeriveInput;
use proc_macro::TokenStream;
use syn::{parse_macro_input, DeriveInput};

#[proc_macro_derive(ReflectType, attributes(avro))]
pub fn derive_reflect_type(input: TokenStream) -> TokenStream {
	let input = parse_macro_input!(input as DeriveInput);
	let parsed = match common::CommonDeriveInput::from_derive_input(&input) {
		Ok(parsed) => parsed,
		Err(err) => return err.write_errors().into(),
	};
	reflect_type::expand(parsed).unwrap_or_else(|err| err.to_compile_error()).into()
}

#[proc_macro_derive(AvroValue, attributes(avro))]
pub fn derive_avro_value(input: TokenStream) -> TokenStream {
	let input = parse_macro_input!(input as DeriveInput);
	let parsed = match common::CommonDeriveInput::from_derive_input(&input) {
		Ok(parsed) => parsed,
		Err(err) => return err.write_errors().into(),
	};
	value::expand(parsed).unwrap_or_else(|err| err.to_compile_error()).into()
}
