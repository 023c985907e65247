use darling::ast::{Data, Style};
use proc_macro2::TokenStream;
use quote::quote;
use syn::Error;

use crate::common::{fully_qualified_name, option_inner_type, CommonDeriveInput};

pub(crate) fn expand(input: CommonDeriveInput) -> Result<TokenStream, Error> {
	let type_ident = &input.ident;
	let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
	let full_name = fully_qualified_name(&input);

	let body = match &input.data {
		Data::Struct(fields) => {
			let unfiltered: Vec<_> = fields.fields.iter().collect();
			if unfiltered.len() == 1 && unfiltered[0].ident.is_none() {
				let ty = &unfiltered[0].ty;
				quote! {
					<#ty as avro_registry_codec::schema::ReflectType>::build(builder)
				}
			} else {
				let all_fields = input.all_fields.is_present();
				let fields: Vec<_> = unfiltered.into_iter().filter(|f| f.is_exposed(all_fields)).collect();
				let field_names = fields.iter().map(|f| f.field_name());
				let field_build = fields.iter().map(|f| match option_inner_type(&f.ty) {
					Some(inner) => quote! {
						avro_registry_codec::schema::build_record_field::<#inner>(builder, true)
					},
					None => {
						let ty = &f.ty;
						quote! {
							avro_registry_codec::schema::build_record_field::<#ty>(builder, false)
						}
					}
				});
				quote! {
					let reserved = builder.reserve();
					let fields = vec![#(
						avro_registry_codec::schema::RecordField {
							name: #field_names.to_owned(),
							type_: #field_build,
							default: None,
							documentation: None,
							aliases: Vec::new(),
						},
					)*];
					let record = avro_registry_codec::schema::Record {
						name: avro_registry_codec::schema::Name::from_fully_qualified(#full_name)
							.expect("derived type name is always a valid Avro name"),
						fields,
						documentation: None,
						aliases: Vec::new(),
					};
					builder.set(reserved, record.into());
					reserved
				}
			}
		}
		Data::Enum(variants) => {
			let variants: Vec<_> = variants.iter().filter(|v| !v.skip.is_present()).collect();
			let all_unit = variants.iter().all(|v| v.fields.style == Style::Unit || v.fields.is_empty());
			if all_unit {
				let symbols = variants.iter().map(|v| v.ident.to_string());
				quote! {
					// `EnumBehavior::Integral`/`::Nominal` render the whole
					// type as a bare `int`/`string` instead of an Avro `enum` -
					// a runtime choice, unlike `MemberVisibility`, since nothing
					// about the Rust enum's syntax picks it.
					match builder.config.enum_behavior {
						avro_registry_codec::schema::EnumBehavior::Integral => {
							avro_registry_codec::schema::node_idx::<i32>(builder)
						}
						avro_registry_codec::schema::EnumBehavior::Nominal => {
							avro_registry_codec::schema::node_idx::<String>(builder)
						}
						avro_registry_codec::schema::EnumBehavior::Symbolic => {
							let mut symbols = avro_registry_codec::schema::NameSet::new();
							#(symbols.insert(#symbols.to_owned()).expect("derived enum symbols are unique by construction");)*
							let enum_ = avro_registry_codec::schema::Enum {
								name: avro_registry_codec::schema::Name::from_fully_qualified(#full_name)
									.expect("derived type name is always a valid Avro name"),
								symbols,
								default: None,
								documentation: None,
								aliases: Vec::new(),
							};
							builder.push(enum_.into())
						}
					}
				}
			} else {
				let variant_build = variants.iter().map(|v| match v.fields.style {
					Style::Unit => Ok(quote! { avro_registry_codec::schema::node_idx::<()>(builder) }),
					Style::Tuple => {
						let ty = &v.fields.fields[0].ty;
						Ok(quote! { avro_registry_codec::schema::node_idx::<#ty>(builder) })
					}
					Style::Struct => Err(Error::new_spanned(
						&v.ident,
						"struct-shaped enum variants are not supported by ReflectType derive",
					)),
				});
				let variant_build: Vec<TokenStream> = variant_build.collect::<Result<_, _>>()?;
				quote! {
					let reserved = builder.reserve();
					let variants = vec![#(#variant_build,)*];
					let union = avro_registry_codec::schema::Union::new(variants, builder.nodes())
						.expect("derived union variants are validated at expansion time");
					builder.set(reserved, union.into());
					reserved
				}
			}
		}
	};

	Ok(quote! {
		impl #impl_generics avro_registry_codec::schema::ReflectType for #type_ident #ty_generics #where_clause {
			type Memo = Self;

			fn build(builder: &mut avro_registry_codec::schema::SchemaBuilder) -> avro_registry_codec::schema::SchemaKey {
				#body
			}
		}
	})
}
