use darling::ast::{Data, Style};
use proc_macro2::TokenStream;
use quote::{format_ident, quote};
use syn::Error;

use crate::common::{has_default_derive, CommonDeriveInput};

pub(crate) fn expand(input: CommonDeriveInput) -> Result<TokenStream, Error> {
	let type_ident = &input.ident;
	let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();
	let represents_absence = has_default_derive(&input).then(|| {
		quote! {
			fn represents_absence() -> bool {
				true
			}
		}
	});

	let (to_body, from_body) = match &input.data {
		Data::Struct(fields) => {
			let fields_all = &fields.fields;
			if fields_all.len() == 1 && fields_all[0].ident.is_none() {
				(
					quote! { avro_registry_codec::value::ToAvroValue::to_avro_value(&self.0) },
					quote! {
						Ok(Self(avro_registry_codec::value::FromAvroValue::from_avro_value(value)?))
					},
				)
			} else {
				let all_fields = input.all_fields.is_present();
				let fields: Vec<_> = fields_all.iter().filter(|f| f.is_exposed(all_fields)).collect();
				let skipped_idents: Vec<_> = fields_all
					.iter()
					.filter(|f| !f.is_exposed(all_fields))
					.map(|f| f.ident.as_ref().expect("named struct fields"))
					.collect();
				let names = fields.iter().map(|f| f.field_name());
				let idents = fields.iter().map(|f| f.ident.as_ref().expect("named struct fields"));

				let to_body = {
					let names = names.clone();
					let idents = idents.clone();
					quote! {
						avro_registry_codec::value::Value::Record(vec![#(
							(#names.to_owned(), avro_registry_codec::value::ToAvroValue::to_avro_value(&self.#idents)),
						)*])
					}
				};

				let from_body = {
					let names = names.clone();
					let idents = idents.clone();
					quote! {
						let mut fields = match value {
							avro_registry_codec::value::Value::Record(fields) => fields,
							other => return Err(avro_registry_codec::value::FromAvroValueError::new(
								format!("expected record, got {other:?}"),
							)),
						};
						#(
							let #idents = {
								let pos = fields.iter().position(|(name, _)| name == #names).ok_or_else(|| {
									avro_registry_codec::value::FromAvroValueError::new(
										format!("missing field `{}`", #names),
									)
								})?;
								avro_registry_codec::value::FromAvroValue::from_avro_value(fields.remove(pos).1)?
							};
						)*
						Ok(Self { #(#idents,)* #(#skipped_idents: Default::default(),)* })
					}
				};
				(to_body, from_body)
			}
		}
		Data::Enum(variants) => {
			let variants: Vec<_> = variants.iter().filter(|v| !v.skip.is_present()).collect();
			let all_unit = variants.iter().all(|v| v.fields.style == Style::Unit || v.fields.is_empty());
			if all_unit {
				let idents: Vec<_> = variants.iter().map(|v| &v.ident).collect();
				let names: Vec<_> = idents.iter().map(|ident| ident.to_string()).collect();
				let indices = 0..idents.len();
				let to_body = {
					let idents = idents.clone();
					let names = names.clone();
					let indices = indices.clone();
					quote! {
						match self {
							#(Self::#idents => avro_registry_codec::value::Value::Enum(#indices, #names.to_owned()),)*
						}
					}
				};
				let from_body = {
					let idents = idents.clone();
					let names = names.clone();
					let indices = indices.clone();
					quote! {
						// `EnumBehavior::Symbolic` decodes to `Value::Enum` by index;
						// `::Integral`/`::Nominal` built the field's schema as a bare
						// `int`/`string`, so the codec hands back a plain `Value::Int`/
						// `Value::String` instead - accept either shape here.
						match value {
							avro_registry_codec::value::Value::Enum(idx, _) => match idx {
								#(#indices => Ok(Self::#idents),)*
								other => Err(avro_registry_codec::value::FromAvroValueError::new(
									format!("enum index {other} out of range"),
								)),
							},
							avro_registry_codec::value::Value::Int(idx) => match idx as usize {
								#(#indices => Ok(Self::#idents),)*
								other => Err(avro_registry_codec::value::FromAvroValueError::new(
									format!("enum index {other} out of range"),
								)),
							},
							avro_registry_codec::value::Value::String(name) => match name.as_str() {
								#(#names => Ok(Self::#idents),)*
								other => Err(avro_registry_codec::value::FromAvroValueError::new(
									format!("unknown enum symbol `{other}`"),
								)),
							},
							other => Err(avro_registry_codec::value::FromAvroValueError::new(
								format!("expected enum, got {other:?}"),
							)),
						}
					}
				};
				(to_body, from_body)
			} else {
				let idents: Vec<_> = variants.iter().map(|v| v.ident.clone()).collect();
				let styles: Vec<_> = variants.iter().map(|v| v.fields.style).collect();
				let indices = 0..idents.len();

				let to_arms = idents.iter().zip(&styles).zip(indices.clone()).map(|((ident, style), idx)| {
					if *style == Style::Unit {
						quote! {
							Self::#ident => avro_registry_codec::value::Value::Union(
								#idx,
								Box::new(avro_registry_codec::value::Value::Null),
							),
						}
					} else {
						let binding = format_ident!("inner");
						quote! {
							Self::#ident(#binding) => avro_registry_codec::value::Value::Union(
								#idx,
								Box::new(avro_registry_codec::value::ToAvroValue::to_avro_value(#binding)),
							),
						}
					}
				});
				let to_body = quote! {
					match self {
						#(#to_arms)*
					}
				};

				let from_arms = idents.iter().zip(&styles).zip(indices).map(|((ident, style), idx)| {
					if *style == Style::Unit {
						quote! { #idx => Ok(Self::#ident), }
					} else {
						quote! {
							#idx => Ok(Self::#ident(avro_registry_codec::value::FromAvroValue::from_avro_value(*inner)?)),
						}
					}
				});
				let from_body = quote! {
					match value {
						avro_registry_codec::value::Value::Union(idx, inner) => match idx {
							#(#from_arms)*
							other => Err(avro_registry_codec::value::FromAvroValueError::new(
								format!("union index {other} out of range"),
							)),
						},
						other => Err(avro_registry_codec::value::FromAvroValueError::new(
							format!("expected union, got {other:?}"),
						)),
					}
				};
				(to_body, from_body)
			}
		}
	};

	Ok(quote! {
		impl #impl_generics avro_registry_codec::value::ToAvroValue for #type_ident #ty_generics #where_clause {
			fn to_avro_value(&self) -> avro_registry_codec::value::Value {
				#to_body
			}

			#represents_absence
		}

		impl #impl_generics avro_registry_codec::value::FromAvroValue for #type_ident #ty_generics #where_clause {
			fn from_avro_value(value: avro_registry_codec::value::Value) -> Result<Self, avro_registry_codec::value::FromAvroValueError> {
				#from_body
			}
		}
	})
}
