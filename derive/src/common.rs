use darling::ast::{Data, Fields};
use darling::{FromDeriveInput, FromField, FromVariant};
use proc_macro2::Ident;
use syn::{Generics, Type, Visibility};

#[derive(FromDeriveInput)]
#[darling(
	attributes(avro),
	supports(struct_named, struct_newtype, enum_unit, enum_newtype)
)]
pub(crate) struct CommonDeriveInput {
	pub(crate) ident: Ident,
	pub(crate) generics: Generics,
	pub(crate) data: Data<CommonVariant, CommonField>,
	pub(crate) attrs: Vec<syn::Attribute>,

	pub(crate) name: Option<String>,
	pub(crate) namespace: Option<String>,

	/// Mirrors `MemberVisibility::All`: without it, only `pub` fields are
	/// exposed as record fields (`MemberVisibility::Public`, the default).
	pub(crate) all_fields: darling::util::Flag,
}

/// Whether `input` also carries a `#[derive(Default, ...)]` sibling derive.
/// `AvroValue`'s expansion uses this to decide whether the host type has a
/// value standing in for "no value at all", for `TombstoneBehavior::Strict`.
pub(crate) fn has_default_derive(input: &CommonDeriveInput) -> bool {
	input.attrs.iter().any(|attr| {
		if !attr.path().is_ident("derive") {
			return false;
		}
		let mut found = false;
		let _ = attr.parse_nested_meta(|meta| {
			if meta.path.is_ident("Default") {
				found = true;
			}
			Ok(())
		});
		found
	})
}

#[derive(FromField, Clone)]
#[darling(attributes(avro))]
pub(crate) struct CommonField {
	pub(crate) ident: Option<Ident>,
	pub(crate) ty: Type,
	pub(crate) vis: Visibility,

	pub(crate) skip: darling::util::Flag,
	pub(crate) rename: Option<String>,
}

#[derive(FromVariant, Clone)]
#[darling(attributes(avro))]
pub(crate) struct CommonVariant {
	pub(crate) ident: Ident,
	pub(crate) fields: Fields<CommonField>,

	pub(crate) skip: darling::util::Flag,
}

impl CommonField {
	pub(crate) fn field_name(&self) -> String {
		self.rename
			.clone()
			.unwrap_or_else(|| self.ident.as_ref().expect("tuple fields are not supported").to_string())
	}

	/// Whether `MemberVisibility` exposes this field as a record field:
	/// always excluded by `#[avro(skip)]`; otherwise included under
	/// `all_fields`, or only if `pub`.
	pub(crate) fn is_exposed(&self, all_fields: bool) -> bool {
		!self.skip.is_present() && (all_fields || matches!(self.vis, Visibility::Public(_)))
	}
}

/// If `ty` is syntactically `Option<Inner>`, returns `Inner`. Used to let the
/// derive macro apply `NullableReferenceTypeBehavior` at schema-build time
/// rather than hard-coding the field's schema node to whatever the bare
/// Rust type would build: the macro can only read the syntax of the field
/// declaration, so this has to happen here rather than via the `ReflectType`
/// impl for `Option<T>` itself.
pub(crate) fn option_inner_type(ty: &Type) -> Option<&Type> {
	let Type::Path(type_path) = ty else { return None };
	if type_path.qself.is_some() {
		return None;
	}
	let segment = type_path.path.segments.last()?;
	if segment.ident != "Option" {
		return None;
	}
	let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
		return None;
	};
	args.args.iter().find_map(|arg| match arg {
		syn::GenericArgument::Type(inner) => Some(inner),
		_ => None,
	})
}

pub(crate) fn fully_qualified_name(input: &CommonDeriveInput) -> String {
	let name = input.name.clone().unwrap_or_else(|| input.ident.to_string());
	match &input.namespace {
		Some(ns) if !ns.is_empty() => format!("{ns}.{name}"),
		_ => name,
	}
}
