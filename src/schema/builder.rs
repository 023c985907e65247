//! Reflection -> schema derivation (C4).
//!
//! Rust has no runtime reflection, so the "reflection" input is a
//! compile-time descriptor realized through the [`ReflectType`] trait: each
//! host type either hand-implements it (primitives, `Option<T>`, `Vec<T>`,
//! `HashMap<String, T>`, ...) or gets it generated by
//! `#[derive(ReflectType)]`. The trait's associated `Memo` type is the
//! identity this module memoizes on (mirroring the teacher's `TypeId`-keyed
//! `already_built` map), which is what makes a record that (directly or
//! indirectly) contains itself terminate.

use std::any::TypeId;
use std::collections::{hash_map::Entry, HashMap};

use super::{node::*, Name, SchemaKey};
use crate::case_pipeline::{CaseOutcome, CasePipeline};

/// How enum-shaped host types are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EnumBehavior {
	/// One Avro `enum` symbol per variant (default).
	#[default]
	Symbolic,
	/// The variant's discriminant, as `int`.
	Integral,
	/// The variant's name, as `string`.
	Nominal,
}

/// How date/time-shaped host types are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TemporalBehavior {
	/// ISO-8601 text, as `string`.
	Iso8601,
	/// Native Avro logical type backed by milliseconds.
	#[default]
	EpochMilliseconds,
	/// Native Avro logical type backed by microseconds.
	EpochMicroseconds,
}

/// How `Option<T>` fields/elements/values are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NullableReferenceTypeBehavior {
	/// Strip the `Option` and build `T` directly.
	None,
	/// Wrap every field/item/value in `union{T, null}`, even when it isn't
	/// already `Option<T>`.
	All,
	/// `Option<T>` becomes `union{null, T}`; anything else is built as-is
	/// (default - this is what the Rust type already tells us).
	#[default]
	Annotated,
}

/// Which struct/enum members a `#[derive(ReflectType)]` expands exposes as
/// Avro record fields / enum symbols.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MemberVisibility {
	/// Only `pub` members (default), refined by `#[avro(skip)]`/`#[avro(data_member)]`.
	#[default]
	Public,
	/// All members regardless of visibility.
	All,
}

#[derive(Debug, Clone, Default)]
pub struct SchemaBuilderConfig {
	pub enum_behavior: EnumBehavior,
	pub temporal_behavior: TemporalBehavior,
	pub nullable_behavior: NullableReferenceTypeBehavior,
	pub member_visibility: MemberVisibility,
}

/// Per-field descriptor used by the nullable-wrapping case pipeline. Built by
/// derive-macro-generated code once per record field / array item / map
/// value.
pub struct FieldShape {
	/// Whether the Rust field type is itself `Option<_>`.
	pub is_option: bool,
}

/// How a record field's schema node should be built from its already-known
/// inner type `T` (the declared field type with any `Option` wrapper
/// stripped off syntactically by the derive macro).
pub enum NullWrapDecision {
	/// Build `T` directly, no union.
	Bare,
	/// `union{null, T}` - an `Option<T>` field under *Annotated*/*All*.
	WrapNullFirst,
	/// `union{T, null}` - a plain field wrapped under *All* (null appended,
	/// not prepended, to preserve default-value semantics).
	WrapNullLast,
}

/// The ordered decision for whether/how to apply nullability wrapping,
/// genuinely data+config driven - a natural fit for the case-pipeline engine
/// used elsewhere for schema construction.
pub fn nullable_case_pipeline(
) -> CasePipeline<FieldShape, NullableReferenceTypeBehavior, NullWrapDecision> {
	CasePipeline::new()
		.push(|shape: &FieldShape, behavior: &mut NullableReferenceTypeBehavior| {
			Ok(if shape.is_option && *behavior == NullableReferenceTypeBehavior::None {
				// None mode discards nullability entirely: the Option is
				// stripped before recursing, so the field's schema is just T.
				CaseOutcome::Applied(NullWrapDecision::Bare)
			} else {
				CaseOutcome::NotApplicable("not an Option field stripped under None".into())
			})
		})
		.push(|shape: &FieldShape, _: &mut NullableReferenceTypeBehavior| {
			Ok(if shape.is_option {
				// Option<T> is itself an explicit nullability annotation,
				// independent of the configured behavior (case 1).
				CaseOutcome::Applied(NullWrapDecision::WrapNullFirst)
			} else {
				CaseOutcome::NotApplicable("not an Option field".into())
			})
		})
		.push(|shape: &FieldShape, behavior: &mut NullableReferenceTypeBehavior| {
			Ok(if !shape.is_option && *behavior == NullableReferenceTypeBehavior::All {
				CaseOutcome::Applied(NullWrapDecision::WrapNullLast)
			} else {
				CaseOutcome::NotApplicable("not in NullableReferenceTypeBehavior::All".into())
			})
		})
		.push(|_: &FieldShape, _: &mut NullableReferenceTypeBehavior| {
			Ok(CaseOutcome::Applied(NullWrapDecision::Bare))
		})
}

pub struct SchemaBuilder {
	pub(crate) nodes: Vec<SchemaNode>,
	already_built: HashMap<TypeId, SchemaKey>,
	pub config: SchemaBuilderConfig,
}

impl SchemaBuilder {
	pub fn new(config: SchemaBuilderConfig) -> Self {
		Self {
			nodes: Vec::new(),
			already_built: HashMap::new(),
			config,
		}
	}

	pub fn reserve(&mut self) -> SchemaKey {
		let key = SchemaKey::from_idx(self.nodes.len());
		self.nodes.push(SchemaNode::new(RegularType::Null));
		key
	}

	pub fn set(&mut self, key: SchemaKey, node: SchemaNode) {
		self.nodes[key.idx()] = node;
	}

	pub fn push(&mut self, node: SchemaNode) -> SchemaKey {
		let key = SchemaKey::from_idx(self.nodes.len());
		self.nodes.push(node);
		key
	}

	/// The nodes built so far, for validating constructs (e.g. unions) that
	/// need to inspect sibling nodes already placed in the arena.
	pub fn nodes(&self) -> &[SchemaNode] {
		&self.nodes
	}
}

impl Default for SchemaBuilder {
	fn default() -> Self {
		Self::new(SchemaBuilderConfig::default())
	}
}

/// A host type we know how to turn into an Avro schema node.
///
/// `Memo` is the identity this builder memoizes recursive construction on:
/// two types that produce the same `Memo` share the same schema node, and a
/// type containing itself (directly or through `Vec`/`Option`/...) resolves
/// through the placeholder inserted before recursion.
pub trait ReflectType {
	type Memo: 'static;
	fn build(builder: &mut SchemaBuilder) -> SchemaKey;
}

/// Builds (or returns the memoized) [`SchemaKey`] for `T`.
pub fn node_idx<T: ReflectType>(builder: &mut SchemaBuilder) -> SchemaKey {
	match builder.already_built.entry(TypeId::of::<T::Memo>()) {
		Entry::Occupied(entry) => *entry.get(),
		Entry::Vacant(entry) => {
			let expected = SchemaKey::from_idx(builder.nodes.len());
			entry.insert(expected);
			let actual = T::build(builder);
			debug_assert_eq!(actual.idx(), expected.idx(), "ReflectType::build must push its own node first");
			actual
		}
	}
}

/// Builds a complete, standalone [`crate::Schema`] for `T`.
pub fn build_schema<T: ReflectType>(config: SchemaBuilderConfig) -> crate::Schema {
	let mut builder = SchemaBuilder::new(config);
	let root = node_idx::<T>(&mut builder);
	debug_assert_eq!(root.idx(), 0);
	let json = {
		let tmp = crate::Schema {
			nodes: builder.nodes.clone(),
			json: String::new(),
			parsing_canonical_form: String::new(),
			fingerprint: [0; 8],
		};
		tmp.to_json()
	};
	json.parse().expect("schema built by ReflectType must be valid JSON Avro")
}

macro_rules! impl_primitive {
	($($ty:ty, $variant:ident;)+) => {
		$(
			impl ReflectType for $ty {
				type Memo = Self;
				fn build(builder: &mut SchemaBuilder) -> SchemaKey {
					builder.push(SchemaNode::new(RegularType::$variant))
				}
			}
		)*
	};
}
impl_primitive!(
	(), Null;
	bool, Boolean;
	i32, Int;
	i64, Long;
	f32, Float;
	f64, Double;
	String, String;
	Vec<u8>, Bytes;
);

impl ReflectType for &'_ str {
	type Memo = String;
	fn build(builder: &mut SchemaBuilder) -> SchemaKey {
		<String as ReflectType>::build(builder)
	}
}

impl ReflectType for &'_ [u8] {
	type Memo = Vec<u8>;
	fn build(builder: &mut SchemaBuilder) -> SchemaKey {
		<Vec<u8> as ReflectType>::build(builder)
	}
}

/// Builds the schema node for a single record field / enum tuple-variant
/// payload, applying `NullableReferenceTypeBehavior` at that position via
/// [`nullable_case_pipeline`]. `T` is always the field's *inner* type - the
/// caller (derive-macro-generated code) has already stripped the `Option`
/// wrapper syntactically and passes `is_option` to say whether it was there.
pub fn build_record_field<T: ReflectType>(builder: &mut SchemaBuilder, is_option: bool) -> SchemaKey {
	let mut behavior = builder.config.nullable_behavior;
	let decision = nullable_case_pipeline()
		.run(&FieldShape { is_option }, &mut behavior)
		.expect("the pipeline's fallback case always applies");
	match decision {
		NullWrapDecision::Bare => node_idx::<T>(builder),
		NullWrapDecision::WrapNullFirst => wrap_nullable(builder, true, node_idx::<T>),
		NullWrapDecision::WrapNullLast => wrap_nullable(builder, false, node_idx::<T>),
	}
}

/// `union{null, inner}` when `null_first` (an `Option<T>` field under
/// *Annotated*/*All*), `union{inner, null}` otherwise (a plain field wrapped
/// under *All* - null is appended to preserve default-value semantics).
fn wrap_nullable(
	builder: &mut SchemaBuilder,
	null_first: bool,
	build_inner: impl FnOnce(&mut SchemaBuilder) -> SchemaKey,
) -> SchemaKey {
	let reserved = builder.reserve();
	let null = node_idx::<()>(builder);
	let inner = build_inner(builder);
	let variants = if null_first { vec![null, inner] } else { vec![inner, null] };
	let union = Union::new(variants, &builder.nodes).expect("null/inner union is always valid");
	builder.set(reserved, SchemaNode::new(union));
	reserved
}

impl<T: ReflectType> ReflectType for Option<T> {
	type Memo = Option<T::Memo>;
	fn build(builder: &mut SchemaBuilder) -> SchemaKey {
		let reserved = builder.reserve();
		let null = node_idx::<()>(builder);
		let inner = node_idx::<T>(builder);
		let union = Union::new(vec![null, inner], &builder.nodes).expect("null/inner union is always valid");
		builder.set(reserved, SchemaNode::new(union));
		reserved
	}
}

impl<T: ReflectType> ReflectType for Vec<T> {
	type Memo = Vec<T::Memo>;
	fn build(builder: &mut SchemaBuilder) -> SchemaKey {
		let reserved = builder.reserve();
		let items = node_idx::<T>(builder);
		builder.set(reserved, SchemaNode::new(Array { items }));
		reserved
	}
}

impl<T: ReflectType> ReflectType for &'_ [T] {
	type Memo = Vec<T::Memo>;
	fn build(builder: &mut SchemaBuilder) -> SchemaKey {
		<Vec<T> as ReflectType>::build(builder)
	}
}

impl<const N: usize> ReflectType for [u8; N] {
	type Memo = Self;
	fn build(builder: &mut SchemaBuilder) -> SchemaKey {
		builder.push(SchemaNode::new(Fixed {
			name: Name::from_fully_qualified(&format!("fixed_{N}")).expect("generated name is always valid"),
			size: N,
			aliases: Vec::new(),
		}))
	}
}

impl<V: ReflectType> ReflectType for HashMap<String, V> {
	type Memo = HashMap<(), V::Memo>;
	fn build(builder: &mut SchemaBuilder) -> SchemaKey {
		let reserved = builder.reserve();
		let values = node_idx::<V>(builder);
		builder.set(reserved, SchemaNode::new(Map { values }));
		reserved
	}
}

impl<V: ReflectType> ReflectType for std::collections::BTreeMap<String, V> {
	type Memo = <HashMap<String, V> as ReflectType>::Memo;
	fn build(builder: &mut SchemaBuilder) -> SchemaKey {
		<HashMap<String, V> as ReflectType>::build(builder)
	}
}

impl ReflectType for uuid::Uuid {
	type Memo = Self;
	fn build(builder: &mut SchemaBuilder) -> SchemaKey {
		let key = builder.push(SchemaNode::new(RegularType::String));
		builder.nodes[key.idx()].logical_type = Some(LogicalType::Uuid);
		key
	}
}

impl ReflectType for rust_decimal::Decimal {
	type Memo = Self;
	fn build(builder: &mut SchemaBuilder) -> SchemaKey {
		let key = builder.push(SchemaNode::new(RegularType::Bytes));
		builder.nodes[key.idx()].logical_type = Some(LogicalType::Decimal(
			Decimal::new(29, 14).expect("29/14 is always a valid decimal logical type"),
		));
		key
	}
}

impl ReflectType for chrono::NaiveDate {
	type Memo = Self;
	fn build(builder: &mut SchemaBuilder) -> SchemaKey {
		match builder.config.temporal_behavior {
			TemporalBehavior::Iso8601 => builder.push(SchemaNode::new(RegularType::String)),
			TemporalBehavior::EpochMilliseconds | TemporalBehavior::EpochMicroseconds => {
				let key = builder.push(SchemaNode::new(RegularType::Int));
				builder.nodes[key.idx()].logical_type = Some(LogicalType::Date);
				key
			}
		}
	}
}

impl ReflectType for chrono::NaiveTime {
	type Memo = Self;
	fn build(builder: &mut SchemaBuilder) -> SchemaKey {
		match builder.config.temporal_behavior {
			TemporalBehavior::Iso8601 => builder.push(SchemaNode::new(RegularType::String)),
			TemporalBehavior::EpochMilliseconds => {
				let key = builder.push(SchemaNode::new(RegularType::Int));
				builder.nodes[key.idx()].logical_type = Some(LogicalType::TimeMillis);
				key
			}
			TemporalBehavior::EpochMicroseconds => {
				let key = builder.push(SchemaNode::new(RegularType::Long));
				builder.nodes[key.idx()].logical_type = Some(LogicalType::TimeMicros);
				key
			}
		}
	}
}

impl ReflectType for chrono::DateTime<chrono::Utc> {
	type Memo = Self;
	fn build(builder: &mut SchemaBuilder) -> SchemaKey {
		match builder.config.temporal_behavior {
			TemporalBehavior::Iso8601 => builder.push(SchemaNode::new(RegularType::String)),
			TemporalBehavior::EpochMilliseconds => {
				let key = builder.push(SchemaNode::new(RegularType::Long));
				builder.nodes[key.idx()].logical_type = Some(LogicalType::TimestampMillis);
				key
			}
			TemporalBehavior::EpochMicroseconds => {
				let key = builder.push(SchemaNode::new(RegularType::Long));
				builder.nodes[key.idx()].logical_type = Some(LogicalType::TimestampMicros);
				key
			}
		}
	}
}

impl ReflectType for chrono::Duration {
	type Memo = Self;
	fn build(builder: &mut SchemaBuilder) -> SchemaKey {
		let key = builder.push(SchemaNode::new(Fixed {
			name: Name::from_fully_qualified("duration").expect("literal name is valid"),
			size: 12,
			aliases: Vec::new(),
		}));
		builder.nodes[key.idx()].logical_type = Some(LogicalType::Duration);
		key
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn primitive_schema() {
		let schema = build_schema::<i64>(SchemaBuilderConfig::default());
		assert!(matches!(schema.root().type_, RegularType::Long));
	}

	#[test]
	fn option_wraps_in_union_with_null_first() {
		let schema = build_schema::<Option<String>>(SchemaBuilderConfig::default());
		let RegularType::Union(u) = &schema.root().type_ else {
			panic!("expected union")
		};
		assert!(matches!(schema.node(u.variants()[0]).type_, RegularType::Null));
		assert!(matches!(schema.node(u.variants()[1]).type_, RegularType::String));
	}

	#[test]
	fn vec_of_self_referential_option_terminates() {
		// Vec<Option<i32>> recurses through Option<i32> and i32 without
		// cycling back to Vec<Option<i32>> itself, but exercises the same
		// memoization path a genuinely self-referential record would.
		let schema = build_schema::<Vec<Option<i32>>>(SchemaBuilderConfig::default());
		assert!(matches!(schema.root().type_, RegularType::Array(_)));
	}
}
