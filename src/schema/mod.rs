//! The Avro schema object model: a validated, arena-backed representation of
//! every schema node, JSON parsing/serialization, and the reflection-driven
//! builder.

mod builder;
mod canonical_form;
mod error;
mod name;
mod node;
mod parsing;
mod serialize;

pub use builder::{
	build_record_field, build_schema, node_idx, nullable_case_pipeline, EnumBehavior, FieldShape,
	MemberVisibility, NullWrapDecision, NullableReferenceTypeBehavior, ReflectType, SchemaBuilder,
	SchemaBuilderConfig, TemporalBehavior,
};
pub use error::SchemaError;
pub use name::Name;
pub use node::{
	Array, Decimal, Enum, Fixed, LogicalType, Map, NameSet, Record, RecordField, RegularType,
	SchemaNode, UnknownLogicalType, Union,
};

/// A complete, validated Avro schema.
///
/// Internally an arena of [`SchemaNode`]s addressed by stable [`SchemaKey`]s,
/// so that cyclic named types (a record containing itself) are representable
/// without unsafe self-referential pointers.
#[derive(Debug, Clone)]
pub struct Schema {
	pub(crate) nodes: Vec<SchemaNode>,
	pub(crate) json: String,
	pub(crate) parsing_canonical_form: String,
	pub(crate) fingerprint: [u8; 8],
}

/// A stable index into a [`Schema`]'s node arena.
///
/// Indices are never invalidated for the lifetime of the [`Schema`] they were
/// obtained from: the arena is append-only during construction and immutable
/// afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SchemaKey {
	idx: usize,
}

impl SchemaKey {
	pub(crate) fn from_idx(idx: usize) -> Self {
		Self { idx }
	}

	pub fn idx(self) -> usize {
		self.idx
	}

	/// The root of any [`Schema`] is always at index `0`.
	pub fn root() -> Self {
		Self { idx: 0 }
	}
}

impl Schema {
	/// The root node of this schema.
	pub fn root(&self) -> &SchemaNode {
		&self.nodes[SchemaKey::root().idx()]
	}

	pub fn node(&self, key: SchemaKey) -> &SchemaNode {
		&self.nodes[key.idx()]
	}

	pub fn nodes(&self) -> &[SchemaNode] {
		&self.nodes
	}

	/// The JSON text this schema was built from (or the canonical rendering,
	/// if it was built from a [`SchemaBuilder`]).
	pub fn json(&self) -> &str {
		&self.json
	}

	/// [Parsing Canonical Form](https://avro.apache.org/docs/current/specification/#parsing-canonical-form-for-schemas)
	/// of this schema.
	pub fn parsing_canonical_form(&self) -> &str {
		&self.parsing_canonical_form
	}

	/// 64-bit Rabin fingerprint of the [Parsing Canonical
	/// Form](Self::parsing_canonical_form), as used for schema identity by
	/// the Avro single-object encoding.
	pub fn fingerprint(&self) -> [u8; 8] {
		self.fingerprint
	}
}

impl std::str::FromStr for Schema {
	type Err = SchemaError;

	fn from_str(json: &str) -> Result<Self, Self::Err> {
		parsing::parse(json)
	}
}

impl std::fmt::Display for Schema {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(&self.json)
	}
}
