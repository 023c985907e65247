use super::{Name, SchemaError, SchemaKey};

/// A single node of a [`Schema`](super::Schema)'s arena.
///
/// Logical types are represented as a decorator on top of the underlying
/// physical type, rather than as separate variants, so that a reader that
/// doesn't understand a given logical type can still fall back to the
/// physical type.
#[derive(Debug, Clone)]
pub struct SchemaNode {
	pub type_: RegularType,
	pub logical_type: Option<LogicalType>,
}

impl SchemaNode {
	pub(crate) fn new(type_: impl Into<RegularType>) -> Self {
		Self {
			type_: type_.into(),
			logical_type: None,
		}
	}
}

/// The physical (non-logical) shape of a [`SchemaNode`].
#[derive(Debug, Clone)]
pub enum RegularType {
	Null,
	Boolean,
	Int,
	Long,
	Float,
	Double,
	Bytes,
	String,
	Array(Array),
	Map(Map),
	Union(Union),
	Fixed(Fixed),
	Enum(Enum),
	Record(Record),
}

macro_rules! impl_froms {
	($($variant:ident($ty:ty)),* $(,)?) => {
		$(
			impl From<$ty> for RegularType {
				fn from(v: $ty) -> Self {
					RegularType::$variant(v)
				}
			}
			impl From<$ty> for SchemaNode {
				fn from(v: $ty) -> Self {
					SchemaNode::new(v)
				}
			}
		)*
	};
}

impl_froms!(
	Array(Array),
	Map(Map),
	Union(Union),
	Fixed(Fixed),
	Enum(Enum),
	Record(Record),
);

#[derive(Debug, Clone)]
pub struct Array {
	pub items: SchemaKey,
}

#[derive(Debug, Clone)]
pub struct Map {
	pub values: SchemaKey,
}

/// A `union`'s ordered member list.
///
/// Construction is validated: no nested unions, and at most one member of
/// any given non-named physical shape.
#[derive(Debug, Clone)]
pub struct Union {
	variants: Vec<SchemaKey>,
}

impl Union {
	pub fn new(
		variants: Vec<SchemaKey>,
		nodes: &[SchemaNode],
	) -> Result<Self, SchemaError> {
		let mut seen_unnamed = std::collections::HashSet::new();
		for &key in &variants {
			let node = &nodes[key.idx()];
			match &node.type_ {
				RegularType::Union(_) => {
					return Err(SchemaError::invalid_schema(
						"a union may not immediately contain another union",
					))
				}
				RegularType::Record(r) => {
					if !seen_unnamed.insert(NamedDiscriminant::Record(r.name.fully_qualified_name().to_owned())) {
						return Err(SchemaError::invalid_schema(
							"duplicate named member in union",
						));
					}
				}
				RegularType::Enum(e) => {
					if !seen_unnamed.insert(NamedDiscriminant::Enum(e.name.fully_qualified_name().to_owned())) {
						return Err(SchemaError::invalid_schema(
							"duplicate named member in union",
						));
					}
				}
				RegularType::Fixed(fx) => {
					if !seen_unnamed.insert(NamedDiscriminant::Fixed(fx.name.fully_qualified_name().to_owned())) {
						return Err(SchemaError::invalid_schema(
							"duplicate named member in union",
						));
					}
				}
				other => {
					if !seen_unnamed.insert(NamedDiscriminant::Unnamed(discriminant_tag(other))) {
						return Err(SchemaError::invalid_schema(
							"union may contain at most one member of a given non-named type",
						));
					}
				}
			}
		}
		Ok(Self { variants })
	}

	pub fn variants(&self) -> &[SchemaKey] {
		&self.variants
	}

	pub(crate) fn variants_mut(&mut self) -> &mut [SchemaKey] {
		&mut self.variants
	}

	/// Index of the `null` member, if any.
	pub fn null_variant_idx(&self, nodes: &[SchemaNode]) -> Option<usize> {
		self.variants
			.iter()
			.position(|&k| matches!(nodes[k.idx()].type_, RegularType::Null))
	}
}

#[derive(Debug, PartialEq, Eq, Hash)]
enum NamedDiscriminant {
	Record(String),
	Enum(String),
	Fixed(String),
	Unnamed(u8),
}

fn discriminant_tag(t: &RegularType) -> u8 {
	match t {
		RegularType::Null => 0,
		RegularType::Boolean => 1,
		RegularType::Int => 2,
		RegularType::Long => 3,
		RegularType::Float => 4,
		RegularType::Double => 5,
		RegularType::Bytes => 6,
		RegularType::String => 7,
		RegularType::Array(_) => 8,
		RegularType::Map(_) => 9,
		RegularType::Union(_) | RegularType::Record(_) | RegularType::Enum(_) | RegularType::Fixed(_) => {
			unreachable!("named/union variants are handled separately")
		}
	}
}

#[derive(Debug, Clone)]
pub struct Fixed {
	pub name: Name,
	pub size: usize,
	pub aliases: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Enum {
	pub name: Name,
	pub symbols: NameSet,
	pub default: Option<usize>,
	pub documentation: Option<String>,
	pub aliases: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct Record {
	pub name: Name,
	pub fields: Vec<RecordField>,
	pub documentation: Option<String>,
	pub aliases: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct RecordField {
	pub name: String,
	pub type_: SchemaKey,
	pub default: Option<serde_json::Value>,
	pub documentation: Option<String>,
	pub aliases: Vec<String>,
}

/// A logical-type decorator attached to a [`SchemaNode`].
#[derive(Debug, Clone)]
pub enum LogicalType {
	Decimal(Decimal),
	Uuid,
	Date,
	TimeMillis,
	TimeMicros,
	TimestampMillis,
	TimestampMicros,
	Duration,
	/// A `logicalType` this implementation doesn't recognize; preserved
	/// verbatim so JSON round-trips survive an unknown decorator.
	Unknown(UnknownLogicalType),
}

impl LogicalType {
	pub fn as_str(&self) -> &str {
		match self {
			LogicalType::Decimal(_) => "decimal",
			LogicalType::Uuid => "uuid",
			LogicalType::Date => "date",
			LogicalType::TimeMillis => "time-millis",
			LogicalType::TimeMicros => "time-micros",
			LogicalType::TimestampMillis => "timestamp-millis",
			LogicalType::TimestampMicros => "timestamp-micros",
			LogicalType::Duration => "duration",
			LogicalType::Unknown(u) => &u.logical_type_name,
		}
	}
}

#[derive(Debug, Clone)]
pub struct Decimal {
	pub precision: usize,
	pub scale: usize,
}

impl Decimal {
	pub fn new(precision: usize, scale: usize) -> Result<Self, SchemaError> {
		if precision < 1 || scale > precision {
			return Err(SchemaError::invalid_decimal(precision, scale));
		}
		Ok(Self { precision, scale })
	}
}

#[derive(Debug, Clone)]
pub struct UnknownLogicalType {
	pub logical_type_name: String,
}

/// An insertion-ordered set of validated names (enum symbols, aliases),
/// rejecting duplicates rather than silently deduplicating.
#[derive(Debug, Clone, Default)]
pub struct NameSet {
	order: Vec<String>,
	set: std::collections::HashSet<String>,
}

impl NameSet {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn insert(&mut self, name: String) -> Result<(), SchemaError> {
		if !self.set.insert(name.clone()) {
			return Err(SchemaError::invalid_schema(format!(
				"duplicate entry: `{name}`"
			)));
		}
		self.order.push(name);
		Ok(())
	}

	pub fn iter(&self) -> impl Iterator<Item = &str> {
		self.order.iter().map(String::as_str)
	}

	pub fn contains(&self, name: &str) -> bool {
		self.set.contains(name)
	}

	pub fn position(&self, name: &str) -> Option<usize> {
		self.order.iter().position(|s| s == name)
	}

	pub fn len(&self) -> usize {
		self.order.len()
	}

	pub fn is_empty(&self) -> bool {
		self.order.is_empty()
	}
}
