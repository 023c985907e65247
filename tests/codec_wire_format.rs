use avro_registry_codec::codec::{decode, encode};
use avro_registry_codec::schema::RegularType;
use avro_registry_codec::value::Value;
use avro_registry_codec::Schema;

#[test]
fn array_negative_block_count_is_read_as_a_byte_sized_block() {
	let schema: Schema = r#"{"type":"array","items":"int"}"#.parse().unwrap();
	let items_key = match &schema.root().type_ {
		RegularType::Array(a) => a.items,
		_ => panic!("expected array"),
	};
	// Hand-roll a negative-count block: -2 items, followed by the
	// byte-size of the block, then the two items, then the terminator.
	let mut body = Vec::new();
	encode(&Value::Int(1), items_key, &schema, &mut body).unwrap();
	encode(&Value::Int(2), items_key, &schema, &mut body).unwrap();
	let mut out = Vec::new();
	out.extend(zigzag(-2));
	out.extend(zigzag(body.len() as i64));
	out.extend(body);
	out.extend(zigzag(0));

	let decoded = decode(avro_registry_codec::SchemaKey::root(), &schema, &mut &out[..]).unwrap();
	assert_eq!(decoded, Value::Array(vec![Value::Int(1), Value::Int(2)]));
}

fn zigzag(n: i64) -> Vec<u8> {
	use integer_encoding::VarIntWriter;
	let mut buf = Vec::new();
	buf.write_varint(n).unwrap();
	buf
}

#[test]
fn union_prefers_the_null_branch_when_resolving_a_bare_null_value() {
	let schema: Schema = r#"["string", "null"]"#.parse().unwrap();
	let mut out = Vec::new();
	encode(&Value::Null, avro_registry_codec::SchemaKey::root(), &schema, &mut out).unwrap();
	// null is declared second; resolution must still find it rather than
	// failing to shape-match against the first ("string") branch.
	let decoded = decode(avro_registry_codec::SchemaKey::root(), &schema, &mut &out[..]).unwrap();
	assert_eq!(decoded, Value::Null);
}

#[test]
fn union_promotes_a_bare_value_into_the_matching_branch() {
	let schema: Schema = r#"["null", "long"]"#.parse().unwrap();
	let mut out = Vec::new();
	// Value::Int, not Value::Long: encode() must promote it into the "long"
	// branch via value_shape_matches rather than requiring an exact type.
	encode(&Value::Int(7), avro_registry_codec::SchemaKey::root(), &schema, &mut out).unwrap();
	let decoded = decode(avro_registry_codec::SchemaKey::root(), &schema, &mut &out[..]).unwrap();
	assert_eq!(decoded, Value::Long(7));
}

#[test]
fn decimal_encodes_as_minimal_two_complement_bytes() {
	let schema: Schema = r#"{"type":"bytes","logicalType":"decimal","precision":6,"scale":2}"#
		.parse()
		.unwrap();
	let value = Value::Decimal("12.34".parse().unwrap());
	let mut out = Vec::new();
	encode(&value, avro_registry_codec::SchemaKey::root(), &schema, &mut out).unwrap();
	let decoded = decode(avro_registry_codec::SchemaKey::root(), &schema, &mut &out[..]).unwrap();
	assert_eq!(decoded, value);
}

#[test]
fn bare_string_schema_under_iso8601_temporal_behavior_accepts_a_date_value() {
	// A schema with no logical type at all (as built under
	// `TemporalBehavior::Iso8601`) must still accept a `Value::Date`,
	// rendering it as ISO-8601 text instead of rejecting the shape.
	let schema: Schema = r#""string""#.parse().unwrap();
	let mut out = Vec::new();
	encode(&Value::Date(0), avro_registry_codec::SchemaKey::root(), &schema, &mut out).unwrap();
	let decoded = decode(avro_registry_codec::SchemaKey::root(), &schema, &mut &out[..]).unwrap();
	assert_eq!(decoded, Value::String("1970-01-01".to_owned()));
}

#[test]
fn record_fields_are_encoded_in_declared_order_regardless_of_value_order() {
	let schema: Schema = r#"
	{
		"type": "record",
		"name": "Pair",
		"fields": [
			{ "name": "a", "type": "int" },
			{ "name": "b", "type": "int" }
		]
	}"#
	.parse()
	.unwrap();
	let value = Value::Record(vec![("b".to_owned(), Value::Int(2)), ("a".to_owned(), Value::Int(1))]);
	let mut out = Vec::new();
	encode(&value, avro_registry_codec::SchemaKey::root(), &schema, &mut out).unwrap();
	// "a" (1) is declared first, so its varint-encoded zigzag byte (2) comes
	// before "b" (2)'s zigzag byte (4).
	assert_eq!(out, vec![2, 4]);
	let decoded = decode(avro_registry_codec::SchemaKey::root(), &schema, &mut &out[..]).unwrap();
	assert_eq!(
		decoded,
		Value::Record(vec![("a".to_owned(), Value::Int(1)), ("b".to_owned(), Value::Int(2))])
	);
}
