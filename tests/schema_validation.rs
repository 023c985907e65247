use avro_registry_codec::schema::RegularType;
use avro_registry_codec::Schema;

#[test]
fn forbids_unconditional_record_cycles() {
	let schema = r#"
	{
		"type": "record",
		"name": "A",
		"fields": [
			{
				"name": "a",
				"type": {
					"type": "record",
					"name": "B",
					"fields": [
						{ "name": "b", "type": "A" }
					]
				}
			}
		]
	}"#;
	let err = schema.parse::<Schema>().unwrap_err();
	assert_eq!(
		err.to_string(),
		"the schema contains a record that ends up always containing itself"
	);
}

#[test]
fn allows_conditional_record_cycles_through_a_union() {
	let schema = r#"
	{
		"type": "record",
		"name": "LinkedList",
		"fields": [
			{ "name": "value", "type": "int" },
			{ "name": "next", "type": ["null", "LinkedList"] }
		]
	}"#
	.parse::<Schema>()
	.unwrap();
	assert!(matches!(schema.root().type_, RegularType::Record(_)));
}

#[test]
fn rejects_forward_references() {
	let schema = r#"
	{
		"type": "record",
		"name": "A",
		"fields": [
			{ "name": "a", "type": "B" }
		]
	}"#;
	assert!(schema.parse::<Schema>().is_err());
}

#[test]
fn rejects_duplicate_union_branches_of_the_same_primitive_type() {
	let schema = r#"["int", "int"]"#;
	assert!(schema.parse::<Schema>().is_err());
}

#[test]
fn rejects_invalid_enum_symbols() {
	let schema = r#"
	{
		"type": "enum",
		"name": "Suit",
		"symbols": ["Spades", "not a valid symbol"]
	}"#;
	assert!(schema.parse::<Schema>().is_err());
}

#[test]
fn rejects_decimal_scale_exceeding_precision() {
	let schema = r#"
	{
		"type": "bytes",
		"logicalType": "decimal",
		"precision": 4,
		"scale": 10
	}"#
	.parse::<Schema>()
	.unwrap();
	// reader resilience: an out-of-range scale/precision pair doesn't
	// invalidate the underlying schema, it just drops the decorator.
	assert!(schema.root().logical_type.is_none());
	assert!(matches!(schema.root().type_, RegularType::Bytes));
}

#[test]
fn json_round_trips_through_parsing_canonical_form() {
	let schema: Schema = r#"
	{
		"type": "record",
		"name": "test.Rec",
		"fields": [
			{ "name": "a", "type": "long" },
			{ "name": "b", "type": "string" }
		]
	}"#
	.parse()
	.unwrap();
	assert_eq!(
		schema.parsing_canonical_form(),
		r#"{"name":"test.Rec","type":"record","fields":[{"name":"a","type":"long"},{"name":"b","type":"string"}]}"#
	);
	// fingerprint is a pure function of parsing canonical form
	let reparsed: Schema = schema.json().parse().unwrap();
	assert_eq!(schema.fingerprint(), reparsed.fingerprint());
}
