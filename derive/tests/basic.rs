use avro_registry_codec::schema::{
	build_schema, EnumBehavior, NullableReferenceTypeBehavior, RegularType, SchemaBuilderConfig,
};
use avro_registry_codec_derive::{AvroValue, ReflectType};

#[derive(ReflectType, AvroValue, Debug, PartialEq)]
struct Point {
	pub x: i32,
	pub y: i32,
}

#[derive(ReflectType, AvroValue, Debug, PartialEq)]
struct WithOptionalField {
	pub id: i32,
	pub nickname: Option<String>,
}

#[derive(ReflectType, AvroValue, Debug, PartialEq)]
struct WithSkippedField {
	pub id: i32,
	#[avro(skip)]
	pub cached_display: String,
}

#[derive(ReflectType, AvroValue, Debug, PartialEq)]
struct RenamedField {
	#[avro(rename = "type")]
	pub kind: String,
}

#[derive(ReflectType, AvroValue, Debug, PartialEq)]
#[avro(all_fields)]
struct PrivateFieldsIncludedViaAllFields {
	id: i32,
	note: String,
}

#[derive(ReflectType, AvroValue, Debug, PartialEq)]
struct WithPrivateField {
	pub id: i32,
	secret: String,
}

#[derive(ReflectType, AvroValue, Debug, PartialEq)]
enum Color {
	Red,
	Green,
	Blue,
}

#[derive(ReflectType, AvroValue, Debug, PartialEq)]
enum Shape {
	Circle(f64),
	Square(i32),
	Point,
}

#[test]
fn struct_builds_a_record_schema() {
	let schema = build_schema::<Point>(Default::default());
	let RegularType::Record(record) = &schema.root().type_ else {
		panic!("expected record")
	};
	assert_eq!(record.fields.len(), 2);
	assert_eq!(record.fields[0].name, "x");
	assert_eq!(record.fields[1].name, "y");
}

#[test]
fn struct_roundtrips_through_the_binary_codec() {
	use avro_registry_codec::codec::Codec;
	use std::sync::Arc;

	let schema = Arc::new(build_schema::<Point>(Default::default()));
	let codec = Codec::<Point>::new(schema);
	let point = Point { x: 3, y: -7 };
	let bytes = codec.encode(&point).unwrap();
	let decoded = codec.decode(&bytes).unwrap();
	assert_eq!(point, decoded);
}

#[test]
fn unit_enum_builds_an_enum_schema() {
	let schema = build_schema::<Color>(Default::default());
	let RegularType::Enum(e) = &schema.root().type_ else {
		panic!("expected enum")
	};
	assert_eq!(e.symbols.iter().collect::<Vec<_>>(), ["Red", "Green", "Blue"]);
}

#[test]
fn unit_enum_roundtrips() {
	use avro_registry_codec::codec::Codec;
	use std::sync::Arc;

	let schema = Arc::new(build_schema::<Color>(Default::default()));
	let codec = Codec::<Color>::new(schema);
	for color in [Color::Red, Color::Green, Color::Blue] {
		let bytes = codec.encode(&color).unwrap();
		assert_eq!(codec.decode(&bytes).unwrap(), color);
	}
}

#[test]
fn mixed_enum_builds_a_union_schema() {
	let schema = build_schema::<Shape>(Default::default());
	assert!(matches!(schema.root().type_, RegularType::Union(_)));
}

#[test]
fn mixed_enum_roundtrips() {
	use avro_registry_codec::codec::Codec;
	use std::sync::Arc;

	let schema = Arc::new(build_schema::<Shape>(Default::default()));
	let codec = Codec::<Shape>::new(schema);
	for shape in [Shape::Circle(2.0), Shape::Square(3), Shape::Point] {
		let bytes = codec.encode(&shape).unwrap();
		assert_eq!(codec.decode(&bytes).unwrap(), shape);
	}
}

#[test]
fn skipped_field_is_absent_from_the_schema() {
	let schema = build_schema::<WithSkippedField>(Default::default());
	let RegularType::Record(record) = &schema.root().type_ else {
		panic!("expected record")
	};
	assert_eq!(record.fields.len(), 1);
	assert_eq!(record.fields[0].name, "id");
}

#[test]
fn skipped_field_round_trips_as_its_default() {
	use avro_registry_codec::codec::Codec;
	use std::sync::Arc;

	let schema = Arc::new(build_schema::<WithSkippedField>(Default::default()));
	let codec = Codec::<WithSkippedField>::new(schema);
	let original = WithSkippedField { id: 11, cached_display: "eleven".to_owned() };
	let bytes = codec.encode(&original).unwrap();
	let decoded = codec.decode(&bytes).unwrap();
	assert_eq!(decoded, WithSkippedField { id: 11, cached_display: String::new() });
}

#[test]
fn renamed_field_uses_the_rename_as_its_schema_and_wire_name() {
	let schema = build_schema::<RenamedField>(Default::default());
	let RegularType::Record(record) = &schema.root().type_ else {
		panic!("expected record")
	};
	assert_eq!(record.fields[0].name, "type");

	use avro_registry_codec::codec::Codec;
	use std::sync::Arc;

	let codec = Codec::<RenamedField>::new(Arc::new(schema));
	let original = RenamedField { kind: "widget".to_owned() };
	let bytes = codec.encode(&original).unwrap();
	assert_eq!(codec.decode(&bytes).unwrap(), original);
}

#[test]
fn only_pub_fields_are_exposed_by_default() {
	let schema = build_schema::<WithPrivateField>(Default::default());
	let RegularType::Record(record) = &schema.root().type_ else {
		panic!("expected record")
	};
	assert_eq!(record.fields.len(), 1);
	assert_eq!(record.fields[0].name, "id");

	use avro_registry_codec::codec::Codec;
	use std::sync::Arc;

	let codec = Codec::<WithPrivateField>::new(Arc::new(schema));
	let original = WithPrivateField { id: 4, secret: "hidden".to_owned() };
	let bytes = codec.encode(&original).unwrap();
	let decoded = codec.decode(&bytes).unwrap();
	assert_eq!(decoded, WithPrivateField { id: 4, secret: String::new() });
}

#[test]
fn optional_field_builds_a_nullable_union_by_default() {
	let schema = build_schema::<WithOptionalField>(Default::default());
	let RegularType::Record(record) = &schema.root().type_ else {
		panic!("expected record")
	};
	let RegularType::Union(u) = &schema.node(record.fields[1].type_).type_ else {
		panic!("expected nickname to be a union")
	};
	assert!(matches!(schema.node(u.variants()[0]).type_, RegularType::Null));
}

#[test]
fn optional_field_roundtrips_some_and_none() {
	use avro_registry_codec::codec::Codec;
	use std::sync::Arc;

	let schema = Arc::new(build_schema::<WithOptionalField>(Default::default()));
	let codec = Codec::<WithOptionalField>::new(schema);
	for nickname in [Some("kit".to_owned()), None] {
		let original = WithOptionalField { id: 1, nickname };
		let bytes = codec.encode(&original).unwrap();
		assert_eq!(codec.decode(&bytes).unwrap(), original);
	}
}

#[test]
fn nullable_none_strips_the_option_from_the_schema() {
	let config = SchemaBuilderConfig { nullable_behavior: NullableReferenceTypeBehavior::None, ..Default::default() };
	let schema = build_schema::<WithOptionalField>(config);
	let RegularType::Record(record) = &schema.root().type_ else {
		panic!("expected record")
	};
	assert!(matches!(schema.node(record.fields[1].type_).type_, RegularType::String));
}

#[test]
fn nullable_all_wraps_every_field_including_non_option_ones() {
	let config = SchemaBuilderConfig { nullable_behavior: NullableReferenceTypeBehavior::All, ..Default::default() };
	let schema = build_schema::<Point>(config);
	let RegularType::Record(record) = &schema.root().type_ else {
		panic!("expected record")
	};
	assert!(record.fields.iter().all(|f| matches!(schema.node(f.type_).type_, RegularType::Union(_))));
}

#[test]
fn enum_behavior_integral_builds_an_int_schema() {
	let config = SchemaBuilderConfig { enum_behavior: EnumBehavior::Integral, ..Default::default() };
	let schema = build_schema::<Color>(config);
	assert!(matches!(schema.root().type_, RegularType::Int));
}

#[test]
fn enum_behavior_integral_roundtrips() {
	use avro_registry_codec::codec::Codec;
	use std::sync::Arc;

	let config = SchemaBuilderConfig { enum_behavior: EnumBehavior::Integral, ..Default::default() };
	let schema = Arc::new(build_schema::<Color>(config));
	let codec = Codec::<Color>::new(schema);
	for color in [Color::Red, Color::Green, Color::Blue] {
		let bytes = codec.encode(&color).unwrap();
		assert_eq!(codec.decode(&bytes).unwrap(), color);
	}
}

#[test]
fn enum_behavior_nominal_builds_a_string_schema() {
	let config = SchemaBuilderConfig { enum_behavior: EnumBehavior::Nominal, ..Default::default() };
	let schema = build_schema::<Color>(config);
	assert!(matches!(schema.root().type_, RegularType::String));
}

#[test]
fn enum_behavior_nominal_roundtrips() {
	use avro_registry_codec::codec::Codec;
	use std::sync::Arc;

	let config = SchemaBuilderConfig { enum_behavior: EnumBehavior::Nominal, ..Default::default() };
	let schema = Arc::new(build_schema::<Color>(config));
	let codec = Codec::<Color>::new(schema);
	for color in [Color::Red, Color::Green, Color::Blue] {
		let bytes = codec.encode(&color).unwrap();
		assert_eq!(codec.decode(&bytes).unwrap(), color);
	}
}

#[test]
fn avro_all_fields_exposes_private_fields_too() {
	let schema = build_schema::<PrivateFieldsIncludedViaAllFields>(Default::default());
	let RegularType::Record(record) = &schema.root().type_ else {
		panic!("expected record")
	};
	assert_eq!(record.fields.len(), 2);

	use avro_registry_codec::codec::Codec;
	use std::sync::Arc;

	let codec = Codec::<PrivateFieldsIncludedViaAllFields>::new(Arc::new(schema));
	let original = PrivateFieldsIncludedViaAllFields { id: 1, note: "hi".to_owned() };
	let bytes = codec.encode(&original).unwrap();
	assert_eq!(codec.decode(&bytes).unwrap(), original);
}
