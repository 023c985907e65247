//! The schema-driven binary Avro codec (C5).
//!
//! `encode`/`decode` are a recursive function matching exhaustively over the
//! closed [`SchemaNode`] enum: the fixed, finite set of schema node kinds
//! makes an exhaustive `match` the zero-cost equivalent of the case-pipeline
//! dispatch used for the open-ended host-type space in
//! [`crate::schema::builder`].

mod error;

pub use error::{CodecError, DecodeError, EncodeError};

use std::io::Read;
use std::marker::PhantomData;
use std::sync::Arc;

use integer_encoding::{VarIntReader, VarIntWriter};

use crate::schema::{LogicalType, RegularType, Schema, SchemaKey, Union};
use crate::value::{FromAvroValue, ToAvroValue, Value};

pub fn encode(value: &Value, key: SchemaKey, schema: &Schema, out: &mut Vec<u8>) -> Result<(), EncodeError> {
	let node = schema.node(key);
	if let Some(logical) = &node.logical_type {
		if encode_logical(value, logical, out)? {
			return Ok(());
		}
	}
	match (&node.type_, value) {
		(RegularType::Null, Value::Null) => Ok(()),
		(RegularType::Boolean, Value::Boolean(b)) => {
			out.push(if *b { 1 } else { 0 });
			Ok(())
		}
		(RegularType::Int, Value::Int(n)) => {
			out.write_varint(*n)?;
			Ok(())
		}
		(RegularType::Long, Value::Long(n)) => {
			out.write_varint(*n)?;
			Ok(())
		}
		(RegularType::Float, Value::Float(f)) => {
			out.extend_from_slice(&f.to_le_bytes());
			Ok(())
		}
		(RegularType::Double, Value::Double(f)) => {
			out.extend_from_slice(&f.to_le_bytes());
			Ok(())
		}
		(RegularType::Bytes, Value::Bytes(b)) => {
			out.write_varint(b.len() as i64)?;
			out.extend_from_slice(b);
			Ok(())
		}
		(RegularType::String, Value::String(s)) => {
			out.write_varint(s.len() as i64)?;
			out.extend_from_slice(s.as_bytes());
			Ok(())
		}
		// A bare (non-logical) `string` schema node paired with a temporal
		// `Value`: the field was built under `TemporalBehavior::Iso8601`, so
		// the host type's native epoch-based `Value` still needs rendering
		// as ISO-8601 text rather than being rejected as a shape mismatch.
		(RegularType::String, temporal @ (Value::Date(_) | Value::TimeMillis(_) | Value::TimeMicros(_) | Value::TimestampMillis(_) | Value::TimestampMicros(_))) => {
			let s = temporal_to_iso8601(temporal)?;
			out.write_varint(s.len() as i64)?;
			out.extend_from_slice(s.as_bytes());
			Ok(())
		}
		(RegularType::Fixed(f), Value::Fixed(b)) => {
			if b.len() != f.size {
				return Err(EncodeError::TypeMismatch(format!(
					"fixed size mismatch: schema wants {}, value has {}",
					f.size,
					b.len()
				)));
			}
			out.extend_from_slice(b);
			Ok(())
		}
		(RegularType::Array(a), Value::Array(items)) => {
			if !items.is_empty() {
				out.write_varint(items.len() as i64)?;
				for item in items {
					encode(item, a.items, schema, out)?;
				}
			}
			out.write_varint(0i64)?;
			Ok(())
		}
		(RegularType::Map(m), Value::Map(entries)) => {
			if !entries.is_empty() {
				out.write_varint(entries.len() as i64)?;
				for (k, v) in entries {
					out.write_varint(k.len() as i64)?;
					out.extend_from_slice(k.as_bytes());
					encode(v, m.values, schema, out)?;
				}
			}
			out.write_varint(0i64)?;
			Ok(())
		}
		(RegularType::Union(u), value) => {
			let idx = resolve_union_member(value, u, schema)?;
			out.write_varint(idx as i64)?;
			let inner = match value {
				Value::Union(_, inner) => inner,
				other => other,
			};
			encode(inner, u.variants()[idx], schema, out)
		}
		(RegularType::Enum(e), Value::Enum(idx, _)) => {
			if *idx >= e.symbols.len() {
				return Err(EncodeError::TypeMismatch("enum index out of range".into()));
			}
			out.write_varint(*idx as i64)?;
			Ok(())
		}
		// `EnumBehavior::Integral`/`::Nominal` built the field's schema node
		// as a bare `int`/`string` rather than an Avro `enum`, but the derived
		// `ToAvroValue` impl for a unit enum always produces `Value::Enum`
		// regardless of how the schema was built - render the discriminant or
		// the symbol name to match the chosen schema shape.
		(RegularType::Int, Value::Enum(idx, _)) => {
			out.write_varint(*idx as i64)?;
			Ok(())
		}
		(RegularType::String, Value::Enum(_, name)) => {
			out.write_varint(name.len() as i64)?;
			out.extend_from_slice(name.as_bytes());
			Ok(())
		}
		(RegularType::Record(r), Value::Record(fields)) => {
			for field in &r.fields {
				let (_, value) = fields
					.iter()
					.find(|(name, _)| name == &field.name)
					.ok_or_else(|| EncodeError::TypeMismatch(format!("missing field `{}`", field.name)))?;
				encode(value, field.type_, schema, out)?;
			}
			Ok(())
		}
		// A host `Option<T>` field built under `NullableReferenceTypeBehavior::None`
		// discards nullability at the schema level, so the field's schema node
		// is plain `T`, not a union - but `Option<T>`'s own `ToAvroValue` impl
		// still produces a `Value::Union` regardless of how the schema was
		// built. Unwrap it rather than rejecting the shape.
		(schema_type, Value::Union(_, inner)) => match &**inner {
			Value::Null => Err(EncodeError::TypeMismatch(format!(
				"null has no encoding for non-nullable schema node {schema_type:?}"
			))),
			_ => encode(inner, key, schema, out),
		},
		(schema_type, value) => Err(EncodeError::TypeMismatch(format!(
			"{value:?} does not fit schema node {schema_type:?}"
		))),
	}
}

/// Returns `Ok(true)` if a logical-type-specific encoding was emitted (so
/// the caller should skip the physical-type match entirely), `Ok(false)` if
/// the value isn't shaped for this logical type and physical encoding should
/// proceed as usual.
fn encode_logical(value: &Value, logical: &LogicalType, out: &mut Vec<u8>) -> Result<bool, EncodeError> {
	match (logical, value) {
		(LogicalType::Decimal(d), Value::Decimal(dec)) => {
			let unscaled = decimal_to_unscaled(dec, d.scale)?;
			let bytes = two_complement_be(unscaled);
			out.write_varint(bytes.len() as i64)?;
			out.extend_from_slice(&bytes);
			Ok(true)
		}
		(LogicalType::Uuid, Value::Uuid(u)) => {
			let s = u.hyphenated().to_string();
			out.write_varint(s.len() as i64)?;
			out.extend_from_slice(s.as_bytes());
			Ok(true)
		}
		(LogicalType::Date, Value::Date(d)) => {
			out.write_varint(*d)?;
			Ok(true)
		}
		(LogicalType::TimeMillis, Value::TimeMillis(t)) => {
			out.write_varint(*t)?;
			Ok(true)
		}
		(LogicalType::TimeMicros, Value::TimeMicros(t)) => {
			out.write_varint(*t)?;
			Ok(true)
		}
		(LogicalType::TimestampMillis, Value::TimestampMillis(t)) => {
			out.write_varint(*t)?;
			Ok(true)
		}
		(LogicalType::TimestampMicros, Value::TimestampMicros(t)) => {
			out.write_varint(*t)?;
			Ok(true)
		}
		(LogicalType::Duration, Value::Duration { months, days, millis }) => {
			out.extend_from_slice(&months.to_le_bytes());
			out.extend_from_slice(&days.to_le_bytes());
			out.extend_from_slice(&millis.to_le_bytes());
			Ok(true)
		}
		_ => Ok(false),
	}
}

fn decimal_to_unscaled(dec: &rust_decimal::Decimal, scale: usize) -> Result<i128, EncodeError> {
	let mut dec = *dec;
	dec.rescale(scale as u32);
	if dec.scale() != scale as u32 {
		return Err(EncodeError::DecimalOutOfRange);
	}
	Ok(dec.mantissa())
}

fn two_complement_be(n: i128) -> Vec<u8> {
	let full = n.to_be_bytes();
	let mut start = 0;
	while start < full.len() - 1 {
		let byte = full[start];
		let next_byte = full[start + 1];
		let sign_extends = (byte == 0x00 && next_byte & 0x80 == 0) || (byte == 0xff && next_byte & 0x80 != 0);
		if !sign_extends {
			break;
		}
		start += 1;
	}
	full[start..].to_vec()
}

fn temporal_to_iso8601(value: &Value) -> Result<String, EncodeError> {
	use chrono::TimeZone;
	let err = || EncodeError::TypeMismatch(format!("{value:?} is out of range for its logical type"));
	Ok(match *value {
		Value::Date(days) => (chrono::NaiveDate::from_ymd_opt(1970, 1, 1).unwrap() + chrono::Duration::days(days as i64))
			.to_string(),
		Value::TimeMillis(millis) => chrono::NaiveTime::from_num_seconds_from_midnight_opt(
			(millis / 1000) as u32,
			(millis % 1000) as u32 * 1_000_000,
		)
		.ok_or_else(err)?
		.to_string(),
		Value::TimeMicros(micros) => chrono::NaiveTime::from_num_seconds_from_midnight_opt(
			(micros / 1_000_000) as u32,
			(micros % 1_000_000) as u32 * 1_000,
		)
		.ok_or_else(err)?
		.to_string(),
		Value::TimestampMillis(millis) => chrono::Utc
			.timestamp_millis_opt(millis)
			.single()
			.ok_or_else(err)?
			.to_rfc3339(),
		Value::TimestampMicros(micros) => chrono::Utc
			.timestamp_opt(micros.div_euclid(1_000_000), (micros.rem_euclid(1_000_000) * 1000) as u32)
			.single()
			.ok_or_else(err)?
			.to_rfc3339(),
		_ => unreachable!("only called with a temporal Value"),
	})
}

fn resolve_union_member(value: &Value, union: &Union, schema: &Schema) -> Result<usize, EncodeError> {
	let target = match value {
		Value::Union(idx, _) if *idx < union.variants().len() => return Ok(*idx),
		other => other,
	};
	if target.is_null() {
		if let Some(idx) = union.null_variant_idx(schema.nodes()) {
			return Ok(idx);
		}
	}
	for (idx, &key) in union.variants().iter().enumerate() {
		if value_shape_matches(target, &schema.node(key).type_) {
			return Ok(idx);
		}
	}
	Err(EncodeError::NoMatchingUnionMember)
}

fn value_shape_matches(value: &Value, ty: &RegularType) -> bool {
	matches!(
		(value, ty),
		(Value::Null, RegularType::Null)
			| (Value::Boolean(_), RegularType::Boolean)
			| (Value::Int(_), RegularType::Int)
			| (Value::Long(_), RegularType::Long | RegularType::Int)
			| (Value::Float(_), RegularType::Float)
			| (Value::Double(_), RegularType::Double | RegularType::Float)
			| (Value::Bytes(_), RegularType::Bytes | RegularType::String)
			| (Value::String(_), RegularType::String | RegularType::Bytes)
			| (Value::Array(_), RegularType::Array(_))
			| (Value::Map(_), RegularType::Map(_))
			| (Value::Fixed(_), RegularType::Fixed(_))
			| (Value::Enum(_, _), RegularType::Enum(_) | RegularType::Int | RegularType::String)
			| (Value::Record(_), RegularType::Record(_))
			| (Value::Decimal(_), RegularType::Bytes | RegularType::Fixed(_))
			| (Value::Uuid(_), RegularType::String)
			| (Value::Date(_), RegularType::Int)
			| (Value::TimeMillis(_), RegularType::Int)
			| (Value::TimeMicros(_), RegularType::Long)
			| (Value::TimestampMillis(_), RegularType::Long)
			| (Value::TimestampMicros(_), RegularType::Long)
			| (Value::Duration { .. }, RegularType::Fixed(_))
	)
}

pub fn decode(key: SchemaKey, schema: &Schema, reader: &mut impl Read) -> Result<Value, DecodeError> {
	let node = schema.node(key);
	if let Some(logical) = &node.logical_type {
		if let Some(value) = decode_logical(logical, reader)? {
			return Ok(value);
		}
	}
	match &node.type_ {
		RegularType::Null => Ok(Value::Null),
		RegularType::Boolean => {
			let mut b = [0u8; 1];
			reader.read_exact(&mut b).map_err(eof)?;
			match b[0] {
				0 => Ok(Value::Boolean(false)),
				1 => Ok(Value::Boolean(true)),
				other => Err(DecodeError::InvalidBoolean(other)),
			}
		}
		RegularType::Int => Ok(Value::Int(reader.read_varint()?)),
		RegularType::Long => Ok(Value::Long(reader.read_varint()?)),
		RegularType::Float => {
			let mut b = [0u8; 4];
			reader.read_exact(&mut b).map_err(eof)?;
			Ok(Value::Float(f32::from_le_bytes(b)))
		}
		RegularType::Double => {
			let mut b = [0u8; 8];
			reader.read_exact(&mut b).map_err(eof)?;
			Ok(Value::Double(f64::from_le_bytes(b)))
		}
		RegularType::Bytes => Ok(Value::Bytes(read_length_prefixed(reader)?)),
		RegularType::String => {
			let bytes = read_length_prefixed(reader)?;
			Ok(Value::String(String::from_utf8(bytes)?))
		}
		RegularType::Fixed(f) => {
			let mut buf = vec![0u8; f.size];
			reader.read_exact(&mut buf).map_err(eof)?;
			Ok(Value::Fixed(buf))
		}
		RegularType::Array(a) => {
			let mut items = Vec::new();
			loop {
				let count: i64 = reader.read_varint()?;
				if count == 0 {
					break;
				}
				let count = if count < 0 {
					let _byte_size: i64 = reader.read_varint()?;
					-count
				} else {
					count
				};
				for _ in 0..count {
					items.push(decode(a.items, schema, reader)?);
				}
			}
			Ok(Value::Array(items))
		}
		RegularType::Map(m) => {
			let mut entries = indexmap::IndexMap::new();
			loop {
				let count: i64 = reader.read_varint()?;
				if count == 0 {
					break;
				}
				let count = if count < 0 {
					let _byte_size: i64 = reader.read_varint()?;
					-count
				} else {
					count
				};
				for _ in 0..count {
					let key_bytes = read_length_prefixed(reader)?;
					let key = String::from_utf8(key_bytes)?;
					let value = decode(m.values, schema, reader)?;
					entries.insert(key, value);
				}
			}
			Ok(Value::Map(entries))
		}
		RegularType::Union(u) => {
			let idx: i64 = reader.read_varint()?;
			let variants = u.variants();
			if idx < 0 || idx as usize >= variants.len() {
				return Err(DecodeError::InvalidUnionDiscriminant(idx));
			}
			let inner = decode(variants[idx as usize], schema, reader)?;
			Ok(Value::Union(idx as usize, Box::new(inner)))
		}
		RegularType::Enum(e) => {
			let idx: i64 = reader.read_varint()?;
			if idx < 0 || idx as usize >= e.symbols.len() {
				return Err(DecodeError::InvalidEnumDiscriminant(idx));
			}
			let name = e.symbols.iter().nth(idx as usize).expect("checked above").to_owned();
			Ok(Value::Enum(idx as usize, name))
		}
		RegularType::Record(r) => {
			let mut fields = Vec::with_capacity(r.fields.len());
			for field in &r.fields {
				let value = decode(field.type_, schema, reader)?;
				fields.push((field.name.clone(), value));
			}
			Ok(Value::Record(fields))
		}
	}
}

fn decode_logical(logical: &LogicalType, reader: &mut impl Read) -> Result<Option<Value>, DecodeError> {
	Ok(Some(match logical {
		LogicalType::Decimal(d) => {
			let bytes = read_length_prefixed(reader)?;
			let unscaled = unscaled_from_be_bytes(&bytes);
			Value::Decimal(rust_decimal::Decimal::from_i128_with_scale(unscaled, d.scale as u32))
		}
		LogicalType::Uuid => {
			let bytes = read_length_prefixed(reader)?;
			let s = String::from_utf8(bytes)?;
			let uuid = s.parse().map_err(|_| DecodeError::InvalidLength(s.len() as i64))?;
			Value::Uuid(uuid)
		}
		LogicalType::Date => Value::Date(reader.read_varint()?),
		LogicalType::TimeMillis => Value::TimeMillis(reader.read_varint()?),
		LogicalType::TimeMicros => Value::TimeMicros(reader.read_varint()?),
		LogicalType::TimestampMillis => Value::TimestampMillis(reader.read_varint()?),
		LogicalType::TimestampMicros => Value::TimestampMicros(reader.read_varint()?),
		LogicalType::Duration => {
			let mut months = [0u8; 4];
			let mut days = [0u8; 4];
			let mut millis = [0u8; 4];
			reader.read_exact(&mut months).map_err(eof)?;
			reader.read_exact(&mut days).map_err(eof)?;
			reader.read_exact(&mut millis).map_err(eof)?;
			Value::Duration {
				months: u32::from_le_bytes(months),
				days: u32::from_le_bytes(days),
				millis: u32::from_le_bytes(millis),
			}
		}
		LogicalType::Unknown(_) => return Ok(None),
	}))
}

fn unscaled_from_be_bytes(bytes: &[u8]) -> i128 {
	let negative = bytes.first().is_some_and(|b| b & 0x80 != 0);
	let mut buf = [if negative { 0xff } else { 0x00 }; 16];
	let start = 16 - bytes.len();
	buf[start..].copy_from_slice(bytes);
	i128::from_be_bytes(buf)
}

fn read_length_prefixed(reader: &mut impl Read) -> Result<Vec<u8>, DecodeError> {
	let len: i64 = reader.read_varint()?;
	if len < 0 {
		return Err(DecodeError::InvalidLength(len));
	}
	let mut buf = vec![0u8; len as usize];
	reader.read_exact(&mut buf).map_err(eof)?;
	Ok(buf)
}

fn eof(e: std::io::Error) -> DecodeError {
	if e.kind() == std::io::ErrorKind::UnexpectedEof {
		DecodeError::UnexpectedEof
	} else {
		DecodeError::Io(e)
	}
}

/// A compiled, immutable, freely shareable (de)serializer for `(T, Schema)`.
///
/// `Codec<T>` is `Send + Sync`: building is synchronous, and built codecs may
/// be invoked concurrently from any number of threads.
pub struct Codec<T> {
	schema: Arc<Schema>,
	_marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Codec<T> {
	fn clone(&self) -> Self {
		Self {
			schema: Arc::clone(&self.schema),
			_marker: PhantomData,
		}
	}
}

impl<T> Codec<T> {
	pub fn new(schema: Arc<Schema>) -> Self {
		Self {
			schema,
			_marker: PhantomData,
		}
	}

	pub fn schema(&self) -> &Arc<Schema> {
		&self.schema
	}
}

impl<T: ToAvroValue> Codec<T> {
	pub fn encode(&self, value: &T) -> Result<Vec<u8>, EncodeError> {
		let mut out = Vec::new();
		encode(&value.to_avro_value(), SchemaKey::root(), &self.schema, &mut out)?;
		Ok(out)
	}
}

impl<T: FromAvroValue> Codec<T> {
	pub fn decode(&self, bytes: &[u8]) -> Result<T, CodecError> {
		let mut reader = bytes;
		let value = decode(SchemaKey::root(), &self.schema, &mut reader)?;
		T::from_avro_value(value).map_err(Into::into)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::build_schema;

	fn roundtrip<T: ToAvroValue + FromAvroValue + PartialEq + std::fmt::Debug>(value: T)
	where
		T: crate::schema::ReflectType,
	{
		let schema = Arc::new(build_schema::<T>(Default::default()));
		let codec = Codec::<T>::new(schema);
		let bytes = codec.encode(&value).unwrap();
		let decoded = codec.decode(&bytes).unwrap();
		assert_eq!(value, decoded);
	}

	#[test]
	fn roundtrips_primitives() {
		roundtrip(42i32);
		roundtrip(42i64);
		roundtrip(true);
		roundtrip("hello".to_string());
	}

	#[test]
	fn roundtrips_option() {
		roundtrip::<Option<i32>>(None);
		roundtrip::<Option<i32>>(Some(7));
	}

	#[test]
	fn roundtrips_vec() {
		roundtrip(vec![1i32, 2, 3]);
		roundtrip(Vec::<i32>::new());
	}

	#[test]
	fn zigzag_varint_boundaries() {
		for n in [0i64, -1, 1, i64::MIN, i64::MAX] {
			let mut out = Vec::new();
			out.write_varint(n).unwrap();
			let mut reader = &out[..];
			let back: i64 = reader.read_varint().unwrap();
			assert_eq!(n, back);
		}
	}
}
