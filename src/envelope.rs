//! The Confluent Schema Registry wire format (C6): a 5-byte header (magic
//! byte + big-endian schema id) in front of an Avro-encoded body.

use std::sync::Arc;

use crate::codec::{self, DecodeError, EncodeError};
use crate::schema::{RegularType, Schema, SchemaKey};
use crate::value::{FromAvroValue, ToAvroValue, Value};

const MAGIC_BYTE: u8 = 0x00;
const HEADER_LEN: usize = 5;

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeEncodeError {
	#[error(transparent)]
	Encode(#[from] EncodeError),
}

#[derive(Debug, thiserror::Error)]
pub enum EnvelopeDecodeError {
	#[error("message is shorter than the 5-byte wire header")]
	Truncated,
	#[error("first byte is {0:#04x}, expected the magic byte 0x00")]
	BadMagicByte(u8),
	#[error("message carries schema id {found}, expected {expected}")]
	UnexpectedSchemaId { expected: i32, found: i32 },
	#[error(transparent)]
	Decode(#[from] DecodeError),
}

/// Prepends the Confluent wire header to an Avro-encoded payload.
///
/// If `schema`'s root is a bare `bytes` schema, the payload is written
/// without Avro's own length prefix: the Confluent convention treats `bytes`
/// specially so that the wire format degrades to "header + raw bytes".
pub fn encode(value: &Value, schema_id: i32, schema: &Schema, out: &mut Vec<u8>) -> Result<(), EnvelopeEncodeError> {
	out.push(MAGIC_BYTE);
	out.extend_from_slice(&schema_id.to_be_bytes());
	encode_body(value, schema, out)?;
	Ok(())
}

fn encode_body(value: &Value, schema: &Schema, out: &mut Vec<u8>) -> Result<(), EncodeError> {
	if is_bare_bytes_schema(schema) {
		match value {
			Value::Bytes(b) => {
				out.extend_from_slice(b);
				Ok(())
			}
			other => Err(EncodeError::TypeMismatch(format!(
				"expected bytes for a bare-bytes wire schema, got {other:?}"
			))),
		}
	} else {
		codec::encode(value, SchemaKey::root(), schema, out)
	}
}

/// Strips the Confluent wire header and decodes the Avro body against
/// `schema`, which must be the schema identified by the header's id (the
/// caller is expected to have resolved `schema_id` to `schema` via the
/// registry already; this function does not fetch anything).
///
/// `expected_id`, if given, is checked against the header's id before
/// decoding: a mismatch most often means the message was produced against a
/// different schema than the one the caller resolved for this deserializer.
pub fn decode(
	data: &[u8],
	expected_id: Option<i32>,
	schema: &Schema,
) -> Result<Value, EnvelopeDecodeError> {
	let (id, body) = split_header(data)?;
	if let Some(expected) = expected_id {
		if expected != id {
			return Err(EnvelopeDecodeError::UnexpectedSchemaId {
				expected,
				found: id,
			});
		}
	}
	Ok(decode_body(body, schema)?)
}

/// Strips the header without asserting a particular id, returning the id
/// found in the header alongside the decoded value. Used by a "dynamic"
/// consumer that resolves the schema to use for decoding from the id itself
/// rather than expecting one specific schema.
pub fn decode_any(data: &[u8], schema: &Schema) -> Result<(i32, Value), EnvelopeDecodeError> {
	let (id, body) = split_header(data)?;
	let value = decode_body(body, schema)?;
	Ok((id, value))
}

pub fn schema_id(data: &[u8]) -> Result<i32, EnvelopeDecodeError> {
	split_header(data).map(|(id, _)| id)
}

fn split_header(data: &[u8]) -> Result<(i32, &[u8]), EnvelopeDecodeError> {
	if data.len() < HEADER_LEN {
		return Err(EnvelopeDecodeError::Truncated);
	}
	if data[0] != MAGIC_BYTE {
		return Err(EnvelopeDecodeError::BadMagicByte(data[0]));
	}
	let id = i32::from_be_bytes([data[1], data[2], data[3], data[4]]);
	Ok((id, &data[HEADER_LEN..]))
}

fn decode_body(body: &[u8], schema: &Schema) -> Result<Value, DecodeError> {
	if is_bare_bytes_schema(schema) {
		Ok(Value::Bytes(body.to_vec()))
	} else {
		let mut reader = body;
		codec::decode(SchemaKey::root(), schema, &mut reader)
	}
}

fn is_bare_bytes_schema(schema: &Schema) -> bool {
	matches!(schema.root().type_, RegularType::Bytes) && schema.root().logical_type.is_none()
}

/// A compiled `(T, Schema, schema id)` triple bound to the Confluent wire
/// format, for callers that already know the id to use (e.g. after a
/// registry lookup/registration).
pub struct FramedCodec<T> {
	schema: Arc<Schema>,
	schema_id: i32,
	_marker: std::marker::PhantomData<fn() -> T>,
}

impl<T> Clone for FramedCodec<T> {
	fn clone(&self) -> Self {
		Self {
			schema: Arc::clone(&self.schema),
			schema_id: self.schema_id,
			_marker: std::marker::PhantomData,
		}
	}
}

impl<T> FramedCodec<T> {
	pub fn new(schema: Arc<Schema>, schema_id: i32) -> Self {
		Self {
			schema,
			schema_id,
			_marker: std::marker::PhantomData,
		}
	}

	pub fn schema(&self) -> &Arc<Schema> {
		&self.schema
	}

	pub fn schema_id(&self) -> i32 {
		self.schema_id
	}
}

impl<T> FramedCodec<T> {
	/// Encodes an already-built [`Value`] without going through `T`: used by
	/// the caching service to encode a tombstone `Value::Null` against a
	/// codec compiled for `T`, since a tombstone carries no `T` to encode.
	pub fn encode_value(&self, value: &Value) -> Result<Vec<u8>, EnvelopeEncodeError> {
		let mut out = Vec::with_capacity(HEADER_LEN + 64);
		encode(value, self.schema_id, &self.schema, &mut out)?;
		Ok(out)
	}

	pub fn decode_value(&self, data: &[u8]) -> Result<Value, EnvelopeDecodeError> {
		decode(data, Some(self.schema_id), &self.schema)
	}
}

impl<T: ToAvroValue> FramedCodec<T> {
	pub fn encode(&self, value: &T) -> Result<Vec<u8>, EnvelopeEncodeError> {
		self.encode_value(&value.to_avro_value())
	}
}

impl<T: FromAvroValue> FramedCodec<T> {
	pub fn decode(&self, data: &[u8]) -> Result<T, FramedDecodeError> {
		let value = self.decode_value(data)?;
		Ok(T::from_avro_value(value)?)
	}
}

#[derive(Debug, thiserror::Error)]
pub enum FramedDecodeError {
	#[error(transparent)]
	Envelope(#[from] EnvelopeDecodeError),
	#[error(transparent)]
	FromValue(#[from] crate::value::FromAvroValueError),
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::schema::build_schema;

	#[test]
	fn rejects_short_messages() {
		assert!(matches!(schema_id(&[0x00, 0x00, 0x00]), Err(EnvelopeDecodeError::Truncated)));
	}

	#[test]
	fn rejects_bad_magic_byte() {
		let data = [0x01, 0x00, 0x00, 0x00, 0x01];
		assert!(matches!(
			schema_id(&data),
			Err(EnvelopeDecodeError::BadMagicByte(0x01))
		));
	}

	#[test]
	fn roundtrips_header_and_id() {
		let schema = Arc::new(build_schema::<i32>(Default::default()));
		let codec = FramedCodec::<i32>::new(schema, 42);
		let bytes = codec.encode(&7).unwrap();
		assert_eq!(&bytes[..5], &[0x00, 0x00, 0x00, 0x00, 42]);
		let back = codec.decode(&bytes).unwrap();
		assert_eq!(back, 7);
	}

	#[test]
	fn detects_schema_id_mismatch() {
		let schema = Arc::new(build_schema::<i32>(Default::default()));
		let codec = FramedCodec::<i32>::new(schema, 42);
		let mut bytes = codec.encode(&7).unwrap();
		bytes[4] = 99;
		assert!(matches!(
			codec.decode(&bytes),
			Err(FramedDecodeError::Envelope(EnvelopeDecodeError::UnexpectedSchemaId {
				expected: 42,
				found: 99
			}))
		));
	}

	#[test]
	fn bare_bytes_schema_has_no_inner_length_prefix() {
		let schema = Arc::new(build_schema::<Vec<u8>>(Default::default()));
		let codec = FramedCodec::<Vec<u8>>::new(schema, 1);
		let bytes = codec.encode(&vec![1, 2, 3]).unwrap();
		assert_eq!(&bytes[5..], &[1, 2, 3]);
	}
}
