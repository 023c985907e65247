/// Any error that may happen while encoding a [`crate::value::Value`] to the
/// Avro binary encoding.
#[derive(Debug, thiserror::Error)]
pub enum EncodeError {
	#[error("value does not match the schema at this position: {0}")]
	TypeMismatch(String),
	#[error("no union member fits this value")]
	NoMatchingUnionMember,
	#[error("decimal value does not fit the schema's precision/scale")]
	DecimalOutOfRange,
	#[error("i/o error while writing: {0}")]
	Io(#[from] std::io::Error),
}

/// Any error that may happen while decoding the Avro binary encoding into a
/// [`crate::value::Value`].
#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
	#[error("unexpected end of input")]
	UnexpectedEof,
	#[error("invalid boolean byte: {0}")]
	InvalidBoolean(u8),
	#[error("invalid union discriminant: {0}")]
	InvalidUnionDiscriminant(i64),
	#[error("invalid enum discriminant: {0}")]
	InvalidEnumDiscriminant(i64),
	#[error("string/bytes length out of range: {0}")]
	InvalidLength(i64),
	#[error("invalid utf-8 in string")]
	InvalidUtf8(#[from] std::string::FromUtf8Error),
	#[error("i/o error while reading: {0}")]
	Io(#[from] std::io::Error),
}

/// Any error that may happen while decoding bytes directly into a host type
/// via [`super::Codec`], combining the binary-layer and host-conversion
/// failure modes.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
	#[error(transparent)]
	Decode(#[from] DecodeError),
	#[error(transparent)]
	FromValue(#[from] crate::value::FromAvroValueError),
}
