#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
	#[error(transparent)]
	Registry(#[from] crate::registry::RegistryError),
	#[error(transparent)]
	Schema(#[from] crate::schema::SchemaError),
	#[error("codec cannot be built for this schema: {0}")]
	UnsupportedSchema(String),
	#[error("codec cannot be built for this host type: {0}")]
	UnsupportedType(String),
	#[error(transparent)]
	Envelope(#[from] crate::envelope::EnvelopeDecodeError),
	#[error(transparent)]
	EnvelopeEncode(#[from] crate::envelope::EnvelopeEncodeError),
	#[error(transparent)]
	FramedDecode(#[from] crate::envelope::FramedDecodeError),
	#[error(transparent)]
	ToValue(#[from] crate::value::FromAvroValueError),
}
