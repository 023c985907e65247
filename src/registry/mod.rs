//! The Schema Registry client contract (§6): the interface the caching
//! service (`crate::service`) drives, and an HTTP implementation of it
//! against the Confluent Schema Registry REST API.

mod http;

pub use http::HttpSchemaRegistryClient;

use async_trait::async_trait;

/// A schema as returned by the registry: its global id and its raw JSON text.
#[derive(Debug, Clone)]
pub struct RegisteredSchema {
	pub id: i32,
	pub raw_json: String,
}

/// What a caching layer needs from a Schema Registry.
///
/// Implementors are expected to be cheap to clone and safe to share across
/// tasks; [`HttpSchemaRegistryClient`] wraps a pooled [`reqwest::Client`].
#[async_trait]
pub trait SchemaRegistryClient: Send + Sync {
	async fn get_by_id(&self, id: i32) -> Result<RegisteredSchema, RegistryError>;
	async fn get_latest(&self, subject: &str) -> Result<RegisteredSchema, RegistryError>;
	async fn get(&self, subject: &str, version: i32) -> Result<RegisteredSchema, RegistryError>;
	/// Id of `schema_json` under `subject`, if it's already registered there.
	async fn id_of(&self, subject: &str, schema_json: &str) -> Result<i32, RegistryError>;
	/// Registers `raw_json` under `subject`, returning the id the registry
	/// assigned it (an already-registered identical schema returns its
	/// existing id rather than creating a duplicate).
	async fn register(&self, subject: &str, raw_json: &str) -> Result<i32, RegistryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum RegistryError {
	#[error(transparent)]
	Transport(#[from] reqwest::Error),
	#[error("schema registry returned error {error_code}: {message}")]
	Api { error_code: i32, message: String },
	#[error("schema registry response did not include a schema id")]
	MissingId,
}
