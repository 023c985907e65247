//! # Getting started
//!
//! ```
//! let schema: avro_registry_codec::Schema = r#"
//! {
//! 	"namespace": "test",
//! 	"type": "record",
//! 	"name": "Test",
//! 	"fields": [
//! 		{ "type": "string", "name": "field" }
//! 	]
//! }
//! "#
//! .parse()
//! .expect("failed to parse schema");
//!
//! assert!(matches!(
//! 	schema.root().type_,
//! 	avro_registry_codec::schema::RegularType::Record(_)
//! ));
//! ```
//!
//! # Avro schema modelling and a Confluent-Schema-Registry-aware binary codec
//!
//! This crate gives you three layers that compose:
//! - [`schema`]: a validated, arena-backed Avro schema model, with JSON
//!   parsing/serialization and a reflection-driven builder ([`schema::build_schema`])
//!   for deriving a schema straight from a Rust type.
//! - [`codec`]: a binary encoder/decoder for the [`value::Value`] dynamic
//!   representation, keyed on a [`schema::Schema`].
//! - [`envelope`]/[`registry`]/[`service`]: the Confluent wire format (magic
//!   byte + schema id), a `SchemaRegistryClient` trait plus an HTTP
//!   implementation, and a registry-backed cache of compiled codecs with
//!   single-flight build coordination and tombstone handling.
//!
//! Most applications only need [`service::CodecService`]; the lower layers
//! are exposed for callers that already have a schema/id and want to
//! (de)serialize without going through a registry.

pub mod case_pipeline;
pub mod codec;
pub mod envelope;
pub mod registry;
pub mod schema;
pub mod service;
pub mod value;

pub use schema::{Schema, SchemaKey};
pub use value::Value;

#[cfg(feature = "derive")]
pub use avro_registry_codec_derive::{AvroValue, ReflectType};
