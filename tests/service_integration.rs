use std::sync::atomic::{AtomicI32, Ordering};
use std::sync::Mutex;

use async_trait::async_trait;

use avro_registry_codec::registry::{RegisteredSchema, RegistryError, SchemaRegistryClient};
use avro_registry_codec::schema::build_schema;
use avro_registry_codec::service::{CodecService, CodecServiceConfig, Component, RegisterAutomatically, TombstoneBehavior};
use avro_registry_codec::value::ToAvroValue;
use avro_registry_codec_derive::{AvroValue, ReflectType};

#[derive(ReflectType, AvroValue, Debug, PartialEq, Clone, Default)]
struct Order {
	pub id: i64,
	pub quantity: i32,
}

/// An in-memory stand-in for a Confluent Schema Registry: subjects register
/// their own incrementing ids, and `get_by_id`/`get_latest` serve whatever
/// was registered.
#[derive(Default)]
struct FakeRegistry {
	next_id: AtomicI32,
	by_id: Mutex<std::collections::HashMap<i32, String>>,
	by_subject: Mutex<std::collections::HashMap<String, (i32, String)>>,
}

#[async_trait]
impl SchemaRegistryClient for FakeRegistry {
	async fn get_by_id(&self, id: i32) -> Result<RegisteredSchema, RegistryError> {
		self.by_id
			.lock()
			.unwrap()
			.get(&id)
			.cloned()
			.map(|raw_json| RegisteredSchema { id, raw_json })
			.ok_or(RegistryError::MissingId)
	}

	async fn get_latest(&self, subject: &str) -> Result<RegisteredSchema, RegistryError> {
		self.by_subject
			.lock()
			.unwrap()
			.get(subject)
			.cloned()
			.map(|(id, raw_json)| RegisteredSchema { id, raw_json })
			.ok_or(RegistryError::MissingId)
	}

	async fn get(&self, subject: &str, _version: i32) -> Result<RegisteredSchema, RegistryError> {
		self.get_latest(subject).await
	}

	async fn id_of(&self, subject: &str, _schema_json: &str) -> Result<i32, RegistryError> {
		self.by_subject
			.lock()
			.unwrap()
			.get(subject)
			.map(|(id, _)| *id)
			.ok_or(RegistryError::MissingId)
	}

	async fn register(&self, subject: &str, raw_json: &str) -> Result<i32, RegistryError> {
		let id = self.next_id.fetch_add(1, Ordering::SeqCst);
		self.by_id.lock().unwrap().insert(id, raw_json.to_owned());
		self.by_subject.lock().unwrap().insert(subject.to_owned(), (id, raw_json.to_owned()));
		Ok(id)
	}
}

#[tokio::test]
async fn encodes_and_decodes_through_auto_registration() {
	let registry = std::sync::Arc::new(FakeRegistry::default());
	let mut config = CodecServiceConfig::default();
	config.register_automatically = RegisterAutomatically::Always;
	let service: CodecService<Order> = CodecService::new(registry.clone(), config);

	let order = Order { id: 42, quantity: 3 };
	let bytes = service.encode("orders", Component::Value, Some(&order)).await.unwrap();

	// the subject-name builder's default convention is "{topic}-value"
	assert!(registry.by_subject.lock().unwrap().contains_key("orders-value"));

	let decoded = service.decode("orders", Component::Value, &bytes).await.unwrap();
	assert_eq!(decoded, Some(order));
}

#[tokio::test]
async fn key_and_value_subjects_are_registered_independently() {
	let registry = std::sync::Arc::new(FakeRegistry::default());
	let mut config = CodecServiceConfig::default();
	config.register_automatically = RegisterAutomatically::Always;
	let service: CodecService<Order> = CodecService::new(registry.clone(), config);

	let a = Order { id: 1, quantity: 1 };
	service.encode("orders", Component::Key, Some(&a)).await.unwrap();
	service.encode("orders", Component::Value, Some(&a)).await.unwrap();

	let subjects = registry.by_subject.lock().unwrap();
	assert!(subjects.contains_key("orders-key"));
	assert!(subjects.contains_key("orders-value"));
}

#[tokio::test]
async fn encode_version_pins_to_the_exact_registered_schema() {
	let registry = std::sync::Arc::new(FakeRegistry::default());
	let schema = build_schema::<Order>(Default::default());
	registry.by_id.lock().unwrap().insert(3, schema.json().to_owned());
	registry.by_subject.lock().unwrap().insert("orders-value".to_owned(), (3, schema.json().to_owned()));

	let service: CodecService<Order> = CodecService::new(registry.clone(), CodecServiceConfig::default());
	let order = Order { id: 5, quantity: 2 };
	let bytes = service.encode_version("orders", Component::Value, 1, Some(&order)).await.unwrap();

	let decoded = service.decode("orders", Component::Value, &bytes).await.unwrap();
	assert_eq!(decoded, Some(order));
}

#[tokio::test]
async fn strict_tombstone_round_trips_as_empty_payload() {
	let registry = std::sync::Arc::new(FakeRegistry::default());
	let mut config = CodecServiceConfig::default();
	config.register_automatically = RegisterAutomatically::Always;
	config.tombstone_behavior = TombstoneBehavior::Strict;
	let service: CodecService<Order> = CodecService::new(registry.clone(), config);

	let bytes = service.encode("orders", Component::Value, None).await.unwrap();
	assert!(bytes.is_empty());
	let decoded = service.decode("orders", Component::Value, &bytes).await.unwrap();
	assert_eq!(decoded, None);
	// no subject was ever touched for a tombstone
	assert!(registry.by_subject.lock().unwrap().is_empty());
}

#[tokio::test]
async fn decode_resolves_schema_by_the_id_embedded_in_the_message() {
	let registry = std::sync::Arc::new(FakeRegistry::default());
	let schema = build_schema::<Order>(Default::default());
	registry.by_id.lock().unwrap().insert(7, schema.json().to_owned());

	let service: CodecService<Order> = CodecService::new(registry.clone(), CodecServiceConfig::default());
	let order = Order { id: 9, quantity: 5 };
	let mut bytes = Vec::new();
	avro_registry_codec::envelope::encode(&order.to_avro_value(), 7, &schema, &mut bytes).unwrap();

	let decoded = service.decode("orders", Component::Value, &bytes).await.unwrap();
	assert_eq!(decoded, Some(order));
}
