//! The registry-cached codec service (C7): per-schema-id and per-subject
//! caches of compiled [`FramedCodec`]s, built single-flight against a
//! [`SchemaRegistryClient`], with tombstone handling for pub-sub null
//! values.
//!
//! Single-flight build coordination uses one [`tokio::sync::OnceCell`] per
//! key, itself reached through a [`dashmap::DashMap`]: concurrent callers for
//! an uncached key share the same `OnceCell::get_or_try_init` future, so at
//! most one registry fetch + codec compilation happens per key. A failed
//! build leaves the `OnceCell` uninitialized (that's `get_or_try_init`'s
//! contract), and the entry is additionally dropped from the map so a
//! subsequent caller starts from a clean `OnceCell` rather than retrying the
//! same one forever.

mod config;
mod error;

pub use config::{Component, CodecServiceConfig, RegisterAutomatically, SubjectNameBuilder, SubjectNameContext, TombstoneBehavior};
pub use error::ServiceError;

use std::marker::PhantomData;
use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;

use crate::envelope::{self, FramedCodec};
use crate::registry::SchemaRegistryClient;
use crate::schema::{build_schema, ReflectType, RegularType, Schema};
use crate::value::{FromAvroValue, ToAvroValue, Value};

type Slot<T> = Arc<OnceCell<Arc<FramedCodec<T>>>>;

/// A codec service bound to one host type `T`, caching compiled codecs by
/// schema id (for deserialising) and by subject (for serialising).
pub struct CodecService<T> {
	registry: Arc<dyn SchemaRegistryClient>,
	config: CodecServiceConfig,
	by_id: DashMap<i32, Slot<T>>,
	by_subject: DashMap<String, Slot<T>>,
	_marker: PhantomData<fn() -> T>,
}

impl<T> CodecService<T>
where
	T: ReflectType + ToAvroValue + FromAvroValue + Send + Sync + 'static,
{
	pub fn new(registry: Arc<dyn SchemaRegistryClient>, config: CodecServiceConfig) -> Self {
		Self {
			registry,
			config,
			by_id: DashMap::new(),
			by_subject: DashMap::new(),
			_marker: PhantomData,
		}
	}

	/// Decodes a Confluent-framed message for `topic`'s `component`.
	///
	/// `data.is_empty()` represents the pub-sub convention for "no value at
	/// all" (a Kafka tombstone); under [`TombstoneBehavior::Strict`] at the
	/// value position this resolves to `Ok(None)` without any registry
	/// lookup, otherwise it's an error since there's no schema id to resolve.
	pub async fn decode(&self, topic: &str, component: Component, data: &[u8]) -> Result<Option<T>, ServiceError> {
		if data.is_empty() {
			return match (self.config.tombstone_behavior, component) {
				(TombstoneBehavior::Strict, Component::Value) => Ok(None),
				_ => Err(ServiceError::UnsupportedSchema(
					"empty message outside TombstoneBehavior::Strict at the value position".into(),
				)),
			};
		}
		let _ = topic; // the schema id alone resolves the codec; topic only selects the subject for encode
		let id = envelope::schema_id(data)?;
		let codec = self.codec_for_id(id).await?;
		Ok(Some(codec.decode(data)?))
	}

	/// Encodes `value` for `topic`'s `component`; `None` represents a
	/// tombstone. Under `TombstoneBehavior::Strict` at the value position
	/// this emits the empty payload directly with no registry lookup; any
	/// other combination passes `None` through to the body codec as
	/// `Value::Null`, which only succeeds if the schema itself can carry
	/// `null`.
	pub async fn encode(&self, topic: &str, component: Component, value: Option<&T>) -> Result<Vec<u8>, ServiceError> {
		if value.is_none() && self.config.tombstone_behavior == TombstoneBehavior::Strict && component == Component::Value {
			return Ok(Vec::new());
		}
		let subject = (self.config.subject_name_builder)(&SubjectNameContext { topic, component });
		let codec = self.codec_for_subject(&subject).await?;
		match value {
			Some(v) => Ok(codec.encode(v)?),
			None => Ok(codec.encode_value(&Value::Null)?),
		}
	}

	/// Encodes `value` for `topic`'s `component` against the exact
	/// registered `version` of the subject's schema, rather than whatever is
	/// latest. Tombstones behave as in [`Self::encode`].
	pub async fn encode_version(
		&self,
		topic: &str,
		component: Component,
		version: i32,
		value: Option<&T>,
	) -> Result<Vec<u8>, ServiceError> {
		if value.is_none() && self.config.tombstone_behavior == TombstoneBehavior::Strict && component == Component::Value {
			return Ok(Vec::new());
		}
		let subject = (self.config.subject_name_builder)(&SubjectNameContext { topic, component });
		let codec = self.codec_for_subject_version(&subject, version).await?;
		match value {
			Some(v) => Ok(codec.encode(v)?),
			None => Ok(codec.encode_value(&Value::Null)?),
		}
	}

	async fn codec_for_id(&self, id: i32) -> Result<Arc<FramedCodec<T>>, ServiceError> {
		let slot = self.by_id.entry(id).or_insert_with(|| Arc::new(OnceCell::new())).clone();
		match slot.get_or_try_init(|| self.build_for_id(id)).await {
			Ok(codec) => Ok(Arc::clone(codec)),
			Err(err) => {
				self.by_id.remove_if(&id, |_, v| Arc::ptr_eq(v, &slot));
				Err(err)
			}
		}
	}

	async fn codec_for_subject(&self, subject: &str) -> Result<Arc<FramedCodec<T>>, ServiceError> {
		let slot = self
			.by_subject
			.entry(subject.to_owned())
			.or_insert_with(|| Arc::new(OnceCell::new()))
			.clone();
		match slot.get_or_try_init(|| self.build_for_subject(subject)).await {
			Ok(codec) => Ok(Arc::clone(codec)),
			Err(err) => {
				self.by_subject.remove_if(subject, |_, v| Arc::ptr_eq(v, &slot));
				Err(err)
			}
		}
	}

	/// Cached under `"{subject}@{version}"` in `by_subject`, alongside the
	/// latest-version entries cached under the bare subject name.
	async fn codec_for_subject_version(&self, subject: &str, version: i32) -> Result<Arc<FramedCodec<T>>, ServiceError> {
		let key = format!("{subject}@{version}");
		let slot = self.by_subject.entry(key.clone()).or_insert_with(|| Arc::new(OnceCell::new())).clone();
		match slot.get_or_try_init(|| self.build_for_subject_version(subject, version)).await {
			Ok(codec) => Ok(Arc::clone(codec)),
			Err(err) => {
				self.by_subject.remove_if(&key, |_, v| Arc::ptr_eq(v, &slot));
				Err(err)
			}
		}
	}

	async fn build_for_id(&self, id: i32) -> Result<Arc<FramedCodec<T>>, ServiceError> {
		let registered = self.registry.get_by_id(id).await?;
		let schema: Schema = registered.raw_json.parse()?;
		self.check_tombstone_compat(&schema)?;
		Ok(Arc::new(FramedCodec::new(Arc::new(schema), id)))
	}

	async fn build_for_subject(&self, subject: &str) -> Result<Arc<FramedCodec<T>>, ServiceError> {
		match self.config.register_automatically {
			RegisterAutomatically::Never => {
				let registered = self.registry.get_latest(subject).await?;
				let schema: Schema = registered.raw_json.parse()?;
				self.check_tombstone_compat(&schema)?;
				Ok(Arc::new(FramedCodec::new(Arc::new(schema), registered.id)))
			}
			RegisterAutomatically::Always => {
				let schema = build_schema::<T>(self.config.schema_builder_config.clone());
				self.check_tombstone_compat(&schema)?;
				let id = self.registry.register(subject, schema.json()).await?;
				Ok(Arc::new(FramedCodec::new(Arc::new(schema), id)))
			}
		}
	}

	/// Fetches `subject`'s exact `version` and resolves its registry id,
	/// rather than trusting whatever id the registry happens to report
	/// alongside the schema text for that lookup.
	async fn build_for_subject_version(&self, subject: &str, version: i32) -> Result<Arc<FramedCodec<T>>, ServiceError> {
		let registered = self.registry.get(subject, version).await?;
		let id = self.registry.id_of(subject, &registered.raw_json).await?;
		let schema: Schema = registered.raw_json.parse()?;
		self.check_tombstone_compat(&schema)?;
		Ok(Arc::new(FramedCodec::new(Arc::new(schema), id)))
	}

	fn check_tombstone_compat(&self, schema: &Schema) -> Result<(), ServiceError> {
		if self.config.tombstone_behavior != TombstoneBehavior::Strict {
			return Ok(());
		}
		if !T::represents_absence() {
			return Err(ServiceError::UnsupportedType(
				"TombstoneBehavior::Strict requires a host type that can represent null (Option<T>, or a type that also derives Default)".into(),
			));
		}
		let root = schema.root();
		let can_represent_null = matches!(root.type_, RegularType::Null)
			|| matches!(&root.type_, RegularType::Union(u) if u.null_variant_idx(schema.nodes()).is_some());
		if can_represent_null {
			return Err(ServiceError::UnsupportedSchema(
				"TombstoneBehavior::Strict requires a schema that cannot itself represent null".into(),
			));
		}
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use async_trait::async_trait;
	use std::sync::atomic::{AtomicUsize, Ordering};

	use crate::registry::{RegisteredSchema, RegistryError};

	struct CountingRegistry {
		fetches: AtomicUsize,
		schema_json: String,
	}

	#[async_trait]
	impl SchemaRegistryClient for CountingRegistry {
		async fn get_by_id(&self, id: i32) -> Result<RegisteredSchema, RegistryError> {
			self.fetches.fetch_add(1, Ordering::SeqCst);
			Ok(RegisteredSchema {
				id,
				raw_json: self.schema_json.clone(),
			})
		}
		async fn get_latest(&self, _subject: &str) -> Result<RegisteredSchema, RegistryError> {
			unimplemented!()
		}
		async fn get(&self, _subject: &str, _version: i32) -> Result<RegisteredSchema, RegistryError> {
			unimplemented!()
		}
		async fn id_of(&self, _subject: &str, _schema_json: &str) -> Result<i32, RegistryError> {
			unimplemented!()
		}
		async fn register(&self, _subject: &str, _raw_json: &str) -> Result<i32, RegistryError> {
			unimplemented!()
		}
	}

	#[tokio::test]
	async fn concurrent_lookups_fetch_the_registry_once() {
		let schema = build_schema::<i32>(Default::default());
		let registry = Arc::new(CountingRegistry {
			fetches: AtomicUsize::new(0),
			schema_json: schema.json().to_owned(),
		});
		let service: Arc<CodecService<i32>> = Arc::new(CodecService::new(registry.clone(), CodecServiceConfig::default()));

		let mut out = Vec::new();
		envelope::encode(&Value::Int(7), 1, &schema, &mut out).unwrap();

		let handles: Vec<_> = (0..8)
			.map(|_| {
				let service = Arc::clone(&service);
				let out = out.clone();
				tokio::spawn(async move { service.decode("t", Component::Value, &out).await.unwrap() })
			})
			.collect();
		for handle in handles {
			assert_eq!(handle.await.unwrap(), Some(7));
		}
		assert_eq!(registry.fetches.load(Ordering::SeqCst), 1);
	}

	#[tokio::test]
	async fn strict_tombstone_decodes_to_none_without_registry_call() {
		let registry = Arc::new(CountingRegistry {
			fetches: AtomicUsize::new(0),
			schema_json: build_schema::<i32>(Default::default()).json().to_owned(),
		});
		let mut config = CodecServiceConfig::default();
		config.tombstone_behavior = TombstoneBehavior::Strict;
		let service: CodecService<i32> = CodecService::new(registry.clone(), config);

		let decoded = service.decode("t", Component::Value, &[]).await.unwrap();
		assert_eq!(decoded, None);
		assert_eq!(registry.fetches.load(Ordering::SeqCst), 0);
	}
}
