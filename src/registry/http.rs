use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::Client;
use serde::{Deserialize, Serialize};

use super::{RegisteredSchema, RegistryError, SchemaRegistryClient};

fn registry_headers() -> HeaderMap {
	let mut headers = HeaderMap::new();
	headers.insert(
		ACCEPT,
		HeaderValue::from_static("application/vnd.schemaregistry.v1+json"),
	);
	headers.insert(
		CONTENT_TYPE,
		HeaderValue::from_static("application/vnd.schemaregistry.v1+json"),
	);
	headers
}

/// An HTTP client for the Confluent Schema Registry REST API.
///
/// Does no caching of its own: every call hits the network. Caching and
/// single-flight build coordination live in [`crate::service`], which wraps
/// a `SchemaRegistryClient` rather than reimplementing it here.
pub struct HttpSchemaRegistryClient {
	http: Client,
	base_url: String,
}

impl HttpSchemaRegistryClient {
	pub fn new(base_url: impl Into<String>) -> Self {
		Self::with_client(Client::new(), base_url)
	}

	pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
		Self {
			http,
			base_url: base_url.into(),
		}
	}

	async fn fetch(&self, path: &str) -> Result<SchemaResponse, RegistryError> {
		let response = self
			.http
			.get(format!("{}{path}", self.base_url))
			.headers(registry_headers())
			.send()
			.await?;
		parse_response(response).await
	}
}

#[async_trait]
impl SchemaRegistryClient for HttpSchemaRegistryClient {
	async fn get_by_id(&self, id: i32) -> Result<RegisteredSchema, RegistryError> {
		let resp = self.fetch(&format!("/schemas/ids/{id}")).await?;
		Ok(RegisteredSchema {
			id,
			raw_json: resp.schema,
		})
	}

	async fn get_latest(&self, subject: &str) -> Result<RegisteredSchema, RegistryError> {
		let resp = self.fetch(&format!("/subjects/{subject}/versions/latest")).await?;
		Ok(RegisteredSchema {
			id: resp.id.ok_or(RegistryError::MissingId)?,
			raw_json: resp.schema,
		})
	}

	async fn get(&self, subject: &str, version: i32) -> Result<RegisteredSchema, RegistryError> {
		let resp = self
			.fetch(&format!("/subjects/{subject}/versions/{version}"))
			.await?;
		Ok(RegisteredSchema {
			id: resp.id.ok_or(RegistryError::MissingId)?,
			raw_json: resp.schema,
		})
	}

	async fn id_of(&self, subject: &str, schema_json: &str) -> Result<i32, RegistryError> {
		let req = RegisterRequest {
			schema: schema_json,
			schema_type: "AVRO",
		};
		let url = format!("{}/subjects/{subject}", self.base_url);
		let response = self
			.http
			.post(url)
			.headers(registry_headers())
			.json(&req)
			.send()
			.await?;
		let resp: RegisterResponse = parse_response(response).await?;
		Ok(resp.id)
	}

	async fn register(&self, subject: &str, raw_json: &str) -> Result<i32, RegistryError> {
		let url = format!("{}/subjects/{subject}/versions", self.base_url);
		let req = RegisterRequest {
			schema: raw_json,
			schema_type: "AVRO",
		};
		let response = self
			.http
			.post(url)
			.headers(registry_headers())
			.json(&req)
			.send()
			.await?;
		let resp: RegisterResponse = parse_response(response).await?;
		Ok(resp.id)
	}
}

async fn parse_response<D: serde::de::DeserializeOwned>(response: reqwest::Response) -> Result<D, RegistryError> {
	if response.status().is_success() {
		Ok(response.json().await?)
	} else {
		let error: RegistryErrorBody = response.json().await?;
		Err(RegistryError::Api {
			error_code: error.error_code,
			message: error
				.message
				.unwrap_or_else(|| "unexpected error from the schema registry".to_owned()),
		})
	}
}

#[derive(Debug, Deserialize)]
struct RegistryErrorBody {
	error_code: i32,
	message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SchemaResponse {
	id: Option<i32>,
	schema: String,
}

#[derive(Debug, Serialize)]
struct RegisterRequest<'a> {
	schema: &'a str,
	#[serde(rename = "schemaType")]
	schema_type: &'a str,
}

#[derive(Debug, Deserialize)]
struct RegisterResponse {
	id: i32,
}
