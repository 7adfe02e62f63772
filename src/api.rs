//! Request construction and response decoding shared by every provider call.

// crates.io
use base64::{Engine as _, engine::general_purpose::STANDARD};
use oauth2::{
	HttpRequest, HttpResponse,
	http::{
		Method, Request,
		header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
	},
};
use serde::de::DeserializeOwned;
use url::form_urlencoded::Serializer as FormSerializer;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, ProtocolError},
	provider::ProviderCall,
};

const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";
const FORM_CONTENT_TYPE: &str = "application/x-www-form-urlencoded";

/// `Authorization` header value for HTTP Basic credentials.
pub(crate) fn basic_authorization(user: &str, password: &str) -> String {
	format!("Basic {}", STANDARD.encode(format!("{user}:{password}")))
}

/// `Authorization` header value for a bearer token.
pub(crate) fn bearer_authorization(token: &str) -> String {
	format!("Bearer {token}")
}

pub(crate) fn get(url: &Url, authorization: &str) -> Result<HttpRequest> {
	let request = Request::builder()
		.method(Method::GET)
		.uri(url.as_str())
		.header(AUTHORIZATION, authorization)
		.header(ACCEPT, "application/json")
		.body(Vec::new())
		.map_err(ConfigError::from)?;

	Ok(request)
}

pub(crate) fn post_json<T>(url: &Url, authorization: &str, body: &T) -> Result<HttpRequest>
where
	T: ?Sized + Serialize,
{
	let body = serde_json::to_vec(body).map_err(ConfigError::RequestEncode)?;
	let request = Request::builder()
		.method(Method::POST)
		.uri(url.as_str())
		.header(AUTHORIZATION, authorization)
		.header(CONTENT_TYPE, JSON_CONTENT_TYPE)
		.header(ACCEPT, "application/json")
		.body(body)
		.map_err(ConfigError::from)?;

	Ok(request)
}

pub(crate) fn post_form(url: &Url, authorization: &str, pairs: &[(&str, &str)]) -> Result<HttpRequest> {
	let mut form = FormSerializer::new(String::new());

	form.extend_pairs(pairs.iter().copied());

	let request = Request::builder()
		.method(Method::POST)
		.uri(url.as_str())
		.header(AUTHORIZATION, authorization)
		.header(CONTENT_TYPE, FORM_CONTENT_TYPE)
		.header(ACCEPT, "application/json")
		.body(form.finish().into_bytes())
		.map_err(ConfigError::from)?;

	Ok(request)
}

/// Standard `{status, message, response}` envelope of the `api` host.
#[derive(Debug, Deserialize)]
struct Envelope {
	#[serde(default)]
	status: Option<i64>,
	#[serde(default)]
	message: Option<String>,
	#[serde(default)]
	response: Option<JsonValue>,
}

/// Successful envelope: the raw `response` member plus the provider's `message`.
#[derive(Debug)]
pub(crate) struct EnvelopePayload {
	pub(crate) status: u16,
	pub(crate) response: Option<JsonValue>,
	pub(crate) message: Option<String>,
}

/// Parses an `api` envelope and requires `status == 1`.
pub(crate) fn open_envelope(call: ProviderCall, response: &HttpResponse) -> Result<EnvelopePayload> {
	let status = response.status().as_u16();
	let envelope: Envelope = parse_json(call, status, response.body())?;

	if envelope.status != Some(1) {
		return Err(ProtocolError::Status {
			call,
			status: envelope.status,
			message: envelope.message,
		}
		.into());
	}

	Ok(EnvelopePayload { status, response: envelope.response, message: envelope.message })
}

/// Parses an `api` envelope, requires `status == 1`, and decodes its `response` member.
pub(crate) fn decode_envelope<T>(call: ProviderCall, response: &HttpResponse) -> Result<T>
where
	T: DeserializeOwned,
{
	let EnvelopePayload { status, response, .. } = open_envelope(call, response)?;
	let payload = response.ok_or(ProtocolError::MissingField { call, field: "response" })?;

	serde_path_to_error::deserialize(payload)
		.map_err(|source| ProtocolError::Parse { call, status, source }.into())
}

/// Parses an OAuth-style body, rejecting any payload that carries an `error` field.
pub(crate) fn decode_oauth_body(call: ProviderCall, response: &HttpResponse) -> Result<JsonMap<String, JsonValue>> {
	let status = response.status().as_u16();
	let body: JsonMap<String, JsonValue> = parse_json(call, status, response.body())?;

	match body.get("error") {
		None | Some(JsonValue::Null) => Ok(body),
		Some(error) => {
			let error = match error {
				JsonValue::String(value) => value.clone(),
				other => other.to_string(),
			};
			let description =
				body.get("error_description").and_then(JsonValue::as_str).map(str::to_owned);

			Err(ProtocolError::Provider { call, error, description }.into())
		},
	}
}

pub(crate) fn parse_json<T>(call: ProviderCall, status: u16, body: &[u8]) -> Result<T>
where
	T: DeserializeOwned,
{
	let mut de = serde_json::Deserializer::from_slice(body);

	serde_path_to_error::deserialize(&mut de)
		.map_err(|source| ProtocolError::Parse { call, status, source }.into())
}
