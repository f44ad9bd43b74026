//! Per-request options and the recursive merge that injects the bearer header.
//!
//! Options are a JSON object with a small set of well-known keys understood by the bundled
//! executor:
//!
//! - `headers`: object mapping header names to a string or a list of strings.
//! - `query`: object mapping parameter names to scalars or lists of scalars.
//! - `json`: any JSON value, sent as an `application/json` body.
//! - `body`: raw string body.
//! - `timeout`: transport timeout in seconds.
//!
//! Custom executors are free to interpret additional keys.

// self
use crate::{_prelude::*, auth::TokenSecret, error::RequestError};

/// Header carrying the bearer credential.
pub const AUTHORIZATION_HEADER: &str = "Authorization";
/// Option key holding request headers.
pub const HEADERS: &str = "headers";
/// Option key holding query parameters.
pub const QUERY: &str = "query";
/// Option key holding a JSON body.
pub const JSON: &str = "json";
/// Option key holding a raw string body.
pub const BODY: &str = "body";
/// Option key holding the transport timeout in seconds.
pub const TIMEOUT: &str = "timeout";

/// Caller-supplied request options.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RequestOptions(Map<String, Value>);
impl RequestOptions {
	/// Creates an empty option set.
	pub fn new() -> Self {
		Self::default()
	}

	/// Wraps an arbitrary JSON value, which must be an object.
	pub fn from_value(value: Value) -> Result<Self, RequestError> {
		match value {
			Value::Object(map) => Ok(Self(map)),
			other => Err(RequestError::invalid_option(
				"options",
				format!("expected a JSON object, got {}", json_kind(&other)),
			)),
		}
	}

	/// Adds a header value. Repeated names accumulate into a list.
	pub fn header(self, name: impl Into<String>, value: impl Into<String>) -> Self {
		self.push_nested(HEADERS, name.into(), Value::String(value.into()))
	}

	/// Adds a query parameter. Repeated names accumulate into a list.
	pub fn query(self, name: impl Into<String>, value: impl Into<Value>) -> Self {
		self.push_nested(QUERY, name.into(), value.into())
	}

	/// Sets the JSON body.
	pub fn json(mut self, body: Value) -> Self {
		self.0.insert(JSON.into(), body);

		self
	}

	/// Sets a raw string body.
	pub fn body(mut self, body: impl Into<String>) -> Self {
		self.0.insert(BODY.into(), Value::String(body.into()));

		self
	}

	/// Sets the transport timeout.
	pub fn timeout(mut self, timeout: std::time::Duration) -> Self {
		self.0.insert(TIMEOUT.into(), Value::from(timeout.as_secs_f64()));

		self
	}

	/// Sets an arbitrary option key.
	pub fn with(mut self, key: impl Into<String>, value: Value) -> Self {
		self.0.insert(key.into(), value);

		self
	}

	/// Returns the value stored under `key`.
	pub fn get(&self, key: &str) -> Option<&Value> {
		self.0.get(key)
	}

	/// Returns the header map, if any headers are set.
	pub fn headers(&self) -> Option<&Map<String, Value>> {
		self.0.get(HEADERS).and_then(Value::as_object)
	}

	/// Returns the first value of a header, matching the name case-insensitively.
	pub fn header_value(&self, name: &str) -> Option<&str> {
		let (_, value) = self.headers()?.iter().find(|(key, _)| key.eq_ignore_ascii_case(name))?;

		match value {
			Value::String(text) => Some(text),
			Value::Array(items) => items.first().and_then(Value::as_str),
			_ => None,
		}
	}

	/// Iterates over every option key and value.
	pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
		self.0.iter()
	}

	/// Returns `true` when no options are set.
	pub fn is_empty(&self) -> bool {
		self.0.is_empty()
	}

	/// Merges these options over the default set carrying `Authorization: Bearer <token>`.
	///
	/// Nested objects merge key by key; colliding leaves combine into a list so neither side is
	/// discarded. The `Authorization` header is the exception: any caller-supplied value (under
	/// any casing) is dropped and the header is rebuilt from `access_token`.
	pub fn authorized(&self, access_token: &TokenSecret) -> Result<Self, RequestError> {
		if let Some(headers) = self.0.get(HEADERS)
			&& !headers.is_object()
		{
			return Err(RequestError::invalid_option(
				HEADERS,
				format!("expected a JSON object, got {}", json_kind(headers)),
			));
		}

		let mut defaults = Map::new();
		let mut default_headers = Map::new();

		default_headers.insert(AUTHORIZATION_HEADER.into(), Value::String(access_token.bearer()));
		defaults.insert(HEADERS.into(), Value::Object(default_headers));

		let mut merged = merge_recursive(defaults, self.0.clone());

		if let Some(Value::Object(headers)) = merged.get_mut(HEADERS) {
			headers.retain(|name, _| !name.eq_ignore_ascii_case(AUTHORIZATION_HEADER));
			headers.insert(AUTHORIZATION_HEADER.into(), Value::String(access_token.bearer()));
		}

		Ok(Self(merged))
	}

	fn push_nested(mut self, section: &str, name: String, value: Value) -> Self {
		let entry = self.0.entry(section).or_insert_with(|| Value::Object(Map::new()));

		if !entry.is_object() {
			*entry = Value::Object(Map::new());
		}
		if let Value::Object(map) = entry {
			let merged = match map.remove(&name) {
				Some(existing) => combine(existing, value),
				None => value,
			};

			map.insert(name, merged);
		}

		self
	}
}
impl From<Map<String, Value>> for RequestOptions {
	fn from(map: Map<String, Value>) -> Self {
		Self(map)
	}
}
impl TryFrom<Value> for RequestOptions {
	type Error = RequestError;

	fn try_from(value: Value) -> Result<Self, Self::Error> {
		Self::from_value(value)
	}
}

/// Recursively merges `overlay` into `base`.
///
/// Objects merge key by key. Any other collision produces a list holding the base values
/// followed by the overlay values.
pub fn merge_recursive(mut base: Map<String, Value>, overlay: Map<String, Value>) -> Map<String, Value> {
	for (key, value) in overlay {
		let merged = match base.remove(&key) {
			Some(existing) => merge_value(existing, value),
			None => value,
		};

		base.insert(key, merged);
	}

	base
}

fn merge_value(base: Value, overlay: Value) -> Value {
	match (base, overlay) {
		(Value::Object(base), Value::Object(overlay)) => Value::Object(merge_recursive(base, overlay)),
		(base, overlay) => combine(base, overlay),
	}
}

fn combine(base: Value, overlay: Value) -> Value {
	let mut items = into_items(base);

	items.extend(into_items(overlay));

	Value::Array(items)
}

fn into_items(value: Value) -> Vec<Value> {
	match value {
		Value::Array(items) => items,
		other => vec![other],
	}
}

pub(crate) fn json_kind(value: &Value) -> &'static str {
	match value {
		Value::Null => "null",
		Value::Bool(_) => "a boolean",
		Value::Number(_) => "a number",
		Value::String(_) => "a string",
		Value::Array(_) => "an array",
		Value::Object(_) => "an object",
	}
}
