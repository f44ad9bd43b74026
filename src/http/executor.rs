//! [`RequestExecutor`] implementation for the reqwest transport.

// std
use std::time::Duration as StdDuration;
// crates.io
use reqwest::{
	RequestBuilder,
	header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue},
};
// self
use crate::{
	_prelude::*,
	error::{RequestError, TransportError},
	http::{ExecutorFuture, Method, ReqwestExecutor, RequestExecutor, RestResponse},
	options::{self, RequestOptions},
};

impl RequestExecutor for ReqwestExecutor {
	fn execute<'a>(
		&'a self,
		method: Method,
		url: &'a str,
		options: &'a RequestOptions,
	) -> ExecutorFuture<'a> {
		Box::pin(async move {
			let builder = build_request(&self.0, method, url, options)?;
			let response = builder.send().await.map_err(TransportError::from)?;
			let status = response.status().as_u16();
			let headers = collect_headers(response.headers());
			let body = response.bytes().await.map_err(TransportError::from)?.to_vec();

			Ok(RestResponse { status, headers, body })
		})
	}
}

fn build_request(
	client: &ReqwestClient,
	method: Method,
	url: &str,
	options: &RequestOptions,
) -> Result<RequestBuilder, RequestError> {
	for (key, _) in options.iter() {
		if ![options::HEADERS, options::QUERY, options::JSON, options::BODY, options::TIMEOUT]
			.contains(&key.as_str())
		{
			return Err(RequestError::UnsupportedOption { key: key.clone() });
		}
	}

	let mut url = Url::parse(url)
		.map_err(|source| RequestError::InvalidUrl { url: url.to_owned(), source })?;

	if let Some(query) = options.get(options::QUERY) {
		apply_query(&mut url, query)?;
	}

	let mut builder = client.request(reqwest_method(method), url);
	let mut has_content_type = false;

	if let Some(headers) = options.get(options::HEADERS) {
		let map = header_map(headers)?;

		has_content_type = map.contains_key(CONTENT_TYPE);
		builder = builder.headers(map);
	}

	match (options.get(options::JSON), options.get(options::BODY)) {
		(Some(_), Some(_)) =>
			return Err(RequestError::invalid_option(options::BODY, "cannot be combined with json")),
		(Some(json), None) => {
			let payload = serde_json::to_vec(json)?;

			if !has_content_type {
				builder = builder.header(CONTENT_TYPE, "application/json");
			}

			builder = builder.body(payload);
		},
		(None, Some(Value::String(body))) => builder = builder.body(body.clone()),
		(None, Some(other)) =>
			return Err(RequestError::invalid_option(
				options::BODY,
				format!("expected a string, got {}", options::json_kind(other)),
			)),
		(None, None) => {},
	}

	if let Some(timeout) = options.get(options::TIMEOUT) {
		builder = builder.timeout(timeout_from(timeout)?);
	}

	Ok(builder)
}

fn reqwest_method(method: Method) -> reqwest::Method {
	match method {
		Method::Get => reqwest::Method::GET,
		Method::Post => reqwest::Method::POST,
		Method::Put => reqwest::Method::PUT,
		Method::Patch => reqwest::Method::PATCH,
		Method::Delete => reqwest::Method::DELETE,
		Method::Head => reqwest::Method::HEAD,
		Method::Options => reqwest::Method::OPTIONS,
	}
}

fn header_map(headers: &Value) -> Result<HeaderMap, RequestError> {
	let Value::Object(entries) = headers else {
		return Err(RequestError::invalid_option(
			options::HEADERS,
			format!("expected a JSON object, got {}", options::json_kind(headers)),
		));
	};
	let mut map = HeaderMap::new();

	for (name, value) in entries {
		let header = HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
			RequestError::invalid_option(options::HEADERS, format!("`{name}` is not a valid header name"))
		})?;

		for text in scalar_values(options::HEADERS, name, value)? {
			let value = HeaderValue::from_str(&text).map_err(|_| {
				RequestError::invalid_option(
					options::HEADERS,
					format!("`{name}` carries a value that is not a valid header value"),
				)
			})?;

			map.append(header.clone(), value);
		}
	}

	Ok(map)
}

fn apply_query(url: &mut Url, query: &Value) -> Result<(), RequestError> {
	let Value::Object(entries) = query else {
		return Err(RequestError::invalid_option(
			options::QUERY,
			format!("expected a JSON object, got {}", options::json_kind(query)),
		));
	};
	let mut pairs = Vec::new();

	for (name, value) in entries {
		for text in scalar_values(options::QUERY, name, value)? {
			pairs.push((name.as_str(), text));
		}
	}

	if !pairs.is_empty() {
		let mut serializer = url.query_pairs_mut();

		for (name, value) in pairs {
			serializer.append_pair(name, &value);
		}
	}

	Ok(())
}

fn scalar_values(section: &str, name: &str, value: &Value) -> Result<Vec<String>, RequestError> {
	match value {
		Value::Array(items) => items.iter().map(|item| scalar_text(section, name, item)).collect(),
		other => Ok(vec![scalar_text(section, name, other)?]),
	}
}

fn scalar_text(section: &str, name: &str, value: &Value) -> Result<String, RequestError> {
	match value {
		Value::String(text) => Ok(text.clone()),
		Value::Number(number) => Ok(number.to_string()),
		Value::Bool(flag) => Ok(flag.to_string()),
		other => Err(RequestError::invalid_option(
			section,
			format!("`{name}` must be a string, number, or boolean, got {}", options::json_kind(other)),
		)),
	}
}

fn timeout_from(value: &Value) -> Result<StdDuration, RequestError> {
	value
		.as_f64()
		.filter(|secs| secs.is_finite() && *secs > 0.0)
		.and_then(|secs| StdDuration::try_from_secs_f64(secs).ok())
		.ok_or_else(|| {
			RequestError::invalid_option(options::TIMEOUT, "expected a positive, representable number of seconds")
		})
}

fn collect_headers(headers: &HeaderMap) -> BTreeMap<String, Vec<String>> {
	let mut collected = BTreeMap::<String, Vec<String>>::new();

	for (name, value) in headers {
		if let Ok(text) = value.to_str() {
			collected.entry(name.as_str().to_owned()).or_default().push(text.to_owned());
		}
	}

	collected
}
