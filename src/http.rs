//! Transport primitives for authorized API calls and token exchanges.
//!
//! The module exposes [`RequestExecutor`], the client's only dependency on an HTTP stack,
//! alongside the [`Method`] and [`RestResponse`] values that cross it. With the `reqwest`
//! feature enabled, [`ReqwestExecutor`] implements the trait and also provides the
//! instrumented handles the OAuth exchanger uses to reach token endpoints.

#[cfg(feature = "reqwest")] mod executor;
#[cfg(feature = "reqwest")] mod token;

#[cfg(feature = "reqwest")] pub(crate) use token::*;

// std
#[cfg(feature = "reqwest")] use std::ops::Deref;
// self
use crate::{_prelude::*, options::RequestOptions};

/// Status code that marks the access token as no longer valid.
pub const UNAUTHORIZED: u16 = 401;

/// Boxed future returned by [`RequestExecutor::execute`].
pub type ExecutorFuture<'a> = Pin<Box<dyn Future<Output = Result<RestResponse>> + 'a + Send>>;

/// Performs one HTTP call on behalf of the client.
///
/// Implementations must not retry or inspect the status code; every response, including 4xx
/// and 5xx ones, is a successful execution. Network failures surface as
/// [`Error::Transport`](crate::error::Error::Transport) and are propagated unchanged.
pub trait RequestExecutor
where
	Self: Send + Sync,
{
	/// Executes `method` against `url` with fully merged `options`.
	fn execute<'a>(
		&'a self,
		method: Method,
		url: &'a str,
		options: &'a RequestOptions,
	) -> ExecutorFuture<'a>;
}

/// HTTP verbs accepted by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
	/// `GET`
	Get,
	/// `POST`
	Post,
	/// `PUT`
	Put,
	/// `PATCH`
	Patch,
	/// `DELETE`
	Delete,
	/// `HEAD`
	Head,
	/// `OPTIONS`
	Options,
}
impl Method {
	/// Returns the canonical upper-case verb.
	pub const fn as_str(self) -> &'static str {
		match self {
			Method::Get => "GET",
			Method::Post => "POST",
			Method::Put => "PUT",
			Method::Patch => "PATCH",
			Method::Delete => "DELETE",
			Method::Head => "HEAD",
			Method::Options => "OPTIONS",
		}
	}
}
impl Display for Method {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
impl FromStr for Method {
	type Err = UnknownMethod;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let method = match s.to_ascii_uppercase().as_str() {
			"GET" => Method::Get,
			"POST" => Method::Post,
			"PUT" => Method::Put,
			"PATCH" => Method::Patch,
			"DELETE" => Method::Delete,
			"HEAD" => Method::Head,
			"OPTIONS" => Method::Options,
			_ => return Err(UnknownMethod(s.to_owned())),
		};

		Ok(method)
	}
}

/// Error returned when parsing an unsupported HTTP verb.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("HTTP method `{0}` is not supported.")]
pub struct UnknownMethod(pub String);

/// Response returned by a [`RequestExecutor`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RestResponse {
	/// HTTP status code.
	pub status: u16,
	/// Response headers keyed by lower-case name; repeated headers keep every value.
	pub headers: BTreeMap<String, Vec<String>>,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl RestResponse {
	/// Creates a response with the given status and no headers or body.
	pub fn new(status: u16) -> Self {
		Self { status, headers: BTreeMap::new(), body: Vec::new() }
	}

	/// Appends a header value.
	pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
		self.headers.entry(name.as_ref().to_ascii_lowercase()).or_default().push(value.into());

		self
	}

	/// Replaces the body.
	pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
		self.body = body.into();

		self
	}

	/// Returns `true` when the status signals an expired or invalid access token.
	///
	/// Only 401 qualifies. 403 and provider-specific session codes are returned to the caller.
	pub fn is_unauthorized(&self) -> bool {
		self.status == UNAUTHORIZED
	}

	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	/// Returns the first value of a header, matching the name case-insensitively.
	pub fn header(&self, name: &str) -> Option<&str> {
		self.headers.get(&name.to_ascii_lowercase())?.first().map(String::as_str)
	}

	/// Returns the body decoded as UTF-8, replacing invalid sequences.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}
}

/// Thin wrapper around [`ReqwestClient`] so shared HTTP behavior lives in one place.
///
/// The same wrapper serves API calls (through [`RequestExecutor`]) and token exchanges
/// (through the `oauth2` handles). Token endpoints return results directly, so the client
/// handed to an exchanger should not follow redirects.
#[cfg(feature = "reqwest")]
#[derive(Clone, Debug, Default)]
pub struct ReqwestExecutor(pub ReqwestClient);
#[cfg(feature = "reqwest")]
impl ReqwestExecutor {
	/// Wraps an existing reqwest [`ReqwestClient`].
	pub fn with_client(client: ReqwestClient) -> Self {
		Self(client)
	}

	/// Builds a client that never follows redirects, suitable for token endpoints.
	pub fn without_redirects() -> Result<Self> {
		let client = ReqwestClient::builder()
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.map_err(crate::error::ConfigError::from)?;

		Ok(Self(client))
	}
}
#[cfg(feature = "reqwest")]
impl AsRef<ReqwestClient> for ReqwestExecutor {
	fn as_ref(&self) -> &ReqwestClient {
		&self.0
	}
}
#[cfg(feature = "reqwest")]
impl Deref for ReqwestExecutor {
	type Target = ReqwestClient;

	fn deref(&self) -> &Self::Target {
		&self.0
	}
}
