//! Client-level error types shared across requests, exchangers, notifiers, and stores.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Every permitted attempt came back unauthorized.
	#[error("Max retry limit of {max_attempts} has been reached. OAuth token refresh failed.")]
	RetryLimitExceeded {
		/// Configured attempt budget that was exhausted.
		max_attempts: u32,
	},

	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Credential value violates its invariants.
	#[error(transparent)]
	Credential(#[from] crate::auth::CredentialError),
	/// Request options or URL could not be turned into an HTTP request.
	#[error(transparent)]
	Request(#[from] RequestError),
	/// Transport failure (DNS, TCP, TLS).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Credential exchange failed.
	#[error(transparent)]
	Exchange(#[from] ExchangeError),
	/// Refresh notifier rejected the new credential.
	#[error(transparent)]
	Notify(#[from] crate::notify::NotifyError),
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
}

/// Configuration and validation failures raised while assembling clients and exchangers.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// The attempt budget must allow at least one request.
	#[error("The max_retry_attempts value must be at least 1, got {attempts}.")]
	InvalidRetryAttempts {
		/// Rejected attempt budget.
		attempts: u32,
	},
	/// API version segment is empty.
	#[error("API version segment cannot be empty.")]
	MissingApiVersion,
	/// Token endpoint must use HTTPS.
	#[error("The token endpoint must use HTTPS: {url}.")]
	InsecureEndpoint {
		/// Endpoint URL that failed validation.
		url: String,
	},
	/// Confidential client authentication was requested without a secret.
	#[error("Client authentication method `{method}` requires a client secret.")]
	MissingClientSecret {
		/// Client authentication method label.
		method: &'static str,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures raised while turning a URL and options into an outbound request.
#[derive(Debug, ThisError)]
pub enum RequestError {
	/// Request URL cannot be parsed.
	#[error("Request URL `{url}` is invalid.")]
	InvalidUrl {
		/// URL that failed to parse.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Options contain a key the executor does not understand.
	#[error("Request option `{key}` is not supported.")]
	UnsupportedOption {
		/// Unknown option key.
		key: String,
	},
	/// Options contain a supported key with an unusable value.
	#[error("Request option `{key}` is invalid: {reason}.")]
	InvalidOption {
		/// Offending option key.
		key: String,
		/// Why the value was rejected.
		reason: String,
	},
	/// JSON request body could not be serialized.
	#[error("Request JSON body could not be serialized.")]
	JsonBody(#[from] serde_json::Error),
}
impl RequestError {
	pub(crate) fn invalid_option(key: impl Into<String>, reason: impl Into<String>) -> Self {
		Self::InvalidOption { key: key.into(), reason: reason.into() }
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the remote API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the remote API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Failures raised by credential exchangers.
#[derive(Debug, ThisError)]
pub enum ExchangeError {
	/// Provider rejected the grant (e.g., expired or revoked refresh token).
	#[error("Provider rejected the grant: {reason}.")]
	InvalidGrant {
		/// Provider- or client-supplied reason string.
		reason: String,
	},
	/// Client authentication failed or credentials are malformed.
	#[error("Client authentication failed: {reason}.")]
	InvalidClient {
		/// Provider- or client-supplied reason string.
		reason: String,
	},
	/// Required grant parameter is missing.
	#[error("The {grant} grant requires the `{name}` parameter.")]
	MissingParameter {
		/// Grant label.
		grant: &'static str,
		/// Missing parameter name.
		name: &'static str,
	},
	/// Grant parameter is present but unusable.
	#[error("Grant parameter `{name}` is invalid: {reason}.")]
	InvalidParameter {
		/// Offending parameter name.
		name: &'static str,
		/// Why the value was rejected.
		reason: String,
	},
	/// Token endpoint response omitted `instance_url`.
	#[error("Token endpoint response is missing instance_url.")]
	MissingInstanceUrl,
	/// Token endpoint response omitted the refresh token and none could be carried over.
	#[error("Token endpoint response is missing a refresh token.")]
	MissingRefreshToken,
	/// Token endpoint returned an unexpected but non-fatal response.
	#[error("Token endpoint returned an unexpected response: {message}.")]
	TokenEndpoint {
		/// Provider- or client-supplied message summarizing the failure.
		message: String,
		/// HTTP status code, when available.
		status: Option<u16>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// Token endpoint responded with malformed JSON that could not be parsed.
	#[error("Token endpoint returned malformed JSON.")]
	ResponseParse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::error::Error>,
		/// HTTP status code, when available.
		status: Option<u16>,
	},
	/// Token endpoint returned a credential that violates its invariants.
	#[error("Token endpoint returned an invalid credential.")]
	InvalidCredential(#[from] crate::auth::CredentialError),
	/// Transport failure while calling the token endpoint.
	#[error("Transport failure while calling the token endpoint.")]
	Transport(#[source] TransportError),
}
