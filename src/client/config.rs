//! Immutable client configuration and its validating builder.

// self
use crate::{_prelude::*, error::ConfigError};

/// Attempt budget used when the builder is not told otherwise.
pub const DEFAULT_MAX_RETRY_ATTEMPTS: u32 = 2;

/// Settings fixed for the lifetime of a [`RestClient`](crate::client::RestClient).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ClientConfigBuilder", into = "ClientConfigBuilder")]
pub struct ClientConfig {
	resource_owner_url: String,
	api_version: String,
	max_retry_attempts: u32,
}
impl ClientConfig {
	/// Starts a builder; `api_version` is the path segment such as `v59.0`.
	pub fn builder(
		resource_owner_url: impl Into<String>,
		api_version: impl Into<String>,
	) -> ClientConfigBuilder {
		ClientConfigBuilder {
			resource_owner_url: resource_owner_url.into(),
			api_version: api_version.into(),
			max_retry_attempts: DEFAULT_MAX_RETRY_ATTEMPTS,
		}
	}

	/// Resource owner URL supplied at construction, returned as given.
	pub fn resource_owner_url(&self) -> &str {
		&self.resource_owner_url
	}

	/// Versioned API segment inserted into relative URLs.
	pub fn api_version(&self) -> &str {
		&self.api_version
	}

	/// Total executions allowed per request, the first one included.
	pub fn max_retry_attempts(&self) -> u32 {
		self.max_retry_attempts
	}
}

/// Builder for [`ClientConfig`]; also the serialized shape of the config.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClientConfigBuilder {
	resource_owner_url: String,
	api_version: String,
	#[serde(default = "default_max_retry_attempts")]
	max_retry_attempts: u32,
}
impl ClientConfigBuilder {
	/// Overrides the attempt budget (must be at least 1).
	pub fn max_retry_attempts(mut self, attempts: u32) -> Self {
		self.max_retry_attempts = attempts;

		self
	}

	/// Validates and freezes the configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		if self.max_retry_attempts == 0 {
			return Err(ConfigError::InvalidRetryAttempts { attempts: self.max_retry_attempts });
		}
		if self.api_version.trim().is_empty() {
			return Err(ConfigError::MissingApiVersion);
		}

		Ok(ClientConfig {
			resource_owner_url: self.resource_owner_url,
			api_version: self.api_version,
			max_retry_attempts: self.max_retry_attempts,
		})
	}
}
impl TryFrom<ClientConfigBuilder> for ClientConfig {
	type Error = ConfigError;

	fn try_from(builder: ClientConfigBuilder) -> Result<Self, Self::Error> {
		builder.build()
	}
}
impl From<ClientConfig> for ClientConfigBuilder {
	fn from(config: ClientConfig) -> Self {
		Self {
			resource_owner_url: config.resource_owner_url,
			api_version: config.api_version,
			max_retry_attempts: config.max_retry_attempts,
		}
	}
}

fn default_max_retry_attempts() -> u32 {
	DEFAULT_MAX_RETRY_ATTEMPTS
}
