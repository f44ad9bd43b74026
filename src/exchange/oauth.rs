//! `oauth2`-backed [`CredentialExchanger`] for Salesforce-style token endpoints.
//!
//! Token responses from these endpoints carry the instance the tokens belong to
//! (`instance_url`), an identity URL (`id`), and an `issued_at` timestamp in epoch
//! milliseconds. Refresh responses usually omit `refresh_token`; the presented one is carried
//! into the new credential in that case.

// std
use std::borrow::Cow;
// crates.io
use oauth2::{
	AuthType, AuthorizationCode, ClientId, ClientSecret, EndpointNotSet, EndpointSet,
	ExtraTokenFields, HttpClientError, PkceCodeVerifier, RedirectUrl, RefreshToken,
	RequestTokenError, ResourceOwnerPassword, ResourceOwnerUsername, StandardRevocableToken,
	StandardTokenResponse, TokenResponse, TokenUrl,
	basic::{
		BasicErrorResponse, BasicRevocationErrorResponse, BasicTokenIntrospectionResponse,
		BasicTokenType,
	},
};
// self
use crate::{
	_prelude::*,
	auth::Credential,
	error::{ConfigError, ExchangeError, TransportError},
	exchange::{
		CODE_PARAM, CODE_VERIFIER_PARAM, CredentialExchanger, ExchangeFuture, GrantType,
		PASSWORD_PARAM, REDIRECT_URI_PARAM, REFRESH_TOKEN_PARAM, USERNAME_PARAM,
	},
	http::{ReqwestExecutor, ResponseMetadata, ResponseMetadataSlot},
};

type InstanceTokenResponse = StandardTokenResponse<InstanceTokenFields, BasicTokenType>;
type InstanceClient = oauth2::Client<
	BasicErrorResponse,
	InstanceTokenResponse,
	BasicTokenIntrospectionResponse,
	StandardRevocableToken,
	BasicRevocationErrorResponse,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointNotSet,
	EndpointSet,
>;
type InstanceRequestError = RequestTokenError<HttpClientError<ReqwestError>, BasicErrorResponse>;

/// Client authentication modes for token endpoint calls.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClientAuthMethod {
	#[default]
	/// HTTP Basic with `client_id`/`client_secret`.
	ClientSecretBasic,
	/// Form POST body parameters for `client_id`/`client_secret`.
	ClientSecretPost,
	/// Public clients that only send `client_id`.
	None,
}
impl ClientAuthMethod {
	/// Returns the RFC 7591 label for the method.
	pub const fn as_str(self) -> &'static str {
		match self {
			ClientAuthMethod::ClientSecretBasic => "client_secret_basic",
			ClientAuthMethod::ClientSecretPost => "client_secret_post",
			ClientAuthMethod::None => "none",
		}
	}

	const fn requires_secret(self) -> bool {
		!matches!(self, ClientAuthMethod::None)
	}
}

/// Token endpoint settings consumed by [`OAuth2Exchanger`].
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangerConfig {
	/// Token endpoint receiving every grant.
	pub token_endpoint: Url,
	/// OAuth 2.0 client identifier (the connected app's consumer key).
	pub client_id: String,
	/// Client secret for confidential authentication methods.
	#[serde(default)]
	pub client_secret: Option<String>,
	/// How the client authenticates against the token endpoint.
	#[serde(default)]
	pub client_auth: ClientAuthMethod,
	/// Permits plain-HTTP token endpoints (local mocks only).
	#[serde(default)]
	pub allow_insecure_endpoint: bool,
}
impl ExchangerConfig {
	/// Creates a builder for the given endpoint and client identifier.
	pub fn builder(token_endpoint: Url, client_id: impl Into<String>) -> ExchangerConfigBuilder {
		ExchangerConfigBuilder {
			config: ExchangerConfig {
				token_endpoint,
				client_id: client_id.into(),
				client_secret: None,
				client_auth: ClientAuthMethod::default(),
				allow_insecure_endpoint: false,
			},
		}
	}

	/// Validates the endpoint scheme and secret requirements.
	pub fn validate(&self) -> Result<(), ConfigError> {
		if self.token_endpoint.scheme() != "https" && !self.allow_insecure_endpoint {
			return Err(ConfigError::InsecureEndpoint { url: self.token_endpoint.to_string() });
		}
		if self.client_auth.requires_secret() && self.client_secret.is_none() {
			return Err(ConfigError::MissingClientSecret { method: self.client_auth.as_str() });
		}

		Ok(())
	}
}
impl Debug for ExchangerConfig {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ExchangerConfig")
			.field("token_endpoint", &self.token_endpoint.as_str())
			.field("client_id", &self.client_id)
			.field("client_secret_set", &self.client_secret.is_some())
			.field("client_auth", &self.client_auth)
			.field("allow_insecure_endpoint", &self.allow_insecure_endpoint)
			.finish()
	}
}

/// Builder for [`ExchangerConfig`].
#[derive(Debug)]
pub struct ExchangerConfigBuilder {
	config: ExchangerConfig,
}
impl ExchangerConfigBuilder {
	/// Sets the client secret.
	pub fn client_secret(mut self, secret: impl Into<String>) -> Self {
		self.config.client_secret = Some(secret.into());

		self
	}

	/// Overrides the client authentication method.
	pub fn client_auth(mut self, method: ClientAuthMethod) -> Self {
		self.config.client_auth = method;

		self
	}

	/// Permits a plain-HTTP token endpoint.
	pub fn allow_insecure_endpoint(mut self) -> Self {
		self.config.allow_insecure_endpoint = true;

		self
	}

	/// Consumes the builder and validates the resulting config.
	pub fn build(self) -> Result<ExchangerConfig, ConfigError> {
		self.config.validate()?;

		Ok(self.config)
	}
}

/// Fields returned next to the standard OAuth token response.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub(crate) struct InstanceTokenFields {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	instance_url: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	issued_at: Option<String>,
}
impl ExtraTokenFields for InstanceTokenFields {}

/// Exchanges grants against an OAuth 2.0 token endpoint through the reqwest transport.
#[derive(Clone)]
pub struct OAuth2Exchanger {
	config: ExchangerConfig,
	oauth_client: InstanceClient,
	http_client: ReqwestExecutor,
}
impl OAuth2Exchanger {
	/// Creates an exchanger with its own redirect-free reqwest client.
	pub fn new(config: ExchangerConfig) -> Result<Self> {
		Self::with_executor(config, ReqwestExecutor::without_redirects()?)
	}

	/// Creates an exchanger that reuses the caller-provided transport.
	pub fn with_executor(config: ExchangerConfig, http_client: ReqwestExecutor) -> Result<Self> {
		config.validate()?;

		let oauth_client = oauth_client(&config);

		Ok(Self { config, oauth_client, http_client })
	}

	/// Returns the validated configuration.
	pub fn config(&self) -> &ExchangerConfig {
		&self.config
	}

	async fn request_token(
		&self,
		grant: GrantType,
		params: &BTreeMap<String, String>,
	) -> Result<InstanceTokenResponse> {
		let meta = ResponseMetadataSlot::default();
		let handle = self.http_client.instrumented(meta.clone());
		let response = match grant {
			GrantType::RefreshToken => {
				let token = RefreshToken::new(required(params, grant, REFRESH_TOKEN_PARAM)?.to_owned());
				let mut request = self.oauth_client.exchange_refresh_token(&token);

				for (key, value) in extra_params(params, &[REFRESH_TOKEN_PARAM]) {
					request = request.add_extra_param(key, value);
				}

				request.request_async(&handle).await
			},
			GrantType::Password => {
				let username =
					ResourceOwnerUsername::new(required(params, grant, USERNAME_PARAM)?.to_owned());
				let password =
					ResourceOwnerPassword::new(required(params, grant, PASSWORD_PARAM)?.to_owned());
				let mut request = self.oauth_client.exchange_password(&username, &password);

				for (key, value) in extra_params(params, &[USERNAME_PARAM, PASSWORD_PARAM]) {
					request = request.add_extra_param(key, value);
				}

				request.request_async(&handle).await
			},
			GrantType::AuthorizationCode => {
				let code = AuthorizationCode::new(required(params, grant, CODE_PARAM)?.to_owned());
				let mut request = self.oauth_client.exchange_code(code);

				if let Some(uri) = params.get(REDIRECT_URI_PARAM) {
					let redirect = RedirectUrl::new(uri.to_owned()).map_err(|e| {
						ExchangeError::InvalidParameter { name: REDIRECT_URI_PARAM, reason: e.to_string() }
					})?;

					request = request.set_redirect_uri(Cow::Owned(redirect));
				}
				if let Some(verifier) = params.get(CODE_VERIFIER_PARAM) {
					request = request.set_pkce_verifier(PkceCodeVerifier::new(verifier.to_owned()));
				}

				for (key, value) in
					extra_params(params, &[CODE_PARAM, REDIRECT_URI_PARAM, CODE_VERIFIER_PARAM])
				{
					request = request.add_extra_param(key, value);
				}

				request.request_async(&handle).await
			},
		};

		response.map_err(|err| map_request_error(meta.take(), err).into())
	}
}
impl CredentialExchanger for OAuth2Exchanger {
	fn exchange<'a>(&'a self, grant: GrantType, params: &'a BTreeMap<String, String>) -> ExchangeFuture<'a> {
		Box::pin(async move {
			let response = self.request_token(grant, params).await?;

			map_token_response(grant, params, response).map_err(Error::from)
		})
	}
}
impl Debug for OAuth2Exchanger {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("OAuth2Exchanger").field("config", &self.config).finish()
	}
}

fn oauth_client(config: &ExchangerConfig) -> InstanceClient {
	let mut client: InstanceClient = oauth2::Client::new(ClientId::new(config.client_id.clone()))
		.set_token_uri(TokenUrl::from_url(config.token_endpoint.clone()));

	if config.client_auth.requires_secret()
		&& let Some(secret) = &config.client_secret
	{
		client = client.set_client_secret(ClientSecret::new(secret.clone()));
	}
	if matches!(config.client_auth, ClientAuthMethod::ClientSecretPost) {
		client = client.set_auth_type(AuthType::RequestBody);
	}

	client
}

fn required<'a>(
	params: &'a BTreeMap<String, String>,
	grant: GrantType,
	name: &'static str,
) -> Result<&'a str, ExchangeError> {
	params
		.get(name)
		.map(String::as_str)
		.filter(|value| !value.trim().is_empty())
		.ok_or(ExchangeError::MissingParameter { grant: grant.as_str(), name })
}

fn extra_params<'a>(
	params: &'a BTreeMap<String, String>,
	reserved: &'a [&'static str],
) -> impl Iterator<Item = (&'a String, &'a String)> {
	params.iter().filter(move |(key, _)| !reserved.contains(&key.as_str()) && key.as_str() != "grant_type")
}

fn map_token_response(
	grant: GrantType,
	params: &BTreeMap<String, String>,
	response: InstanceTokenResponse,
) -> Result<Credential, ExchangeError> {
	let fields = response.extra_fields();
	let instance_url = fields
		.instance_url
		.clone()
		.filter(|url| !url.trim().is_empty())
		.ok_or(ExchangeError::MissingInstanceUrl)?;
	let refresh_token = match response.refresh_token() {
		Some(token) => token.secret().to_owned(),
		None if grant == GrantType::RefreshToken =>
			params.get(REFRESH_TOKEN_PARAM).cloned().ok_or(ExchangeError::MissingRefreshToken)?,
		None => return Err(ExchangeError::MissingRefreshToken),
	};
	let mut credential =
		Credential::new(response.access_token().secret().to_owned(), refresh_token, instance_url)?;

	if let Some(id) = &fields.id {
		credential = credential.with_id(id.clone());
	}
	if let Some(issued_at) = fields.issued_at.as_deref().and_then(parse_issued_at) {
		credential = credential.with_issued_at(issued_at);
	}

	Ok(credential)
}

fn parse_issued_at(raw: &str) -> Option<OffsetDateTime> {
	let millis = raw.trim().parse::<i128>().ok()?;

	OffsetDateTime::from_unix_timestamp_nanos(millis.checked_mul(1_000_000)?).ok()
}

fn map_request_error(meta: Option<ResponseMetadata>, err: InstanceRequestError) -> ExchangeError {
	let status = meta.as_ref().and_then(|value| value.status);
	let retry_after = meta.as_ref().and_then(|value| value.retry_after);

	match err {
		RequestTokenError::ServerResponse(response) =>
			map_server_response_error(&response, status, retry_after),
		RequestTokenError::Request(error) => map_transport_error(error, status, retry_after),
		RequestTokenError::Parse(source, _body) => ExchangeError::ResponseParse { source, status },
		RequestTokenError::Other(message) =>
			ExchangeError::TokenEndpoint { message, status, retry_after },
	}
}

fn map_server_response_error(
	response: &BasicErrorResponse,
	status: Option<u16>,
	retry_after: Option<Duration>,
) -> ExchangeError {
	let code = response.error().as_ref();
	let reason = response.error_description().cloned().unwrap_or_else(|| code.to_owned());

	match code {
		"invalid_grant" => ExchangeError::InvalidGrant { reason },
		"unauthorized_client" => ExchangeError::InvalidClient { reason },
		code if code.starts_with("invalid_client") => ExchangeError::InvalidClient { reason },
		code => ExchangeError::TokenEndpoint {
			message: format!("OAuth error `{code}`: {reason}"),
			status,
			retry_after,
		},
	}
}

fn map_transport_error(
	err: HttpClientError<ReqwestError>,
	status: Option<u16>,
	retry_after: Option<Duration>,
) -> ExchangeError {
	match err {
		HttpClientError::Reqwest(inner) => ExchangeError::Transport(TransportError::from(*inner)),
		HttpClientError::Io(inner) => ExchangeError::Transport(TransportError::Io(inner)),
		HttpClientError::Http(inner) => ExchangeError::Transport(TransportError::network(inner)),
		HttpClientError::Other(message) => ExchangeError::TokenEndpoint {
			message: format!("HTTP client error occurred while calling the token endpoint: {message}"),
			status,
			retry_after,
		},
		_ => ExchangeError::TokenEndpoint {
			message: "HTTP client error occurred while calling the token endpoint".into(),
			status,
			retry_after,
		},
	}
}
