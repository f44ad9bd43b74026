//! Authorized request client with bounded credential-refresh retries.
//!
//! [`RestClient::request`] resolves the endpoint against the current instance, injects a
//! fresh bearer header, and hands the call to its [`RequestExecutor`]. A `401` response
//! triggers a refresh through the [`CredentialExchanger`] (announced to the optional
//! [`RefreshNotifier`] first) followed by another attempt, until the configured budget is
//! spent. Any other status, success or not, is returned as is.
//!
//! The client takes `&mut self` for every request, so one instance serves one caller at a
//! time. Wrap it in [`SharedRestClient`] to share it across tasks.

mod config;
mod metrics;
mod refresh;
mod shared;

pub use config::*;
pub use metrics::RetryMetrics;
pub use shared::SharedRestClient;

// self
use crate::{
	_prelude::*,
	auth::Credential,
	exchange::CredentialExchanger,
	http::{Method, RequestExecutor, RestResponse},
	notify::RefreshNotifier,
	obs::{self, OpSpan, Outcome, Stage},
	options::RequestOptions,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestExecutor;

/// Path prefix inserted between the instance URL and the API version.
pub const DATA_PATH: &str = "/services/data/";

/// Bearer-authorized client that refreshes its credential when the API answers `401`.
pub struct RestClient {
	config: ClientConfig,
	credential: Credential,
	executor: Arc<dyn RequestExecutor>,
	exchanger: Arc<dyn CredentialExchanger>,
	notifier: Option<Arc<dyn RefreshNotifier>>,
	metrics: Arc<RetryMetrics>,
}
impl RestClient {
	/// Creates a client over caller-provided transport and exchanger.
	pub fn with_executor(
		config: ClientConfig,
		credential: Credential,
		executor: Arc<dyn RequestExecutor>,
		exchanger: Arc<dyn CredentialExchanger>,
	) -> Self {
		Self {
			config,
			credential,
			executor,
			exchanger,
			notifier: None,
			metrics: Default::default(),
		}
	}

	/// Attaches the observer that sees every refreshed credential before it is adopted.
	pub fn with_notifier(mut self, notifier: Arc<dyn RefreshNotifier>) -> Self {
		self.notifier = Some(notifier);

		self
	}

	/// Resource owner URL supplied at construction, returned as given.
	pub fn resource_owner_url(&self) -> &str {
		self.config.resource_owner_url()
	}

	/// Credential used by the next attempt.
	pub fn credential(&self) -> &Credential {
		&self.credential
	}

	/// Configuration fixed at construction.
	pub fn config(&self) -> &ClientConfig {
		&self.config
	}

	/// Execution and refresh counters for this client.
	pub fn metrics(&self) -> &RetryMetrics {
		&self.metrics
	}

	/// Resolves `endpoint` against the current instance.
	///
	/// Absolute `http://` and `https://` endpoints pass through untouched; anything else is
	/// appended to `<instance_url>/services/data/<api_version>/` without normalization.
	pub fn construct_url(&self, endpoint: &str) -> String {
		if endpoint.starts_with("http://") || endpoint.starts_with("https://") {
			return endpoint.to_owned();
		}

		format!(
			"{}{DATA_PATH}{}/{endpoint}",
			self.credential.instance_url(),
			self.config.api_version()
		)
	}

	/// Sends a request, refreshing the credential and retrying while the API answers `401`.
	///
	/// Returns the first non-`401` response. Fails with
	/// [`Error::RetryLimitExceeded`] once `max_retry_attempts` executions were all
	/// unauthorized; transport, exchange, and notifier failures abort immediately.
	pub async fn request(
		&mut self,
		method: Method,
		endpoint: &str,
		options: RequestOptions,
	) -> Result<RestResponse> {
		const STAGE: Stage = Stage::Request;

		let span = OpSpan::new(STAGE, method.as_str());

		obs::record_outcome(STAGE, Outcome::Attempt);

		let result = span.instrument(self.run_attempts(method, endpoint, &options)).await;

		match &result {
			Ok(_) => obs::record_outcome(STAGE, Outcome::Success),
			Err(_) => {
				self.metrics.record_failure();
				obs::record_outcome(STAGE, Outcome::Failure);
			},
		}

		result
	}

	/// Shorthand for a `GET` without options.
	pub async fn get(&mut self, endpoint: &str) -> Result<RestResponse> {
		self.request(Method::Get, endpoint, RequestOptions::new()).await
	}

	/// Shorthand for a `POST` with a JSON body.
	pub async fn post_json(&mut self, endpoint: &str, body: Value) -> Result<RestResponse> {
		self.request(Method::Post, endpoint, RequestOptions::new().json(body)).await
	}

	/// Shorthand for a `PATCH` with a JSON body.
	pub async fn patch_json(&mut self, endpoint: &str, body: Value) -> Result<RestResponse> {
		self.request(Method::Patch, endpoint, RequestOptions::new().json(body)).await
	}

	/// Shorthand for a `DELETE` without options.
	pub async fn delete(&mut self, endpoint: &str) -> Result<RestResponse> {
		self.request(Method::Delete, endpoint, RequestOptions::new()).await
	}

	async fn run_attempts(
		&mut self,
		method: Method,
		endpoint: &str,
		options: &RequestOptions,
	) -> Result<RestResponse> {
		let max_attempts = self.config.max_retry_attempts();
		let mut attempts = 0;

		loop {
			// Rebuilt every pass: a refresh may move the instance and always rotates the token.
			let url = self.construct_url(endpoint);
			let merged = options.authorized(self.credential.access_token())?;
			let response = self.executor.execute(method, &url, &merged).await?;

			attempts += 1;
			self.metrics.record_execution();

			if !response.is_unauthorized() {
				return Ok(response);
			}

			self.metrics.record_unauthorized();
			obs::record_outcome(Stage::Request, Outcome::Unauthorized);
			obs::trace_unauthorized(attempts, max_attempts);

			if attempts >= max_attempts {
				obs::trace_retry_exhausted(max_attempts);

				return Err(Error::RetryLimitExceeded { max_attempts });
			}

			self.refresh_credential().await?;
		}
	}
}
#[cfg(feature = "reqwest")]
impl RestClient {
	/// Creates a client that talks through a default [`ReqwestExecutor`].
	pub fn new(
		config: ClientConfig,
		credential: Credential,
		exchanger: Arc<dyn CredentialExchanger>,
	) -> Self {
		Self::with_executor(config, credential, Arc::new(ReqwestExecutor::default()), exchanger)
	}
}
impl Debug for RestClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RestClient")
			.field("config", &self.config)
			.field("credential", &self.credential)
			.field("has_notifier", &self.notifier.is_some())
			.field("metrics", &self.metrics)
			.finish()
	}
}

#[cfg(test)]
pub(crate) mod tests {
	// std
	use std::collections::VecDeque;
	// self
	use super::*;
	use crate::{
		error::{ExchangeError, TransportError},
		exchange::{ExchangeFuture, GrantType, REFRESH_TOKEN_PARAM},
		http::ExecutorFuture,
		notify::{self, NotifyError},
		options::AUTHORIZATION_HEADER,
	};

	pub(crate) const INSTANCE: &str = "https://na1.example.com";

	/// One recorded executor call.
	#[derive(Clone, Debug)]
	pub(crate) struct Call {
		pub(crate) method: Method,
		pub(crate) url: String,
		pub(crate) options: RequestOptions,
	}

	/// Executor that replays scripted statuses and records what it was asked to send.
	#[derive(Default)]
	pub(crate) struct ScriptedExecutor {
		statuses: Mutex<VecDeque<u16>>,
		pub(crate) calls: Mutex<Vec<Call>>,
		fail_with_transport: bool,
	}
	impl ScriptedExecutor {
		pub(crate) fn new(statuses: impl IntoIterator<Item = u16>) -> Arc<Self> {
			Arc::new(Self { statuses: Mutex::new(statuses.into_iter().collect()), ..Default::default() })
		}

		fn failing() -> Arc<Self> {
			Arc::new(Self { fail_with_transport: true, ..Default::default() })
		}

		pub(crate) fn call_count(&self) -> usize {
			self.calls.lock().len()
		}

		pub(crate) fn bearer_tokens(&self) -> Vec<String> {
			self.calls
				.lock()
				.iter()
				.filter_map(|call| call.options.header_value(AUTHORIZATION_HEADER).map(str::to_owned))
				.collect()
		}
	}
	impl RequestExecutor for ScriptedExecutor {
		fn execute<'a>(
			&'a self,
			method: Method,
			url: &'a str,
			options: &'a RequestOptions,
		) -> ExecutorFuture<'a> {
			self.calls.lock().push(Call { method, url: url.to_owned(), options: options.clone() });

			let outcome: Result<RestResponse> = if self.fail_with_transport {
				Err(TransportError::Io(std::io::Error::new(
					std::io::ErrorKind::ConnectionRefused,
					"connection refused",
				))
				.into())
			} else {
				Ok(RestResponse::new(self.statuses.lock().pop_front().unwrap_or(200)))
			};

			Box::pin(async move { outcome })
		}
	}

	/// Exchanger that issues `access-<n>` tokens and records each presented refresh token.
	#[derive(Default)]
	pub(crate) struct CountingExchanger {
		pub(crate) presented: Mutex<Vec<String>>,
		reject: bool,
		relocate_to: Option<&'static str>,
	}
	impl CountingExchanger {
		pub(crate) fn new() -> Arc<Self> {
			Arc::new(Self::default())
		}

		fn rejecting() -> Arc<Self> {
			Arc::new(Self { reject: true, ..Default::default() })
		}

		fn relocating(instance_url: &'static str) -> Arc<Self> {
			Arc::new(Self { relocate_to: Some(instance_url), ..Default::default() })
		}

		pub(crate) fn call_count(&self) -> usize {
			self.presented.lock().len()
		}
	}
	impl CredentialExchanger for CountingExchanger {
		fn exchange<'a>(
			&'a self,
			grant: GrantType,
			params: &'a BTreeMap<String, String>,
		) -> ExchangeFuture<'a> {
			assert_eq!(grant, GrantType::RefreshToken);

			let presented = params.get(REFRESH_TOKEN_PARAM).cloned().unwrap_or_default();
			let issued = {
				let mut guard = self.presented.lock();

				guard.push(presented);
				guard.len()
			};
			let outcome: Result<Credential> = if self.reject {
				Err(ExchangeError::InvalidGrant { reason: "expired access/refresh token".into() }.into())
			} else {
				Credential::new(
					format!("access-{issued}"),
					format!("refresh-{issued}"),
					self.relocate_to.unwrap_or(INSTANCE),
				)
				.map_err(Error::from)
			};

			Box::pin(async move { outcome })
		}
	}

	pub(crate) fn client_with(
		max_attempts: u32,
		executor: Arc<ScriptedExecutor>,
		exchanger: Arc<CountingExchanger>,
	) -> RestClient {
		let config = ClientConfig::builder(format!("{INSTANCE}/id/00D/005"), "v59.0")
			.max_retry_attempts(max_attempts)
			.build()
			.expect("Client config fixture should be valid.");
		let credential = Credential::new("access-0", "refresh-0", INSTANCE)
			.expect("Initial credential fixture should be valid.");

		RestClient::with_executor(config, credential, executor, exchanger)
	}

	#[test]
	fn relative_endpoints_resolve_against_instance() {
		let client = client_with(2, ScriptedExecutor::new([]), CountingExchanger::new());

		assert_eq!(
			client.construct_url("sobjects/Account"),
			"https://na1.example.com/services/data/v59.0/sobjects/Account"
		);
		// No normalization: a leading slash is kept as given.
		assert_eq!(
			client.construct_url("/query"),
			"https://na1.example.com/services/data/v59.0//query"
		);
		assert_eq!(client.construct_url("http://other.example.com/x"), "http://other.example.com/x");
		assert_eq!(client.resource_owner_url(), "https://na1.example.com/id/00D/005");
	}

	#[tokio::test]
	async fn authorized_first_attempt_never_refreshes() {
		let executor = ScriptedExecutor::new([200]);
		let exchanger = CountingExchanger::new();
		let mut client = client_with(3, executor.clone(), exchanger.clone());
		let response = client
			.request(Method::Get, "sobjects", RequestOptions::new())
			.await
			.expect("Authorized response should be returned.");

		assert_eq!(response.status, 200);
		assert_eq!(executor.call_count(), 1);
		assert_eq!(exchanger.call_count(), 0);
		assert_eq!(executor.bearer_tokens(), vec!["Bearer access-0".to_owned()]);
		assert_eq!(client.metrics().executions(), 1);
		assert_eq!(client.metrics().refreshes(), 0);
	}

	#[tokio::test]
	async fn retry_after_refresh_targets_the_new_instance() {
		let executor = ScriptedExecutor::new([401, 200]);
		let exchanger = CountingExchanger::relocating("https://na7.example.com");
		let mut client = client_with(2, executor.clone(), exchanger);

		client.get("sobjects/Account").await.expect("Retry on the new instance should succeed.");

		let urls = executor.calls.lock().iter().map(|call| call.url.clone()).collect::<Vec<_>>();

		assert_eq!(
			urls,
			vec![
				"https://na1.example.com/services/data/v59.0/sobjects/Account".to_owned(),
				"https://na7.example.com/services/data/v59.0/sobjects/Account".to_owned(),
			]
		);
		assert_eq!(client.credential().instance_url(), "https://na7.example.com");
	}

	#[tokio::test]
	async fn non_401_errors_are_returned_without_refresh() {
		let executor = ScriptedExecutor::new([403]);
		let exchanger = CountingExchanger::new();
		let mut client = client_with(3, executor.clone(), exchanger.clone());
		let response = client.get("sobjects").await.expect("403 should be returned as a response.");

		assert_eq!(response.status, 403);
		assert_eq!(executor.call_count(), 1);
		assert_eq!(exchanger.call_count(), 0);
	}

	#[tokio::test]
	async fn single_401_refreshes_once_and_uses_new_token() {
		let executor = ScriptedExecutor::new([401, 200]);
		let exchanger = CountingExchanger::new();
		let mut client = client_with(2, executor.clone(), exchanger.clone());
		let response = client.get("limits").await.expect("Second attempt should succeed.");

		assert_eq!(response.status, 200);
		assert_eq!(executor.call_count(), 2);
		assert_eq!(*exchanger.presented.lock(), vec!["refresh-0".to_owned()]);
		assert_eq!(
			executor.bearer_tokens(),
			vec!["Bearer access-0".to_owned(), "Bearer access-1".to_owned()]
		);
		assert_eq!(client.credential().access_token().expose(), "access-1");
		assert_eq!(client.metrics().unauthorized(), 1);
		assert_eq!(client.metrics().refreshes(), 1);
	}

	#[tokio::test]
	async fn three_attempt_budget_recovers_on_last_try() {
		let executor = ScriptedExecutor::new([401, 401, 200]);
		let exchanger = CountingExchanger::new();
		let mut client = client_with(3, executor.clone(), exchanger.clone());
		let response = client.get("limits").await.expect("Third attempt should succeed.");

		assert_eq!(response.status, 200);
		assert_eq!(executor.call_count(), 3);
		assert_eq!(exchanger.call_count(), 2);
		// Each refresh presents the refresh token issued by the previous one.
		assert_eq!(*exchanger.presented.lock(), vec!["refresh-0".to_owned(), "refresh-1".to_owned()]);
	}

	#[tokio::test]
	async fn persistent_401_exhausts_budget() {
		let executor = ScriptedExecutor::new([401, 401, 401, 401]);
		let exchanger = CountingExchanger::new();
		let mut client = client_with(4, executor.clone(), exchanger.clone());
		let err = client.get("limits").await.expect_err("Budget should be exhausted.");

		assert!(matches!(err, Error::RetryLimitExceeded { max_attempts: 4 }));
		assert_eq!(executor.call_count(), 4);
		assert_eq!(exchanger.call_count(), 3);
		assert_eq!(client.metrics().failures(), 1);
	}

	#[tokio::test]
	async fn single_attempt_budget_fails_without_refresh() {
		let executor = ScriptedExecutor::new([401]);
		let exchanger = CountingExchanger::new();
		let mut client = client_with(1, executor.clone(), exchanger.clone());
		let err = client.get("limits").await.expect_err("Single 401 should fail immediately.");

		assert!(matches!(err, Error::RetryLimitExceeded { max_attempts: 1 }));
		assert!(err.to_string().contains("Max retry limit of 1"));
		assert_eq!(executor.call_count(), 1);
		assert_eq!(exchanger.call_count(), 0);
	}

	#[tokio::test]
	async fn absolute_endpoint_is_sent_verbatim() {
		let executor = ScriptedExecutor::new([200]);
		let mut client = client_with(2, executor.clone(), CountingExchanger::new());

		client
			.request(Method::Post, "https://other.example.com/x", RequestOptions::new())
			.await
			.expect("Absolute endpoint should be executed.");

		let calls = executor.calls.lock();

		assert_eq!(calls[0].url, "https://other.example.com/x");
		assert_eq!(calls[0].method, Method::Post);
	}

	#[tokio::test]
	async fn caller_headers_survive_and_stale_authorization_is_replaced() {
		let executor = ScriptedExecutor::new([401, 200]);
		let mut client = client_with(2, executor.clone(), CountingExchanger::new());
		let options = RequestOptions::new()
			.header("X-PrettyPrint", "1")
			.header("authorization", "Bearer cached-from-earlier");

		client
			.request(Method::Get, "sobjects", options)
			.await
			.expect("Request should succeed after one refresh.");

		let calls = executor.calls.lock();

		for (call, token) in calls.iter().zip(["access-0", "access-1"]) {
			let headers = call.options.headers().expect("Merged options should carry headers.");

			assert_eq!(headers.get("X-PrettyPrint"), Some(&Value::from("1")));
			assert!(headers.get("authorization").is_none());
			assert_eq!(call.options.header_value(AUTHORIZATION_HEADER), Some(format!("Bearer {token}").as_str()));
		}
	}

	#[tokio::test]
	async fn exchange_failure_aborts_without_retry_limit() {
		let executor = ScriptedExecutor::new([401, 200]);
		let exchanger = CountingExchanger::rejecting();
		let mut client = client_with(3, executor.clone(), exchanger.clone());
		let err = client.get("limits").await.expect_err("Exchange failure should propagate.");

		assert!(matches!(err, Error::Exchange(ExchangeError::InvalidGrant { .. })));
		assert_eq!(executor.call_count(), 1);
		assert_eq!(exchanger.call_count(), 1);
		assert_eq!(client.credential().access_token().expose(), "access-0");
	}

	#[tokio::test]
	async fn transport_failure_propagates_unchanged() {
		let executor = ScriptedExecutor::failing();
		let exchanger = CountingExchanger::new();
		let mut client = client_with(3, executor.clone(), exchanger.clone());
		let err = client.get("limits").await.expect_err("Transport failure should propagate.");

		assert!(matches!(err, Error::Transport(TransportError::Io(_))));
		assert_eq!(executor.call_count(), 1);
		assert_eq!(exchanger.call_count(), 0);
	}

	#[tokio::test]
	async fn notifier_sees_each_credential_before_it_is_used() {
		let executor = ScriptedExecutor::new([401, 401, 200]);
		let seen = Arc::new(Mutex::new(Vec::new()));
		let sink = seen.clone();
		let probe = executor.clone();
		let notifier = notify::from_fn(move |credential: &Credential| {
			// The executor has not yet been called with this token.
			let expected_calls = sink.lock().len() + 1;

			assert_eq!(probe.call_count(), expected_calls);

			sink.lock().push(credential.access_token().expose().to_owned());

			Ok(())
		});
		let mut client =
			client_with(3, executor.clone(), CountingExchanger::new()).with_notifier(Arc::new(notifier));

		client.get("limits").await.expect("Third attempt should succeed.");

		assert_eq!(*seen.lock(), vec!["access-1".to_owned(), "access-2".to_owned()]);
		assert_eq!(
			executor.bearer_tokens(),
			vec![
				"Bearer access-0".to_owned(),
				"Bearer access-1".to_owned(),
				"Bearer access-2".to_owned()
			]
		);
	}

	#[tokio::test]
	async fn notifier_failure_keeps_previous_credential() {
		let executor = ScriptedExecutor::new([401, 200]);
		let notifier =
			notify::from_fn(|_: &Credential| Err(NotifyError::Rejected { reason: "vault offline".into() }));
		let mut client = client_with(2, executor.clone(), CountingExchanger::new())
			.with_notifier(Arc::new(notifier));
		let err = client.get("limits").await.expect_err("Notifier failure should propagate.");

		assert!(matches!(err, Error::Notify(NotifyError::Rejected { .. })));
		assert_eq!(executor.call_count(), 1);
		assert_eq!(client.credential().access_token().expose(), "access-0");
	}

	#[tokio::test]
	async fn convenience_verbs_attach_json_bodies() {
		let executor = ScriptedExecutor::new([201, 204, 204]);
		let mut client = client_with(2, executor.clone(), CountingExchanger::new());

		client
			.post_json("sobjects/Account", serde_json::json!({ "Name": "Acme" }))
			.await
			.expect("POST should succeed.");
		client
			.patch_json("sobjects/Account/001", serde_json::json!({ "Name": "Acme Corp" }))
			.await
			.expect("PATCH should succeed.");
		client.delete("sobjects/Account/001").await.expect("DELETE should succeed.");

		let calls = executor.calls.lock();
		let methods: Vec<_> = calls.iter().map(|call| call.method).collect();

		assert_eq!(methods, vec![Method::Post, Method::Patch, Method::Delete]);
		assert_eq!(calls[0].options.get(crate::options::JSON), Some(&serde_json::json!({ "Name": "Acme" })));
		assert!(calls[2].options.get(crate::options::JSON).is_none());
	}
}
