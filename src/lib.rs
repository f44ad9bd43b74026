//! Bearer-authorized REST client that refreshes expired OAuth 2.0 credentials and retries
//! transparently, so callers never manage token lifecycles themselves.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod error;
pub mod exchange;
pub mod http;
pub mod notify;
pub mod obs;
pub mod options;
pub mod store;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for integration tests; enabled via `cfg(test)` or the
	//! `test` crate feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		auth::Credential,
		client::{ClientConfig, RestClient},
		exchange::{ClientAuthMethod, ExchangerConfig, OAuth2Exchanger},
		http::ReqwestExecutor,
		store::MemoryStore,
	};

	/// Builds a reqwest executor that accepts the self-signed certificates produced by
	/// `httpmock` during tests.
	pub fn test_reqwest_executor() -> ReqwestExecutor {
		let client = ReqwestClient::builder()
			.danger_accept_invalid_certs(true)
			.danger_accept_invalid_hostnames(true)
			.redirect(reqwest::redirect::Policy::none())
			.build()
			.expect("Failed to build insecure Reqwest client for tests.");

		ReqwestExecutor::with_client(client)
	}

	/// Builds an exchanger that posts `client_secret_post` credentials to `token_endpoint`,
	/// allowing plain-HTTP mock servers.
	pub fn test_exchanger(token_endpoint: &str, client_id: &str, client_secret: &str) -> OAuth2Exchanger {
		let config = ExchangerConfig::builder(
			Url::parse(token_endpoint).expect("Failed to parse mock token endpoint URL."),
			client_id,
		)
		.client_secret(client_secret)
		.client_auth(ClientAuthMethod::ClientSecretPost)
		.allow_insecure_endpoint()
		.build()
		.expect("Failed to build exchanger config for tests.");

		OAuth2Exchanger::with_executor(config, test_reqwest_executor())
			.expect("Failed to build OAuth2 exchanger for tests.")
	}

	/// Constructs a [`RestClient`] backed by the reqwest executor, the mock token endpoint, and
	/// an in-memory store that records every refreshed credential.
	pub fn build_reqwest_test_client(
		instance_url: &str,
		token_endpoint: &str,
		max_retry_attempts: u32,
	) -> (RestClient, Arc<MemoryStore>) {
		let config = ClientConfig::builder(format!("{instance_url}/id/owner"), "v59.0")
			.max_retry_attempts(max_retry_attempts)
			.build()
			.expect("Failed to build client config for tests.");
		let credential = Credential::new("access-initial", "refresh-initial", instance_url)
			.expect("Initial credential fixture should be valid.");
		let store = Arc::new(MemoryStore::default());
		let client = RestClient::with_executor(
			config,
			credential,
			Arc::new(test_reqwest_executor()),
			Arc::new(test_exchanger(token_endpoint, "client-test", "secret-test")),
		)
		.with_notifier(store.clone());

		(client, store)
	}
}

mod _prelude {
	pub use std::{
		collections::BTreeMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use serde_json::{Map, Value};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
