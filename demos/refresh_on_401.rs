//! Demonstrates a request that hits an expired session, refreshes through the token endpoint,
//! and persists the new credential to a file store before retrying.

// std
use std::{env, sync::Arc};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use restforce_client::{
	auth::Credential,
	client::{ClientConfig, RestClient},
	exchange::{ClientAuthMethod, ExchangerConfig, OAuth2Exchanger},
	http::{Method, ReqwestExecutor},
	options::RequestOptions,
	reqwest::Client,
	store::{CredentialStore, FileStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let expired = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/services/data/v59.0/sobjects")
				.header("authorization", "Bearer demo-expired");
			then.status(401).body("[{\"errorCode\":\"INVALID_SESSION_ID\"}]");
		})
		.await;
	let token = server
		.mock_async(|when, then| {
			when.method(POST).path("/services/oauth2/token").body_includes("grant_type=refresh_token");
			then.status(200).header("content-type", "application/json").body(format!(
				"{{\"access_token\":\"demo-fresh\",\"instance_url\":\"{}\",\"token_type\":\"Bearer\"}}",
				server.base_url()
			));
		})
		.await;
	let listing = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/services/data/v59.0/sobjects")
				.header("authorization", "Bearer demo-fresh");
			then.status(200).body("{\"sobjects\":[{\"name\":\"Account\"}]}");
		})
		.await;
	let exchanger_config =
		ExchangerConfig::builder(Url::parse(&server.url("/services/oauth2/token"))?, "demo-client")
			.client_secret("demo-secret")
			.client_auth(ClientAuthMethod::ClientSecretPost)
			.allow_insecure_endpoint()
			.build()?;
	let executor = ReqwestExecutor::with_client(Client::builder().build()?);
	let exchanger = OAuth2Exchanger::with_executor(exchanger_config, executor.clone())?;
	let store = Arc::new(FileStore::open(env::temp_dir().join("restforce-demo/credential.json"))?);
	let config = ClientConfig::builder(server.url("/id/00Dxx/005xx"), "v59.0").build()?;
	let credential = Credential::new("demo-expired", "demo-refresh", server.base_url())?;
	let mut client =
		RestClient::with_executor(config, credential, Arc::new(executor), Arc::new(exchanger))
			.with_notifier(store.clone());
	let response = client.request(Method::Get, "sobjects", RequestOptions::new()).await?;

	println!("Status {} after {} execution(s): {}.", response.status, client.metrics().executions(), response.text());

	if let Some(saved) = store.load().await? {
		println!("Persisted credential for {} to {}.", saved.instance_url(), store.path().display());
	}

	expired.assert_async().await;
	token.assert_async().await;
	listing.assert_async().await;

	Ok(())
}
