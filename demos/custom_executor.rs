//! Demonstrates plugging a custom transport and exchanger into the client.
//!
//! 1. Implement [`RequestExecutor`] to decide how calls reach the API (here: canned replies).
//! 2. Implement [`CredentialExchanger`] to decide how refresh tokens turn into credentials.
//! 3. Wrap both in `Arc` and pass them to [`RestClient::with_executor`].

// std
use std::{
	collections::BTreeMap,
	sync::{
		Arc,
		atomic::{AtomicU32, Ordering},
	},
};
// crates.io
use color_eyre::Result;
// self
use restforce_client::{
	auth::Credential,
	client::{ClientConfig, RestClient},
	error::Error,
	exchange::{CredentialExchanger, ExchangeFuture, GrantType},
	http::{ExecutorFuture, Method, RequestExecutor, RestResponse},
	notify,
	options::{AUTHORIZATION_HEADER, RequestOptions},
};

/// Accepts only the token issued by [`RotatingExchanger`] most recently.
#[derive(Default)]
struct CannedExecutor {
	accepted: parking_lot::Mutex<Option<String>>,
}
impl RequestExecutor for CannedExecutor {
	fn execute<'a>(
		&'a self,
		method: Method,
		url: &'a str,
		options: &'a RequestOptions,
	) -> ExecutorFuture<'a> {
		let presented = options.header_value(AUTHORIZATION_HEADER).map(str::to_owned);
		let authorized = presented.is_some() && *self.accepted.lock() == presented;
		let status = if authorized { 200 } else { 401 };

		println!("{method} {url} -> {status}");

		let response: Result<RestResponse, Error> =
			Ok(RestResponse::new(status).with_body("{\"totalSize\":0}"));

		Box::pin(async move { response })
	}
}

/// Issues `token-<n>` credentials and tells the executor which one is valid.
struct RotatingExchanger {
	executor: Arc<CannedExecutor>,
	issued: AtomicU32,
}
impl CredentialExchanger for RotatingExchanger {
	fn exchange<'a>(
		&'a self,
		_grant: GrantType,
		_params: &'a BTreeMap<String, String>,
	) -> ExchangeFuture<'a> {
		let n = self.issued.fetch_add(1, Ordering::Relaxed) + 1;
		let access = format!("token-{n}");

		*self.executor.accepted.lock() = Some(format!("Bearer {access}"));

		let credential = Credential::new(access, format!("refresh-{n}"), "https://demo.my.example.com")
			.map_err(Error::from);

		Box::pin(async move { credential })
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let executor = Arc::new(CannedExecutor::default());
	let exchanger = Arc::new(RotatingExchanger { executor: executor.clone(), issued: AtomicU32::new(0) });
	let config = ClientConfig::builder("https://login.example.com/id/00Dxx/005xx", "v60.0")
		.max_retry_attempts(3)
		.build()?;
	let credential = Credential::new("token-0", "refresh-0", "https://demo.my.example.com")?;
	let notifier = notify::from_fn(|credential: &Credential| {
		println!("Adopting credential issued for {}.", credential.instance_url());

		Ok(())
	});
	let mut client = RestClient::with_executor(config, credential, executor, exchanger)
		.with_notifier(Arc::new(notifier));
	let response = client
		.request(Method::Get, "query", RequestOptions::new().query("q", "SELECT Id FROM Account"))
		.await?;

	println!(
		"Final status {} after {} refresh(es) on behalf of {}.",
		response.status,
		client.metrics().refreshes(),
		client.resource_owner_url()
	);

	Ok(())
}
