//! Mutual-exclusion wrapper for sharing one [`RestClient`] across tasks.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	client::RestClient,
	http::{Method, RestResponse},
	options::RequestOptions,
};

/// Cloneable handle that serializes access to a single [`RestClient`].
///
/// Every request holds the lock for its whole read-token/execute/refresh cycle, so a refresh
/// performed for one caller is visible to the next and never races with it.
#[derive(Clone)]
pub struct SharedRestClient {
	inner: Arc<AsyncMutex<RestClient>>,
	resource_owner_url: Arc<str>,
}
impl SharedRestClient {
	/// Wraps `client`.
	pub fn new(client: RestClient) -> Self {
		let resource_owner_url = Arc::from(client.resource_owner_url());

		Self { inner: Arc::new(AsyncMutex::new(client)), resource_owner_url }
	}

	/// Resource owner URL supplied at construction; does not take the lock.
	pub fn resource_owner_url(&self) -> &str {
		&self.resource_owner_url
	}

	/// Runs [`RestClient::request`] under the lock.
	pub async fn request(
		&self,
		method: Method,
		endpoint: &str,
		options: RequestOptions,
	) -> Result<RestResponse> {
		self.inner.lock().await.request(method, endpoint, options).await
	}

	/// Returns a copy of the credential currently held.
	pub async fn credential(&self) -> Credential {
		self.inner.lock().await.credential().clone()
	}

	/// Runs `f` with exclusive access to the wrapped client.
	pub async fn with_client<F, T>(&self, f: F) -> T
	where
		F: FnOnce(&mut RestClient) -> T,
	{
		f(&mut *self.inner.lock().await)
	}
}
impl From<RestClient> for SharedRestClient {
	fn from(client: RestClient) -> Self {
		Self::new(client)
	}
}
impl Debug for SharedRestClient {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SharedRestClient")
			.field("resource_owner_url", &self.resource_owner_url)
			.finish_non_exhaustive()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::client::tests::{CountingExchanger, ScriptedExecutor, client_with};

	#[tokio::test]
	async fn concurrent_callers_share_one_refresh() {
		// First caller hits 401 and refreshes; the second then succeeds with the new token.
		let executor = ScriptedExecutor::new([401, 200, 200]);
		let exchanger = CountingExchanger::new();
		let shared = SharedRestClient::new(client_with(2, executor.clone(), exchanger.clone()));
		let (first, second) = tokio::join!(
			shared.request(Method::Get, "limits", RequestOptions::new()),
			shared.request(Method::Get, "limits", RequestOptions::new()),
		);

		assert_eq!(first.expect("First caller should succeed.").status, 200);
		assert_eq!(second.expect("Second caller should succeed.").status, 200);
		assert_eq!(exchanger.call_count(), 1);
		assert_eq!(executor.call_count(), 3);
		assert_eq!(
			executor.bearer_tokens(),
			vec![
				"Bearer access-0".to_owned(),
				"Bearer access-1".to_owned(),
				"Bearer access-1".to_owned()
			]
		);
		assert_eq!(shared.credential().await.access_token().expose(), "access-1");
		assert_eq!(shared.with_client(|client| client.metrics().executions()).await, 3);
		assert_eq!(shared.resource_owner_url(), "https://na1.example.com/id/00D/005");
	}
}
