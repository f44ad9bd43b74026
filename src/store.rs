//! Storage contracts and built-in stores for refreshed credentials.
//!
//! Stores double as [`RefreshNotifier`]s: attach one to a client and every credential it
//! adopts is persisted before the next attempt runs.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{_prelude::*, auth::Credential};

/// Boxed future returned by [`CredentialStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Storage backend contract for the active credential.
pub trait CredentialStore
where
	Self: Send + Sync,
{
	/// Persists or replaces the stored credential.
	fn save(&self, credential: Credential) -> StoreFuture<'_, ()>;

	/// Fetches the stored credential, if present.
	fn load(&self) -> StoreFuture<'_, Option<Credential>>;
}

/// Error type produced by [`CredentialStore`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::Error;

	#[test]
	fn store_error_converts_into_client_error_with_source() {
		let store_error = StoreError::Backend { message: "disk full".into() };
		let client_error: Error = store_error.clone().into();

		assert!(matches!(client_error, Error::Storage(_)));
		assert!(client_error.to_string().contains("disk full"));

		let source = StdError::source(&client_error)
			.expect("Client error should expose the underlying store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[test]
	fn store_error_survives_json() {
		let error = StoreError::Serialization { message: "bad payload".into() };
		let payload = serde_json::to_string(&error).expect("StoreError should serialize to JSON.");
		let decoded: StoreError =
			serde_json::from_str(&payload).expect("StoreError should deserialize from JSON.");

		assert_eq!(decoded, error);
	}
}
