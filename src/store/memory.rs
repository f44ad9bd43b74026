//! Thread-safe in-memory [`CredentialStore`] for local development and tests.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	notify::{NotifyError, NotifyFuture, RefreshNotifier},
	store::{CredentialStore, StoreFuture},
};

type Slot = Arc<RwLock<Option<Credential>>>;

/// Keeps the latest credential in-process and counts how often it was replaced.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore {
	slot: Slot,
	saves: Arc<RwLock<u64>>,
}
impl MemoryStore {
	/// Creates a store seeded with `credential`.
	pub fn seeded(credential: Credential) -> Self {
		Self { slot: Arc::new(RwLock::new(Some(credential))), saves: Default::default() }
	}

	/// Returns a clone of the stored credential without going through the async contract.
	pub fn snapshot(&self) -> Option<Credential> {
		self.slot.read().clone()
	}

	/// Number of successful [`CredentialStore::save`] calls.
	pub fn save_count(&self) -> u64 {
		*self.saves.read()
	}

	fn save_now(&self, credential: Credential) {
		*self.slot.write() = Some(credential);
		*self.saves.write() += 1;
	}
}
impl CredentialStore for MemoryStore {
	fn save(&self, credential: Credential) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			self.save_now(credential);

			Ok(())
		})
	}

	fn load(&self) -> StoreFuture<'_, Option<Credential>> {
		Box::pin(async move { Ok(self.snapshot()) })
	}
}
impl RefreshNotifier for MemoryStore {
	fn on_credential_refreshed<'a>(&'a self, credential: &'a Credential) -> NotifyFuture<'a> {
		Box::pin(async move { self.save(credential.clone()).await.map_err(NotifyError::from) })
	}
}
