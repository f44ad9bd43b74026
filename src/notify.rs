//! Refresh notification contracts.
//!
//! A [`RefreshNotifier`] observes every credential the client is about to adopt, so callers
//! can persist refreshed tokens. The notifier runs before the swap: if it fails, the new
//! credential is discarded and the error reaches the caller of the request.

// self
use crate::{_prelude::*, auth::Credential, store::StoreError};

/// Boxed future returned by [`RefreshNotifier::on_credential_refreshed`].
pub type NotifyFuture<'a> = Pin<Box<dyn Future<Output = Result<(), NotifyError>> + 'a + Send>>;

/// Observer invoked with each newly issued credential before it becomes active.
pub trait RefreshNotifier
where
	Self: Send + Sync,
{
	/// Receives the credential that will be used for the next attempt.
	fn on_credential_refreshed<'a>(&'a self, credential: &'a Credential) -> NotifyFuture<'a>;
}

/// Failures raised by refresh notifiers.
#[derive(Debug, ThisError)]
pub enum NotifyError {
	/// Notifier refused the credential.
	#[error("Refresh notifier rejected the credential: {reason}.")]
	Rejected {
		/// Notifier-supplied reason.
		reason: String,
	},
	/// Credential could not be persisted.
	#[error("Refresh notifier could not persist the credential.")]
	Storage(#[from] StoreError),
}

/// Adapts a synchronous closure into a [`RefreshNotifier`].
pub struct FnNotifier<F>(F);
impl<F> RefreshNotifier for FnNotifier<F>
where
	F: Fn(&Credential) -> Result<(), NotifyError> + Send + Sync,
{
	fn on_credential_refreshed<'a>(&'a self, credential: &'a Credential) -> NotifyFuture<'a> {
		let outcome = (self.0)(credential);

		Box::pin(async move { outcome })
	}
}
impl<F> Debug for FnNotifier<F> {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("FnNotifier(..)")
	}
}

/// Wraps `callback` so it runs on every refresh.
pub fn from_fn<F>(callback: F) -> FnNotifier<F>
where
	F: Fn(&Credential) -> Result<(), NotifyError> + Send + Sync,
{
	FnNotifier(callback)
}
