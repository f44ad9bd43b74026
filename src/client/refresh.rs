//! Credential refresh: exchange, notify, then swap.

// self
use crate::{
	_prelude::*,
	auth::Credential,
	client::RestClient,
	exchange::{self, GrantType},
	obs::{self, OpSpan, Outcome, Stage},
};

impl RestClient {
	/// Trades the current refresh token for a new credential and adopts it.
	///
	/// The notifier, when present, sees the new credential first; if it fails, the held
	/// credential is left untouched. Nothing here is retried.
	pub async fn refresh_credential(&mut self) -> Result<&Credential> {
		const STAGE: Stage = Stage::Refresh;

		let span = OpSpan::new(STAGE, "refresh_credential");

		obs::record_outcome(STAGE, Outcome::Attempt);

		let result = span
			.instrument(async {
				let params = exchange::refresh_params(self.credential.refresh_token().expose());
				let credential = self.exchanger.exchange(GrantType::RefreshToken, &params).await?;

				if let Some(notifier) = &self.notifier {
					notifier.on_credential_refreshed(&credential).await?;
				}

				Ok::<_, Error>(credential)
			})
			.await;

		match result {
			Ok(credential) => {
				obs::record_outcome(STAGE, Outcome::Success);
				self.metrics.record_refresh();
				self.credential = credential;

				Ok(&self.credential)
			},
			Err(err) => {
				obs::record_outcome(STAGE, Outcome::Failure);

				Err(err)
			},
		}
	}
}
