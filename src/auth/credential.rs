//! Immutable credential values issued by exchangers.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// Errors produced when a credential violates its invariants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum CredentialError {
	/// Issued when the access token is empty or whitespace.
	#[error("Access token is required.")]
	MissingAccessToken,
	/// Issued when the refresh token is empty or whitespace.
	#[error("Refresh token is required.")]
	MissingRefreshToken,
}

/// One authenticated session: access token, paired refresh token, and the instance the
/// tokens are valid for.
///
/// Values are never mutated in place. A refresh produces a brand-new [`Credential`] that
/// replaces the one held by the client.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "CredentialRepr")]
pub struct Credential {
	access_token: TokenSecret,
	refresh_token: TokenSecret,
	instance_url: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	id: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	issued_at: Option<OffsetDateTime>,
}
impl Credential {
	/// Creates a credential after checking that both tokens are present.
	pub fn new(
		access_token: impl Into<String>,
		refresh_token: impl Into<String>,
		instance_url: impl Into<String>,
	) -> Result<Self, CredentialError> {
		let access_token = TokenSecret::new(access_token);
		let refresh_token = TokenSecret::new(refresh_token);

		if access_token.is_blank() {
			return Err(CredentialError::MissingAccessToken);
		}
		if refresh_token.is_blank() {
			return Err(CredentialError::MissingRefreshToken);
		}

		Ok(Self {
			access_token,
			refresh_token,
			instance_url: instance_url.into(),
			id: None,
			issued_at: None,
		})
	}

	/// Attaches the identity URL returned alongside the tokens.
	pub fn with_id(mut self, id: impl Into<String>) -> Self {
		self.id = Some(id.into());

		self
	}

	/// Attaches the instant the provider issued the tokens.
	pub fn with_issued_at(mut self, instant: OffsetDateTime) -> Self {
		self.issued_at = Some(instant);

		self
	}

	/// Access token sent in the bearer header.
	pub fn access_token(&self) -> &TokenSecret {
		&self.access_token
	}

	/// Refresh token presented to the exchanger once the access token expires.
	pub fn refresh_token(&self) -> &TokenSecret {
		&self.refresh_token
	}

	/// Base URL of the instance that relative API paths resolve against.
	pub fn instance_url(&self) -> &str {
		&self.instance_url
	}

	/// Identity URL, if the provider returned one.
	pub fn id(&self) -> Option<&str> {
		self.id.as_deref()
	}

	/// Issue instant, if the provider returned one.
	pub fn issued_at(&self) -> Option<OffsetDateTime> {
		self.issued_at
	}
}
impl Debug for Credential {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("Credential")
			.field("access_token", &"<redacted>")
			.field("refresh_token", &"<redacted>")
			.field("instance_url", &self.instance_url)
			.field("id", &self.id)
			.field("issued_at", &self.issued_at)
			.finish()
	}
}

#[derive(Deserialize)]
struct CredentialRepr {
	access_token: String,
	refresh_token: String,
	instance_url: String,
	#[serde(default)]
	id: Option<String>,
	#[serde(default)]
	issued_at: Option<OffsetDateTime>,
}
impl TryFrom<CredentialRepr> for Credential {
	type Error = CredentialError;

	fn try_from(repr: CredentialRepr) -> Result<Self, Self::Error> {
		let mut credential = Credential::new(repr.access_token, repr.refresh_token, repr.instance_url)?;

		credential.id = repr.id;
		credential.issued_at = repr.issued_at;

		Ok(credential)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use time::macros;
	// self
	use super::*;

	#[test]
	fn rejects_blank_tokens() {
		assert_eq!(
			Credential::new("", "refresh", "https://na1.example.com").unwrap_err(),
			CredentialError::MissingAccessToken,
		);
		assert_eq!(
			Credential::new("access", "  ", "https://na1.example.com").unwrap_err(),
			CredentialError::MissingRefreshToken,
		);
	}

	#[test]
	fn debug_output_redacts_tokens() {
		let credential = Credential::new("access-secret", "refresh-secret", "https://na1.example.com")
			.expect("Credential fixture should be valid.");
		let rendered = format!("{credential:?}");

		assert!(!rendered.contains("access-secret"));
		assert!(!rendered.contains("refresh-secret"));
		assert!(rendered.contains("https://na1.example.com"));
	}

	#[test]
	fn deserialization_enforces_invariants() {
		let err = serde_json::from_str::<Credential>(
			"{\"access_token\":\"\",\"refresh_token\":\"r\",\"instance_url\":\"https://x\"}",
		)
		.expect_err("Blank access tokens should be rejected while deserializing.");

		assert!(err.to_string().contains("Access token is required"));
	}

	#[test]
	fn optional_metadata_survives_serialization() {
		let credential = Credential::new("a", "r", "https://na1.example.com")
			.expect("Credential fixture should be valid.")
			.with_id("https://login.example.com/id/00D/005")
			.with_issued_at(macros::datetime!(2025-01-01 00:00 UTC));
		let payload =
			serde_json::to_string(&credential).expect("Credential should serialize to JSON.");
		let restored: Credential =
			serde_json::from_str(&payload).expect("Credential should deserialize from JSON.");

		assert_eq!(restored, credential);
		assert_eq!(restored.id(), Some("https://login.example.com/id/00D/005"));
	}
}
