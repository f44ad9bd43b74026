//! Credential exchange contracts.
//!
//! The client only ever asks for one thing: "trade this refresh token for a new credential".
//! [`CredentialExchanger`] keeps that seam generic over grant types so the same exchanger can
//! also bootstrap the first credential (password or authorization code).

#[cfg(feature = "reqwest")] mod oauth;

#[cfg(feature = "reqwest")] pub use oauth::*;

// self
use crate::{_prelude::*, auth::Credential};

/// Parameter carrying the refresh token for the `refresh_token` grant.
pub const REFRESH_TOKEN_PARAM: &str = "refresh_token";
/// Parameter carrying the resource owner's username for the `password` grant.
pub const USERNAME_PARAM: &str = "username";
/// Parameter carrying the resource owner's password for the `password` grant.
pub const PASSWORD_PARAM: &str = "password";
/// Parameter carrying the authorization code for the `authorization_code` grant.
pub const CODE_PARAM: &str = "code";
/// Parameter carrying the redirect URI for the `authorization_code` grant.
pub const REDIRECT_URI_PARAM: &str = "redirect_uri";
/// Parameter carrying the PKCE verifier for the `authorization_code` grant.
pub const CODE_VERIFIER_PARAM: &str = "code_verifier";

/// Boxed future returned by [`CredentialExchanger::exchange`].
pub type ExchangeFuture<'a> = Pin<Box<dyn Future<Output = Result<Credential>> + 'a + Send>>;

/// Issues credentials for a grant.
///
/// Failures are reported as [`Error::Exchange`](crate::error::Error::Exchange) (or
/// [`Error::Transport`](crate::error::Error::Transport)) and are never retried by the client.
pub trait CredentialExchanger
where
	Self: Send + Sync,
{
	/// Performs one exchange for `grant` with the given form parameters.
	fn exchange<'a>(&'a self, grant: GrantType, params: &'a BTreeMap<String, String>) -> ExchangeFuture<'a>;
}

/// OAuth 2.0 grant types understood by exchangers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantType {
	/// Refresh Token grant; the only grant the client issues on its own.
	RefreshToken,
	/// Resource Owner Password grant.
	Password,
	/// Authorization Code grant.
	AuthorizationCode,
}
impl GrantType {
	/// Returns the RFC 6749 identifier for the grant type.
	pub const fn as_str(self) -> &'static str {
		match self {
			GrantType::RefreshToken => "refresh_token",
			GrantType::Password => "password",
			GrantType::AuthorizationCode => "authorization_code",
		}
	}
}
impl Display for GrantType {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Builds the parameter map for a `refresh_token` exchange.
pub fn refresh_params(refresh_token: &str) -> BTreeMap<String, String> {
	BTreeMap::from([(REFRESH_TOKEN_PARAM.to_owned(), refresh_token.to_owned())])
}
