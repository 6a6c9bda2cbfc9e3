//! Credential kinds, storage keys, and the access/refresh pair issued by the backend.

// self
use crate::{_prelude::*, auth::TokenSecret};

/// The two credentials the client keeps.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CredentialKind {
	/// Short-lived bearer token attached to API calls.
	Access,
	/// Longer-lived token exchanged for a new access token.
	Refresh,
}
impl CredentialKind {
	/// Every kind, in purge order.
	pub const ALL: [CredentialKind; 2] = [CredentialKind::Access, CredentialKind::Refresh];

	/// Returns the key under which the credential is persisted.
	pub const fn storage_key(self) -> &'static str {
		match self {
			CredentialKind::Access => "access_token",
			CredentialKind::Refresh => "refresh_token",
		}
	}
}
impl Display for CredentialKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.storage_key())
	}
}

/// Access/refresh pair as returned by the login endpoint.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
	/// Access token.
	pub access: TokenSecret,
	/// Refresh token.
	pub refresh: TokenSecret,
}
impl TokenPair {
	/// Builds a pair from raw token strings.
	pub fn new(access: impl Into<String>, refresh: impl Into<String>) -> Self {
		Self { access: TokenSecret::new(access), refresh: TokenSecret::new(refresh) }
	}
}

/// Snapshot of whatever credentials the store currently resolves.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Credentials {
	/// Access token resolved cookie-first with a persistent fallback.
	pub access: Option<TokenSecret>,
	/// Refresh token from the persistent store.
	pub refresh: Option<TokenSecret>,
}
impl Credentials {
	/// Returns `true` when neither credential is present.
	pub fn is_empty(&self) -> bool {
		self.access.is_none() && self.refresh.is_none()
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn storage_keys_are_stable() {
		assert_eq!(CredentialKind::Access.storage_key(), "access_token");
		assert_eq!(CredentialKind::Refresh.to_string(), "refresh_token");
	}

	#[test]
	fn token_pair_deserializes_login_payload() {
		let pair: TokenPair = serde_json::from_str(r#"{"access":"a-1","refresh":"r-1"}"#)
			.expect("Login payload should deserialize into a token pair.");

		assert_eq!(pair, TokenPair::new("a-1", "r-1"));
		assert!(Credentials::default().is_empty());
	}
}
