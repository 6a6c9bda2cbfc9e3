//! Account endpoints: login, registration, OTP verification, password reset, and profiles.

// crates.io
use serde_json::{Map, Value};
// self
use crate::{
	_prelude::*,
	api::{Acknowledgement, json_or_default},
	auth::TokenPair,
	client::ApiClient,
	http::{ApiRequest, ApiTransport},
};

const LOGIN: &str = "auth/login/";
const REGISTER: &str = "auth/register/";
const VERIFY_OTP: &str = "auth/verify-otp/";
const RESEND_OTP: &str = "auth/resend-otp/";
const PASSWORD_RESET: &str = "auth/password-reset/";
const PASSWORD_RESET_CONFIRM: &str = "auth/password-reset/confirm/";
const PROFILES: &str = "auth/profiles/";

/// Which dashboard an account belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
	/// Student-facing dashboard.
	#[default]
	Student,
	/// Institution-facing dashboard.
	Institution,
}

/// Login form payload.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
	/// Account email.
	pub email: String,
	/// Plain-text password; only ever serialized into the request body.
	pub password: String,
}
impl LoginRequest {
	/// Creates a login payload.
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self { email: email.into(), password: password.into() }
	}
}
impl Debug for LoginRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginRequest")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Tokens plus whatever user summary the backend returns on login.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct LoginResponse {
	/// Issued access/refresh pair.
	#[serde(flatten)]
	pub tokens: TokenPair,
	/// Optional user summary.
	#[serde(default)]
	pub user: Option<Value>,
}

/// Registration form payload.
#[derive(Clone, Serialize)]
pub struct RegisterRequest {
	/// Account email.
	pub email: String,
	/// Plain-text password.
	pub password: String,
	/// Display name.
	pub full_name: String,
	/// Dashboard the account belongs to.
	pub role: AccountRole,
}
impl Debug for RegisterRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RegisterRequest")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.field("full_name", &self.full_name)
			.field("role", &self.role)
			.finish()
	}
}

/// One-time password submitted after registration or during a reset.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct OtpVerification {
	/// Account email.
	pub email: String,
	/// Code received by email.
	pub otp: String,
}

/// Result of an OTP verification; some backends sign the user in immediately.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct OtpOutcome {
	/// Human-readable message.
	#[serde(default, alias = "detail")]
	pub message: Option<String>,
	/// Tokens issued on verification, if any.
	#[serde(flatten)]
	pub tokens: Option<TokenPair>,
}

/// Final step of the password reset flow.
#[derive(Clone, Serialize)]
pub struct PasswordResetConfirm {
	/// Account email.
	pub email: String,
	/// Code received by email.
	pub otp: String,
	/// Replacement password.
	pub new_password: String,
}
impl Debug for PasswordResetConfirm {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PasswordResetConfirm")
			.field("email", &self.email)
			.field("otp", &self.otp)
			.field("new_password", &"<redacted>")
			.finish()
	}
}

/// Profile record; fields the client does not model are kept in `extra`.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Profile {
	/// Account email.
	#[serde(default)]
	pub email: Option<String>,
	/// Display name.
	#[serde(default)]
	pub full_name: Option<String>,
	/// Dashboard the account belongs to.
	#[serde(default)]
	pub role: Option<AccountRole>,
	/// Every other field returned by the backend.
	#[serde(flatten)]
	pub extra: Map<String, Value>,
}

/// Account endpoints bound to a shared [`ApiClient`].
pub struct AuthApi<C>
where
	C: ?Sized + ApiTransport,
{
	client: ApiClient<C>,
}
impl<C> AuthApi<C>
where
	C: ?Sized + ApiTransport,
{
	/// Wraps a client; the wrapper shares its store and refresh guard.
	pub fn new(client: ApiClient<C>) -> Self {
		Self { client }
	}

	/// Underlying client.
	pub fn client(&self) -> &ApiClient<C> {
		&self.client
	}

	/// Signs in and persists the issued token pair.
	pub async fn login(&self, payload: &LoginRequest) -> Result<LoginResponse> {
		let request = ApiRequest::post(LOGIN).anonymous().json(payload)?;
		let response: LoginResponse = self.client.send_json(request).await?;

		self.client.install_tokens(response.tokens.clone()).await?;

		Ok(response)
	}

	/// Creates an account; the backend follows up with an OTP email.
	pub async fn register(&self, payload: &RegisterRequest) -> Result<Acknowledgement> {
		let request = ApiRequest::post(REGISTER).anonymous().json(payload)?;

		json_or_default(&self.client.send(request).await?)
	}

	/// Verifies an OTP, persisting tokens when the backend issues them.
	pub async fn verify_otp(&self, payload: &OtpVerification) -> Result<OtpOutcome> {
		let request = ApiRequest::post(VERIFY_OTP).anonymous().json(payload)?;
		let outcome: OtpOutcome = json_or_default(&self.client.send(request).await?)?;

		if let Some(tokens) = outcome.tokens.clone() {
			self.client.install_tokens(tokens).await?;
		}

		Ok(outcome)
	}

	/// Asks the backend to send a fresh OTP.
	pub async fn resend_otp(&self, email: &str) -> Result<Acknowledgement> {
		let request =
			ApiRequest::post(RESEND_OTP).anonymous().json(&serde_json::json!({ "email": email }))?;

		json_or_default(&self.client.send(request).await?)
	}

	/// Starts the password reset flow.
	pub async fn request_password_reset(&self, email: &str) -> Result<Acknowledgement> {
		let request = ApiRequest::post(PASSWORD_RESET)
			.anonymous()
			.json(&serde_json::json!({ "email": email }))?;

		json_or_default(&self.client.send(request).await?)
	}

	/// Completes the password reset flow.
	pub async fn confirm_password_reset(
		&self,
		payload: &PasswordResetConfirm,
	) -> Result<Acknowledgement> {
		let request = ApiRequest::post(PASSWORD_RESET_CONFIRM).anonymous().json(payload)?;

		json_or_default(&self.client.send(request).await?)
	}

	/// Fetches the signed-in user's profile.
	pub async fn profile(&self) -> Result<Profile> {
		self.client.send_json(ApiRequest::get(PROFILES)).await
	}

	/// Applies a partial profile update.
	pub async fn update_profile(&self, changes: &Map<String, Value>) -> Result<Profile> {
		self.client.send_json(ApiRequest::patch(PROFILES).json(changes)?).await
	}

	/// Returns `true` when an access token is currently stored.
	pub async fn is_authenticated(&self) -> Result<bool> {
		Ok(self.client.store.access_token().await?.is_some())
	}

	/// Signs out locally by purging every stored credential.
	///
	/// Waits for an in-flight refresh to finish first, so its rotation cannot resurrect the
	/// purged tokens.
	pub async fn logout(&self) -> Result<()> {
		self.client.clear_credentials().await?;

		Ok(())
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn login_payload_redacts_password_in_debug() {
		let payload = LoginRequest::new("student@example.com", "hunter2");
		let rendered = format!("{payload:?}");

		assert!(rendered.contains("student@example.com"));
		assert!(!rendered.contains("hunter2"));
	}

	#[test]
	fn otp_outcome_tokens_are_optional() {
		let plain: OtpOutcome = serde_json::from_str(r#"{"message":"Verified."}"#)
			.expect("Message-only OTP payload should decode.");

		assert_eq!(plain.tokens, None);

		let signed_in: OtpOutcome =
			serde_json::from_str(r#"{"detail":"Verified.","access":"a-1","refresh":"r-1"}"#)
				.expect("Token-bearing OTP payload should decode.");

		assert_eq!(signed_in.tokens, Some(TokenPair::new("a-1", "r-1")));
		assert_eq!(signed_in.message.as_deref(), Some("Verified."));
	}

	#[test]
	fn profile_keeps_unknown_fields() {
		let profile: Profile = serde_json::from_str(
			r#"{"email":"s@example.com","role":"institution","institution_name":"North College"}"#,
		)
		.expect("Profile payload should decode.");

		assert_eq!(profile.role, Some(AccountRole::Institution));
		assert_eq!(profile.extra.get("institution_name"), Some(&Value::from("North College")));
	}
}
