//! Refresh channel and the singleflight renewal path used after a `401`.
//!
//! The [`RefreshChannel`] owns its own transport and never routes through
//! [`ApiClient::send`], so an expired refresh token cannot recurse into another refresh.
//! Renewals are serialized behind one guard per client (shared by clones): a request
//! that waited on the guard first checks whether the stored access token already differs
//! from the one it observed before dispatch and, if so, reuses it instead of refreshing
//! again. Logout and login writes take the same guard, so a purge is never overwritten by a
//! renewal that was already in flight.

// crates.io
use ::http::{
	Method,
	header::{ACCEPT, CONTENT_TYPE},
};
// self
use crate::{
	_prelude::*,
	auth::{TokenPair, TokenSecret},
	client::ApiClient,
	error::{ConfigError, RefreshError},
	http::{ApiResponse, ApiTransport},
	obs::{self, CallKind, CallOutcome, CallSpan},
	store::StoreError,
};

/// Tokens returned by a successful refresh.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RefreshGrant {
	/// New access token.
	pub access: TokenSecret,
	/// Rotated refresh token, when the backend rotates on refresh.
	#[serde(default)]
	pub refresh: Option<TokenSecret>,
}

#[derive(Serialize)]
struct RefreshBody<'a> {
	refresh: &'a str,
}

/// Non-intercepted call path that exchanges a refresh token for a new access token.
pub struct RefreshChannel<C>
where
	C: ?Sized + ApiTransport,
{
	/// Transport dedicated to refresh calls.
	pub transport: Arc<C>,
	/// Absolute refresh endpoint.
	pub endpoint: Url,
}
impl<C> RefreshChannel<C>
where
	C: ?Sized + ApiTransport,
{
	/// Creates a channel posting to `endpoint` through `transport`.
	pub fn new(transport: impl Into<Arc<C>>, endpoint: Url) -> Self {
		Self { transport: transport.into(), endpoint }
	}

	/// Posts `{"refresh": <token>}` and returns the issued grant.
	pub async fn exchange(&self, refresh: &TokenSecret) -> Result<RefreshGrant, RefreshError> {
		const KIND: CallKind = CallKind::Refresh;

		let span = CallSpan::new(KIND, "exchange");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.exchange_inner(refresh)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	async fn exchange_inner(&self, refresh: &TokenSecret) -> Result<RefreshGrant, RefreshError> {
		let body = serde_json::to_vec(&RefreshBody { refresh: refresh.expose() })
			.map_err(|source| ConfigError::RequestBody { source })?;
		let request = ::http::Request::builder()
			.method(Method::POST)
			.uri(self.endpoint.as_str())
			.header(CONTENT_TYPE, "application/json")
			.header(ACCEPT, "application/json")
			.body(body)
			.map_err(ConfigError::from)?;
		let response = ApiResponse::from(self.transport.execute(request).await?);

		if !response.is_success() {
			return Err(RefreshError::Rejected {
				status: response.status.as_u16(),
				message: response.text(),
			});
		}

		let mut de = serde_json::Deserializer::from_slice(&response.body);
		let grant: RefreshGrant = serde_path_to_error::deserialize(&mut de)
			.map_err(|source| RefreshError::MalformedResponse { source })?;

		if grant.access.is_empty() {
			return Err(RefreshError::EmptyAccessToken);
		}

		Ok(grant)
	}
}
impl<C> Clone for RefreshChannel<C>
where
	C: ?Sized + ApiTransport,
{
	fn clone(&self) -> Self {
		Self { transport: self.transport.clone(), endpoint: self.endpoint.clone() }
	}
}

impl<C> ApiClient<C>
where
	C: ?Sized + ApiTransport,
{
	/// Returns a usable access token after `rejected` was refused by the backend.
	///
	/// `rejected` is the stored access token the request observed before dispatch. On failure
	/// every credential has already been purged when this returns.
	pub(crate) async fn renew_access(
		&self,
		rejected: Option<&TokenSecret>,
	) -> Result<TokenSecret, RefreshError> {
		let _singleflight = self.refresh_guard.lock().await;

		match self.store.access_token().await {
			Ok(Some(current)) if rejected != Some(&current) => {
				self.refresh_metrics.record_reuse();

				return Ok(current);
			},
			Ok(_) => self.refresh_metrics.record_attempt(),
			Err(e) => return Err(self.purge_after_failure(e.into()).await),
		}

		match self.refresh_under_guard().await {
			Ok(access) => {
				self.refresh_metrics.record_success();

				Ok(access)
			},
			Err(err) => Err(self.purge_after_failure(err).await),
		}
	}

	/// Purges every credential while the refresh guard is held, so no renewal or login can
	/// interleave with the purge.
	pub(crate) async fn clear_credentials(&self) -> Result<(), StoreError> {
		let _singleflight = self.refresh_guard.lock().await;

		self.store.clear().await
	}

	/// Persists a freshly issued pair while the refresh guard is held.
	pub(crate) async fn install_tokens(&self, pair: TokenPair) -> Result<(), StoreError> {
		let _singleflight = self.refresh_guard.lock().await;

		self.store.store_pair(pair).await
	}

	async fn purge_after_failure(&self, err: RefreshError) -> RefreshError {
		self.refresh_metrics.record_failure();

		if let Err(purge_err) = self.store.clear().await {
			obs::trace_purge_failed(&purge_err);
		}

		err
	}

	async fn refresh_under_guard(&self) -> Result<TokenSecret, RefreshError> {
		let refresh = self.store.refresh_token().await?.ok_or(RefreshError::MissingRefreshToken)?;
		let grant = self.refresh_channel.exchange(&refresh).await?;

		self.store.rotate(grant.access.clone(), grant.refresh).await?;

		Ok(grant.access)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn grant_accepts_optional_rotation() {
		let grant: RefreshGrant = serde_json::from_str(r#"{"access":"a-2"}"#)
			.expect("Access-only refresh payload should deserialize.");

		assert_eq!(grant.access.expose(), "a-2");
		assert_eq!(grant.refresh, None);

		let rotated: RefreshGrant = serde_json::from_str(r#"{"access":"a-3","refresh":"r-3"}"#)
			.expect("Rotating refresh payload should deserialize.");

		assert_eq!(rotated.refresh.map(|secret| secret.expose().to_owned()), Some("r-3".into()));
	}

	#[test]
	fn refresh_body_uses_refresh_field() {
		let body = serde_json::to_string(&RefreshBody { refresh: "r-1" })
			.expect("Refresh body should serialize.");

		assert_eq!(body, r#"{"refresh":"r-1"}"#);
	}
}
