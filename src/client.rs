//! Authenticated HTTP client: bearer injection plus a one-shot refresh-and-retry policy.
//!
//! [`ApiClient::send`] resolves the access token (cookie first, then the persistent store),
//! attaches it, and dispatches the descriptor. A `401 Unauthorized` on the first attempt
//! triggers one pass through the refresh path: the singleflight guard is taken, the
//! [`RefreshChannel`] exchanges the stored refresh token, both storage locations are
//! rewritten, and the descriptor is re-sent once. The second response is final. A failed
//! refresh purges every credential and surfaces as [`Error::SessionInvalidated`].

mod metrics;
mod refresh;

pub use metrics::RefreshMetrics;
pub use refresh::*;

// crates.io
use ::http::StatusCode;
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	config::ClientConfig,
	error::{ConfigError, RefreshError},
	http::{ApiRequest, ApiResponse, ApiTransport},
	obs::{self, CallKind, CallOutcome, CallSpan},
	session::{SessionInvalidated, SessionObserver},
	store::CredentialStore,
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestApiClient = ApiClient<ReqwestHttpClient>;

/// Retry budget of one logical request.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Attempt {
	/// First dispatch of the descriptor.
	Initial,
	/// The single re-send after a successful refresh.
	Retried,
}
impl Attempt {
	/// Returns the following attempt, or `None` once the budget is spent.
	pub const fn next(self) -> Option<Self> {
		match self {
			Attempt::Initial => Some(Attempt::Retried),
			Attempt::Retried => None,
		}
	}
}

/// Authenticated client shared by every caller of the backend.
///
/// Cloning is cheap; clones share the transports, the credential store, the refresh counters,
/// and the singleflight refresh guard.
pub struct ApiClient<C>
where
	C: ?Sized + ApiTransport,
{
	/// Validated configuration.
	pub config: ClientConfig,
	/// Transport used for intercepted API calls.
	pub http_client: Arc<C>,
	/// Dedicated, non-intercepted refresh channel.
	pub refresh_channel: RefreshChannel<C>,
	/// Shared credential capability.
	pub store: Arc<CredentialStore>,
	/// Navigation hook notified when a session is invalidated.
	pub observer: Option<Arc<dyn SessionObserver>>,
	/// Shared counters for refresh outcomes.
	pub refresh_metrics: Arc<RefreshMetrics>,
	refresh_guard: Arc<AsyncMutex<()>>,
}
impl<C> ApiClient<C>
where
	C: ?Sized + ApiTransport,
{
	/// Creates a client over caller-provided API and refresh transports.
	pub fn with_transports(
		config: ClientConfig,
		store: Arc<CredentialStore>,
		http_client: impl Into<Arc<C>>,
		refresh_client: impl Into<Arc<C>>,
	) -> Result<Self, ConfigError> {
		let refresh_channel = RefreshChannel::new(refresh_client, config.refresh_endpoint()?);

		Ok(Self {
			config,
			http_client: http_client.into(),
			refresh_channel,
			store,
			observer: None,
			refresh_metrics: Default::default(),
			refresh_guard: Arc::new(AsyncMutex::new(())),
		})
	}

	/// Sets or replaces the navigation hook.
	pub fn with_observer(mut self, observer: Arc<dyn SessionObserver>) -> Self {
		self.observer = Some(observer);

		self
	}

	/// Shared credential store.
	pub fn credentials(&self) -> &Arc<CredentialStore> {
		&self.store
	}

	/// Refresh outcome counters.
	pub fn refresh_metrics(&self) -> &RefreshMetrics {
		&self.refresh_metrics
	}

	/// Sends the descriptor, recovering once from an expired access token.
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		const KIND: CallKind = CallKind::Request;

		let span = CallSpan::new(KIND, "send");

		obs::record_call_outcome(KIND, CallOutcome::Attempt);

		let result = span.instrument(self.send_within_budget(&request)).await;

		match &result {
			Ok(_) => obs::record_call_outcome(KIND, CallOutcome::Success),
			Err(_) => obs::record_call_outcome(KIND, CallOutcome::Failure),
		}

		result
	}

	/// Sends the descriptor and decodes a successful body as JSON.
	pub async fn send_json<T>(&self, request: ApiRequest) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.send(request).await?.json()
	}

	async fn send_within_budget(&self, request: &ApiRequest) -> Result<ApiResponse> {
		let url = self.config.endpoint(&request.path)?;
		let intercepted = request.auth.uses_credentials();
		// Read behind explicit headers too; a 401 is always compared against the stored token.
		let mut observed = if intercepted { self.store.access_token().await? } else { None };
		let mut credential = if request.has_authorization() { None } else { observed.clone() };
		let mut attempt = Attempt::Initial;

		loop {
			let wire = request.to_http(&url, credential.as_ref())?;
			let response = ApiResponse::from(self.http_client.execute(wire).await?);

			if response.status != StatusCode::UNAUTHORIZED || !intercepted {
				return response.error_for_status().map_err(Error::from);
			}

			let Some(next) = attempt.next() else {
				return response.error_for_status().map_err(Error::from);
			};

			attempt = next;

			match self.renew_access(observed.take().as_ref()).await {
				Ok(renewed) => {
					obs::trace_retry(request.method.as_str(), &request.path);
					obs::record_call_outcome(CallKind::Request, CallOutcome::Retry);

					credential = Some(renewed);
				},
				Err(source) => return Err(self.invalidate_session(source).into()),
			}
		}
	}

	fn invalidate_session(&self, source: RefreshError) -> SessionInvalidated {
		let event = SessionInvalidated::new(self.config.login_route.clone(), source);

		obs::trace_session_invalidated(&event.login_route, &event.source);

		if let Some(observer) = self.observer.as_ref() {
			observer.session_invalidated(&event);
		}

		event
	}
}
#[cfg(feature = "reqwest")]
impl ApiClient<ReqwestHttpClient> {
	/// Creates a client whose API and refresh channels each own a reqwest client bounded by the
	/// configured timeouts.
	pub fn with_reqwest(
		config: ClientConfig,
		store: Arc<CredentialStore>,
	) -> Result<Self, ConfigError> {
		let http_client = ReqwestHttpClient::with_timeout(config.request_timeout)?;
		let refresh_client = ReqwestHttpClient::with_timeout(config.refresh_timeout)?;

		Self::with_transports(config, store, http_client, refresh_client)
	}
}
impl<C> Clone for ApiClient<C>
where
	C: ?Sized + ApiTransport,
{
	fn clone(&self) -> Self {
		Self {
			config: self.config.clone(),
			http_client: self.http_client.clone(),
			refresh_channel: self.refresh_channel.clone(),
			store: self.store.clone(),
			observer: self.observer.clone(),
			refresh_metrics: self.refresh_metrics.clone(),
			refresh_guard: self.refresh_guard.clone(),
		}
	}
}
impl<C> Debug for ApiClient<C>
where
	C: ?Sized + ApiTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("ApiClient")
			.field("base_url", &self.config.base_url.as_str())
			.field("refresh_endpoint", &self.refresh_channel.endpoint.as_str())
			.field("observer_set", &self.observer.is_some())
			.finish()
	}
}
