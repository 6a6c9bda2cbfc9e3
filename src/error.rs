//! Client-level error types shared across the transport, store, refresh, and service layers.

// crates.io
use ::http::StatusCode;
// self
use crate::{_prelude::*, session::SessionInvalidated, store::StoreError};

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure outside the refresh path.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeout).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Backend answered with a non-success status.
	#[error(transparent)]
	Status(#[from] StatusError),
	/// Refresh failed; credentials were purged and the host should navigate to the login route.
	#[error(transparent)]
	SessionInvalidated(#[from] SessionInvalidated),

	/// Response body could not be decoded into the requested type.
	#[error("Response body (HTTP {status}) could not be decoded.")]
	Decode {
		/// HTTP status of the response that failed to decode.
		status: u16,
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
}
impl Error {
	/// Returns `true` when the failure carries the session-invalidated marker.
	pub fn is_session_invalidated(&self) -> bool {
		matches!(self, Self::SessionInvalidated(_))
	}

	/// Returns the HTTP status attached to the failure, if the backend produced one.
	pub fn status(&self) -> Option<StatusCode> {
		match self {
			Self::Status(err) => Some(err.status),
			Self::Decode { status, .. } => StatusCode::from_u16(*status).ok(),
			_ => None,
		}
	}

	/// Returns `true` when the backend rejected the credential with `401 Unauthorized`.
	pub fn is_unauthorized(&self) -> bool {
		self.status() == Some(StatusCode::UNAUTHORIZED)
	}
}

/// Configuration and validation failures raised by the client.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] ::http::Error),
	/// Base URL is missing from the builder.
	#[error("Client configuration is missing a base URL.")]
	MissingBaseUrl,
	/// Base URL cannot be parsed.
	#[error("Base URL is invalid.")]
	InvalidBaseUrl {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Base URL is not an absolute http(s) URL.
	#[error("Base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// URL that failed validation.
		url: String,
	},
	/// Endpoint path cannot be joined onto the base URL.
	#[error("Endpoint `{path}` cannot be resolved against the base URL.")]
	InvalidEndpoint {
		/// Relative path that failed to resolve.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// A required value was empty.
	#[error("Configuration field `{field}` cannot be empty.")]
	EmptyField {
		/// Name of the offending field.
		field: &'static str,
	},
	/// A timeout was configured as zero.
	#[error("Configuration field `{field}` must be a positive duration.")]
	ZeroTimeout {
		/// Name of the offending field.
		field: &'static str,
	},
	/// Cookie max-age is not positive or exceeds
	/// [`CookieJar::MAX_MAX_AGE`](crate::store::CookieJar::MAX_MAX_AGE).
	#[error("Cookie max-age {max_age} must be positive and at most 400 days.")]
	InvalidCookieMaxAge {
		/// Rejected max-age.
		max_age: Duration,
	},
	/// Required environment variable is absent.
	#[error("Environment variable `{var}` is not set.")]
	MissingEnv {
		/// Variable name.
		var: &'static str,
	},
	/// Environment variable holds an unparsable value.
	#[error("Environment variable `{var}` holds an invalid value: {value}.")]
	InvalidEnv {
		/// Variable name.
		var: &'static str,
		/// Raw value read from the environment.
		value: String,
	},
	/// Header value contains characters HTTP does not allow.
	#[error("Header `{name}` has an invalid value.")]
	InvalidHeader {
		/// Header name.
		name: String,
	},
	/// Request body could not be serialized.
	#[error("Request body could not be serialized to JSON.")]
	RequestBody {
		/// Underlying serialization failure.
		#[source]
		source: serde_json::Error,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO, timeouts).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the backend.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The call exceeded its configured wall-clock timeout.
	#[error("Backend call timed out.")]
	Timeout {
		/// Transport-specific timeout error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the backend.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Wraps a transport-specific timeout error.
	pub fn timeout(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Timeout { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		if e.is_timeout() { Self::timeout(e) } else { Self::network(e) }
	}
}

/// Non-success HTTP response surfaced to the caller untouched.
#[derive(Debug, ThisError)]
#[error("Backend responded with HTTP {status}.")]
pub struct StatusError {
	/// Status code returned by the backend.
	pub status: StatusCode,
	/// Response body decoded as lossy UTF-8.
	pub body: String,
	/// Retry-After hint from upstream, if supplied.
	pub retry_after: Option<Duration>,
}

/// Terminal failures of the refresh channel.
#[derive(Debug, ThisError)]
pub enum RefreshError {
	/// The persistent store holds no refresh credential.
	#[error("No refresh token is stored.")]
	MissingRefreshToken,
	/// Refresh endpoint refused the exchange.
	#[error("Refresh endpoint rejected the token with HTTP {status}: {message}.")]
	Rejected {
		/// HTTP status returned by the refresh endpoint.
		status: u16,
		/// Body returned alongside the refusal.
		message: String,
	},
	/// Refresh endpoint returned a body without a usable access token.
	#[error("Refresh endpoint returned a malformed body.")]
	MalformedResponse {
		/// Structured parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
	},
	/// Refresh endpoint returned an empty access token.
	#[error("Refresh endpoint returned an empty access token.")]
	EmptyAccessToken,
	/// Transport failure while calling the refresh endpoint.
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Credential store failed while reading or rotating tokens.
	#[error(transparent)]
	Storage(#[from] StoreError),
	/// Refresh request could not be constructed.
	#[error(transparent)]
	Config(#[from] ConfigError),
}
