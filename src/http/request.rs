//! Immutable request descriptor handed to [`ApiClient::send`](crate::client::ApiClient::send).

// crates.io
use ::http::{
	HeaderMap, HeaderName, HeaderValue, Method,
	header::{AUTHORIZATION, CONTENT_TYPE},
};
// self
use crate::{_prelude::*, auth::TokenSecret, error::ConfigError, http::HttpRequest};

/// How the client treats credentials for a request.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AuthMode {
	/// Attach the stored access token and recover once from `401` via the refresh channel.
	#[default]
	Bearer,
	/// Never attach a stored credential and never refresh (login, registration, OTP, resets).
	Anonymous,
}
impl AuthMode {
	/// Returns `true` when stored credentials participate in the request.
	pub const fn uses_credentials(self) -> bool {
		matches!(self, AuthMode::Bearer)
	}
}

/// Method, path, headers, body, and auth mode describing one logical backend call.
///
/// Descriptors are never mutated by the client; the retry budget lives in
/// [`Attempt`](crate::client::Attempt).
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path relative to the configured base URL; may carry a query string.
	pub path: String,
	/// Caller-supplied headers.
	pub headers: HeaderMap,
	/// Optional request body.
	pub body: Option<Vec<u8>>,
	/// Credential handling for the call.
	pub auth: AuthMode,
}
impl ApiRequest {
	/// Creates a bearer-mode descriptor without headers or body.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			headers: HeaderMap::new(),
			body: None,
			auth: AuthMode::default(),
		}
	}

	/// `GET` descriptor.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// `POST` descriptor.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// `PUT` descriptor.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::PUT, path)
	}

	/// `PATCH` descriptor.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::PATCH, path)
	}

	/// `DELETE` descriptor.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Switches the descriptor to [`AuthMode::Anonymous`].
	pub fn anonymous(mut self) -> Self {
		self.auth = AuthMode::Anonymous;

		self
	}

	/// Adds or replaces a header.
	pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Adds or replaces a header from raw strings.
	pub fn try_header(self, name: &str, value: &str) -> Result<Self, ConfigError> {
		let invalid = || ConfigError::InvalidHeader { name: name.to_owned() };
		let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| invalid())?;
		let value = HeaderValue::from_str(value).map_err(|_| invalid())?;

		Ok(self.header(name, value))
	}

	/// Sets an explicit `Authorization: Bearer` header; the stored credential is then not read
	/// for the first attempt.
	pub fn bearer(self, token: &TokenSecret) -> Result<Self, ConfigError> {
		let value = bearer_value(token)?;

		Ok(self.header(AUTHORIZATION, value))
	}

	/// Serializes `body` as JSON and sets the matching content type.
	pub fn json<T>(mut self, body: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		let bytes =
			serde_json::to_vec(body).map_err(|source| ConfigError::RequestBody { source })?;

		self.body = Some(bytes);

		Ok(self.header(CONTENT_TYPE, HeaderValue::from_static("application/json")))
	}

	/// Returns `true` when the caller set an `Authorization` header explicitly.
	pub fn has_authorization(&self) -> bool {
		self.headers.contains_key(AUTHORIZATION)
	}

	/// Builds the wire request for `url`, attaching `credential` as the bearer token when given.
	pub fn to_http(
		&self,
		url: &Url,
		credential: Option<&TokenSecret>,
	) -> Result<HttpRequest, ConfigError> {
		let mut headers = self.headers.clone();

		if let Some(token) = credential {
			headers.insert(AUTHORIZATION, bearer_value(token)?);
		}

		let mut request = ::http::Request::builder()
			.method(self.method.clone())
			.uri(url.as_str())
			.body(self.body.clone().unwrap_or_default())?;

		*request.headers_mut() = headers;

		Ok(request)
	}
}

pub(crate) fn bearer_value(token: &TokenSecret) -> Result<HeaderValue, ConfigError> {
	let mut value = HeaderValue::from_str(&token.bearer())
		.map_err(|_| ConfigError::InvalidHeader { name: AUTHORIZATION.to_string() })?;

	value.set_sensitive(true);

	Ok(value)
}
