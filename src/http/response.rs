//! Buffered backend response returned by the client.

// crates.io
use ::http::{HeaderMap, StatusCode};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::StatusError,
	http::{HttpResponse, parse_retry_after},
};

/// Status, headers, and body of a completed call.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// Status code returned by the backend.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw response body.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Decodes the body as JSON, reporting the failing path on error.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| Error::Decode { status: self.status.as_u16(), source })
	}

	/// Returns the body as lossy UTF-8.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Returns the `Retry-After` hint, if any.
	pub fn retry_after(&self) -> Option<Duration> {
		parse_retry_after(&self.headers)
	}

	/// Converts non-2xx responses into [`StatusError`].
	pub fn error_for_status(self) -> Result<Self, StatusError> {
		if self.is_success() {
			Ok(self)
		} else {
			Err(StatusError { status: self.status, body: self.text(), retry_after: self.retry_after() })
		}
	}
}
impl From<HttpResponse> for ApiResponse {
	fn from(response: HttpResponse) -> Self {
		let (parts, body) = response.into_parts();

		Self { status: parts.status, headers: parts.headers, body }
	}
}
