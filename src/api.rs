//! Thin typed wrappers over backend endpoints used by the application's forms and views.
//!
//! Every call funnels through [`ApiClient::send`](crate::client::ApiClient::send), so the
//! wrappers inherit bearer injection and the refresh-and-retry policy. Pre-authentication
//! endpoints are sent in [`AuthMode::Anonymous`](crate::http::AuthMode::Anonymous).

pub mod auth;
pub mod chatbot;

pub use auth::*;
pub use chatbot::*;

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{_prelude::*, http::ApiResponse};

/// Free-form confirmation returned by endpoints that only acknowledge a request.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct Acknowledgement {
	/// Human-readable message (`message` or `detail` in the payload).
	#[serde(default, alias = "detail")]
	pub message: Option<String>,
}

/// Decodes a JSON body, treating an empty body (e.g. `204 No Content`) as `T::default()`.
pub(crate) fn json_or_default<T>(response: &ApiResponse) -> Result<T>
where
	T: Default + DeserializeOwned,
{
	if response.body.iter().all(u8::is_ascii_whitespace) {
		return Ok(T::default());
	}

	response.json()
}
