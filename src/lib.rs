//! Authenticated API client for the Career Compass backend: bearer injection, a singleflight
//! refresh-and-retry policy, and a credential store spanning cookie and persistent backends.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod session;
pub mod store;
#[cfg(any(test, feature = "test"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// self
	use crate::{
		config::ClientConfig,
		error::TransportError,
		http::{ApiTransport, HttpRequest, HttpResponse, TransportFuture},
	};
	#[cfg(feature = "reqwest")]
	use crate::{
		client::ApiClient,
		http::ReqwestHttpClient,
		store::{CookieJar, CredentialStore, MemoryStore},
	};

	#[cfg(feature = "reqwest")]
	/// Client type alias used by reqwest-backed tests.
	pub type ReqwestTestClient = ApiClient<ReqwestHttpClient>;

	type Responder = dyn Fn(RecordedRequest) -> TransportFuture<'static> + Send + Sync;

	/// Summary of a request observed by [`ScriptedTransport`].
	#[derive(Clone, Debug, PartialEq, Eq)]
	pub struct RecordedRequest {
		/// HTTP method.
		pub method: String,
		/// Absolute target URI.
		pub uri: String,
		/// `Authorization` header value, if any.
		pub authorization: Option<String>,
		/// Raw request body.
		pub body: Vec<u8>,
	}

	/// In-process transport that records every request and answers through a closure.
	pub struct ScriptedTransport {
		requests: Mutex<Vec<RecordedRequest>>,
		respond: Box<Responder>,
	}
	impl ScriptedTransport {
		/// Creates a transport answering every request with `respond`.
		pub fn new<F, Fut>(respond: F) -> Self
		where
			F: 'static + Fn(RecordedRequest) -> Fut + Send + Sync,
			Fut: 'static + Future<Output = Result<HttpResponse, TransportError>> + Send,
		{
			Self {
				requests: Mutex::new(Vec::new()),
				respond: Box::new(move |request| -> TransportFuture<'static> {
					Box::pin(respond(request))
				}),
			}
		}

		/// Requests observed so far, in dispatch order.
		pub fn requests(&self) -> Vec<RecordedRequest> {
			self.requests.lock().clone()
		}

		/// Number of requests observed so far.
		pub fn calls(&self) -> usize {
			self.requests.lock().len()
		}
	}
	impl ApiTransport for ScriptedTransport {
		fn execute(&self, request: HttpRequest) -> TransportFuture<'_> {
			let recorded = RecordedRequest {
				method: request.method().to_string(),
				uri: request.uri().to_string(),
				authorization: request
					.headers()
					.get(::http::header::AUTHORIZATION)
					.and_then(|value| value.to_str().ok())
					.map(str::to_owned),
				body: request.body().clone(),
			};

			self.requests.lock().push(recorded.clone());

			(self.respond)(recorded)
		}
	}

	/// Builds a buffered response with a JSON content type.
	pub fn json_response(status: u16, body: &str) -> HttpResponse {
		::http::Response::builder()
			.status(status)
			.header(::http::header::CONTENT_TYPE, "application/json")
			.body(body.as_bytes().to_vec())
			.expect("Scripted response should build.")
	}

	/// Builds a config pointing at the provided base URL.
	pub fn test_config(base_url: &str) -> ClientConfig {
		ClientConfig::builder()
			.base_url(Url::parse(base_url).expect("Failed to parse test base URL."))
			.build()
			.expect("Failed to build client config for tests.")
	}

	#[cfg(feature = "reqwest")]
	/// Constructs an [`ApiClient`] backed by an in-memory cookie jar and persistent store, using
	/// the reqwest transport for both the API and refresh channels.
	pub fn build_reqwest_test_client(base_url: &str) -> (ReqwestTestClient, Arc<CredentialStore>) {
		let config = test_config(base_url);
		let store = Arc::new(CredentialStore::new(
			Arc::new(CookieJar::new(config.cookie_max_age)),
			Arc::new(MemoryStore::default()),
		));
		let client = ApiClient::with_reqwest(config, store.clone())
			.expect("Failed to build reqwest-backed client for tests.");

		(client, store)
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::Arc,
	};

	pub use async_lock::{Mutex as AsyncMutex, RwLock as AsyncRwLock};
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

pub use ::http as http_types;
#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
