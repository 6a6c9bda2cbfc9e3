#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use url::Url;
// self
use compass_client::{
	auth::{TokenPair, TokenSecret},
	client::{ApiClient, ReqwestApiClient},
	config::ClientConfig,
	error::{Error, RefreshError},
	http::ApiRequest,
	http_types::StatusCode,
	session::RecordingObserver,
	store::{CookieJar, CredentialStore, MemoryStore},
};

struct Harness {
	server: MockServer,
	client: ReqwestApiClient,
	store: Arc<CredentialStore>,
	observer: Arc<RecordingObserver>,
}

async fn harness() -> Harness {
	let server = MockServer::start_async().await;
	let config = ClientConfig::builder()
		.base_url(Url::parse(&server.url("/api/")).expect("Mock base URL should parse."))
		.build()
		.expect("Client config should build.");
	let store = Arc::new(CredentialStore::new(
		Arc::new(CookieJar::new(config.cookie_max_age)),
		Arc::new(MemoryStore::default()),
	));
	let observer = Arc::new(RecordingObserver::default());
	let client = ApiClient::with_reqwest(config, store.clone())
		.expect("Reqwest-backed client should build.")
		.with_observer(observer.clone());

	Harness { server, client, store, observer }
}

#[tokio::test]
async fn anonymous_visitor_gets_plain_not_found() {
	let h = harness().await;
	let missing = h
		.server
		.mock_async(|when, then| {
			when.method(GET).path("/api/chatbot/sessions/").header_missing("authorization");
			then.status(404).body("{\"detail\":\"Not found.\"}");
		})
		.await;
	let refresh = h
		.server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/token/refresh/");
			then.status(200).body("{\"access\":\"unused\"}");
		})
		.await;
	let err = h
		.client
		.send(ApiRequest::get("chatbot/sessions/"))
		.await
		.expect_err("404 should surface as a status error.");

	assert_eq!(err.status(), Some(StatusCode::NOT_FOUND));

	missing.assert_async().await;
	refresh.assert_calls_async(0).await;
}

#[tokio::test]
async fn expired_access_is_refreshed_and_retried_once() {
	let h = harness().await;

	h.store
		.store_pair(TokenPair::new("expired-access", "refresh-1"))
		.await
		.expect("Seeding the credential store should succeed.");

	let rejected = h
		.server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/auth/profiles/")
				.header("authorization", "Bearer expired-access");
			then.status(401).body("{\"code\":\"token_not_valid\"}");
		})
		.await;
	let refresh = h
		.server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/auth/token/refresh/")
				.header("content-type", "application/json")
				.header_missing("authorization");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access\":\"renewed-access\",\"refresh\":\"refresh-2\"}");
		})
		.await;
	let accepted = h
		.server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/auth/profiles/")
				.header("authorization", "Bearer renewed-access");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"email\":\"student@example.com\"}");
		})
		.await;
	let response = h
		.client
		.send(ApiRequest::get("auth/profiles/"))
		.await
		.expect("Request should succeed after the refresh.");

	assert!(response.is_success());

	rejected.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;
	accepted.assert_calls_async(1).await;

	let credentials = h.store.snapshot().await.expect("Store read should succeed.");

	assert_eq!(credentials.access, Some(TokenSecret::new("renewed-access")));
	assert_eq!(credentials.refresh, Some(TokenSecret::new("refresh-2")));
	assert_eq!(h.observer.count(), 0);
}

#[tokio::test]
async fn repeated_unauthorized_does_not_refresh_twice() {
	let h = harness().await;

	h.store
		.store_pair(TokenPair::new("access-1", "refresh-1"))
		.await
		.expect("Seeding the credential store should succeed.");

	let forbidden = h
		.server
		.mock_async(|when, then| {
			when.method(GET).path("/api/auth/profiles/");
			then.status(401).body("{\"detail\":\"Not allowed.\"}");
		})
		.await;
	let refresh = h
		.server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/token/refresh/");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access\":\"access-2\"}");
		})
		.await;
	let err = h
		.client
		.send(ApiRequest::get("auth/profiles/"))
		.await
		.expect_err("Second 401 should be final.");

	assert!(err.is_unauthorized());
	assert!(!err.is_session_invalidated());

	forbidden.assert_calls_async(2).await;
	refresh.assert_calls_async(1).await;
}

#[tokio::test]
async fn missing_refresh_token_clears_stores_and_notifies_once() {
	let h = harness().await;

	h.store
		.replace_access(TokenSecret::new("orphan-access"))
		.await
		.expect("Seeding the credential store should succeed.");

	let rejected = h
		.server
		.mock_async(|when, then| {
			when.method(GET).path("/api/chatbot/sessions/");
			then.status(401);
		})
		.await;
	let refresh = h
		.server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/token/refresh/");
			then.status(200).body("{\"access\":\"unused\"}");
		})
		.await;
	let err = h
		.client
		.send(ApiRequest::get("chatbot/sessions/"))
		.await
		.expect_err("Session should be invalidated.");

	match err {
		Error::SessionInvalidated(event) => {
			assert_eq!(event.login_route, "/login");
			assert!(matches!(event.source, RefreshError::MissingRefreshToken));
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	rejected.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;

	assert!(h.store.snapshot().await.expect("Store read should succeed.").is_empty());
	assert_eq!(h.observer.count(), 1);
	assert_eq!(h.observer.last_route().as_deref(), Some("/login"));
}

#[tokio::test]
async fn non_auth_failures_skip_refresh() {
	let h = harness().await;

	h.store
		.store_pair(TokenPair::new("access-1", "refresh-1"))
		.await
		.expect("Seeding the credential store should succeed.");

	let throttled = h
		.server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/chatbot/sessions/")
				.header("authorization", "Bearer access-1");
			then.status(429).header("retry-after", "30");
		})
		.await;
	let refresh = h
		.server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/token/refresh/");
			then.status(200).body("{\"access\":\"unused\"}");
		})
		.await;
	let err = h
		.client
		.send(ApiRequest::post("chatbot/sessions/"))
		.await
		.expect_err("429 should surface as a status error.");

	match err {
		Error::Status(status) => {
			assert_eq!(status.status, StatusCode::TOO_MANY_REQUESTS);
			assert_eq!(status.retry_after, Some(time::Duration::seconds(30)));
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	throttled.assert_async().await;
	refresh.assert_calls_async(0).await;
	assert_eq!(
		h.store.access_token().await.expect("Store read should succeed."),
		Some(TokenSecret::new("access-1"))
	);
}
