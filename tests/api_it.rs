#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use serde_json::{Map, Value};
use url::Url;
// self
use compass_client::{
	api::{AuthApi, ChatSessionId, ChatbotApi, LoginRequest, OtpVerification},
	auth::{TokenPair, TokenSecret},
	client::{ApiClient, ReqwestApiClient},
	config::ClientConfig,
	store::CredentialStore,
};

async fn client(server: &MockServer) -> (ReqwestApiClient, Arc<CredentialStore>) {
	let config = ClientConfig::builder()
		.base_url(Url::parse(&server.url("/api/")).expect("Mock base URL should parse."))
		.build()
		.expect("Client config should build.");
	let store = Arc::new(CredentialStore::in_memory(config.cookie_max_age));
	let client =
		ApiClient::with_reqwest(config, store.clone()).expect("Reqwest-backed client should build.");

	(client, store)
}

#[tokio::test]
async fn login_persists_tokens_and_logout_purges_them() {
	let server = MockServer::start_async().await;
	let (client, store) = client(&server).await;
	let auth = AuthApi::new(client);
	let login = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/api/auth/login/")
				.header("content-type", "application/json")
				.header_missing("authorization");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access\":\"a-1\",\"refresh\":\"r-1\",\"user\":{\"email\":\"s@example.com\"}}");
		})
		.await;
	let response = auth
		.login(&LoginRequest::new("s@example.com", "secret"))
		.await
		.expect("Login should succeed.");

	login.assert_async().await;

	assert_eq!(response.tokens, TokenPair::new("a-1", "r-1"));
	assert!(auth.is_authenticated().await.expect("Store read should succeed."));

	let credentials = store.snapshot().await.expect("Store read should succeed.");

	assert_eq!(credentials.access, Some(TokenSecret::new("a-1")));
	assert_eq!(credentials.refresh, Some(TokenSecret::new("r-1")));

	auth.logout().await.expect("Logout should succeed.");

	assert!(!auth.is_authenticated().await.expect("Store read should succeed."));
	assert!(store.snapshot().await.expect("Store read should succeed.").is_empty());
}

#[tokio::test]
async fn failed_login_leaves_store_untouched() {
	let server = MockServer::start_async().await;
	let (client, store) = client(&server).await;
	let auth = AuthApi::new(client);
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login/");
			then.status(401).body("{\"detail\":\"No active account found.\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/token/refresh/");
			then.status(200).body("{\"access\":\"unused\"}");
		})
		.await;
	let err = auth
		.login(&LoginRequest::new("s@example.com", "wrong"))
		.await
		.expect_err("Bad credentials should be rejected.");

	assert!(err.is_unauthorized());

	login.assert_async().await;
	refresh.assert_calls_async(0).await;

	assert!(store.snapshot().await.expect("Store read should succeed.").is_empty());
}

#[tokio::test]
async fn otp_verification_signs_in_when_tokens_are_issued() {
	let server = MockServer::start_async().await;
	let (client, store) = client(&server).await;
	let auth = AuthApi::new(client);
	let verify = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/verify-otp/");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"message\":\"Verified.\",\"access\":\"a-otp\",\"refresh\":\"r-otp\"}");
		})
		.await;
	let outcome = auth
		.verify_otp(&OtpVerification { email: "s@example.com".into(), otp: "123456".into() })
		.await
		.expect("OTP verification should succeed.");

	verify.assert_async().await;

	assert_eq!(outcome.message.as_deref(), Some("Verified."));
	assert_eq!(
		store.access_token().await.expect("Store read should succeed."),
		Some(TokenSecret::new("a-otp"))
	);
}

#[tokio::test]
async fn profile_update_sends_bearer_and_patch_body() {
	let server = MockServer::start_async().await;
	let (client, store) = client(&server).await;
	let auth = AuthApi::new(client);

	store
		.store_pair(TokenPair::new("a-1", "r-1"))
		.await
		.expect("Seeding the credential store should succeed.");

	let patch = server
		.mock_async(|when, then| {
			when.method(PATCH)
				.path("/api/auth/profiles/")
				.header("authorization", "Bearer a-1")
				.header("content-type", "application/json");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"email\":\"s@example.com\",\"full_name\":\"New Name\",\"gpa\":3.8}");
		})
		.await;
	let mut changes = Map::new();

	changes.insert("full_name".into(), Value::from("New Name"));

	let profile = auth.update_profile(&changes).await.expect("Profile update should succeed.");

	patch.assert_async().await;

	assert_eq!(profile.full_name.as_deref(), Some("New Name"));
	assert_eq!(profile.extra.get("gpa"), Some(&Value::from(3.8)));
}

#[tokio::test]
async fn chatbot_session_lifecycle() {
	let server = MockServer::start_async().await;
	let (client, store) = client(&server).await;
	let chatbot = ChatbotApi::new(client);

	store
		.store_pair(TokenPair::new("a-1", "r-1"))
		.await
		.expect("Seeding the credential store should succeed.");

	let create = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/chatbot/sessions/").header("authorization", "Bearer a-1");
			then.status(201)
				.header("content-type", "application/json")
				.body("{\"id\":12,\"title\":\"Choosing a major\"}");
		})
		.await;
	let message = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/chatbot/sessions/12/messages/");
			then.status(201)
				.header("content-type", "application/json")
				.body("{\"role\":\"assistant\",\"content\":\"Let's look at your interests.\"}");
		})
		.await;
	let delete = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/api/chatbot/sessions/12/");
			then.status(204);
		})
		.await;
	let session = chatbot
		.create_session(Some("Choosing a major"))
		.await
		.expect("Session creation should succeed.");

	assert_eq!(session.id, ChatSessionId::new("12"));

	let reply = chatbot
		.send_message(&session.id, "Which majors fit me?")
		.await
		.expect("Message should be answered.");

	assert_eq!(reply.role, "assistant");

	chatbot.delete_session(&session.id).await.expect("Session deletion should succeed.");

	create.assert_async().await;
	message.assert_async().await;
	delete.assert_async().await;
}
