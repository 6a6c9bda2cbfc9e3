//! Demonstrates signing in, recovering from an expired access token, and reading the profile
//! through the default reqwest transport against a local mock backend.

// std
use std::sync::Arc;
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use url::Url;
// self
use compass_client::{
	api::{AuthApi, LoginRequest},
	client::ApiClient,
	config::ClientConfig,
	session::RecordingObserver,
	store::{CookieJar, CredentialStore, MemoryStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/login/");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access\":\"stale-access\",\"refresh\":\"demo-refresh\"}");
		})
		.await;
	let rejected = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/auth/profiles/")
				.header("authorization", "Bearer stale-access");
			then.status(401).body("{\"detail\":\"Token is expired.\"}");
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/api/auth/token/refresh/");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"access\":\"fresh-access\"}");
		})
		.await;
	let profile = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/api/auth/profiles/")
				.header("authorization", "Bearer fresh-access");
			then.status(200)
				.header("content-type", "application/json")
				.body("{\"email\":\"student@example.com\",\"full_name\":\"Demo Student\",\"role\":\"student\"}");
		})
		.await;
	let config = ClientConfig::builder().base_url(Url::parse(&server.url("/api/"))?).build()?;
	let store = Arc::new(CredentialStore::new(
		Arc::new(CookieJar::new(config.cookie_max_age)),
		Arc::new(MemoryStore::default()),
	));
	let observer = Arc::new(RecordingObserver::default());
	let client = ApiClient::with_reqwest(config, store.clone())?.with_observer(observer.clone());
	let auth = AuthApi::new(client);

	auth.login(&LoginRequest::new("student@example.com", "demo-password")).await?;

	let me = auth.profile().await?;

	println!(
		"Signed in as {} after {} refresh(es).",
		me.full_name.as_deref().unwrap_or("<unnamed>"),
		auth.client().refresh_metrics().successes()
	);

	login.assert_async().await;
	rejected.assert_async().await;
	refresh.assert_async().await;
	profile.assert_async().await;

	assert_eq!(observer.count(), 0);

	auth.logout().await?;

	assert!(store.snapshot().await?.is_empty());

	Ok(())
}
