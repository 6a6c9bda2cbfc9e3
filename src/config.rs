//! Validated client configuration: backend base URL, refresh endpoint, login route, timeouts.

// std
use std::{env, time::Duration as StdDuration};
// self
use crate::{_prelude::*, error::ConfigError, store::CookieJar};

/// Immutable configuration consumed by [`ApiClient`](crate::client::ApiClient).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientConfig {
	/// Absolute base URL every request path is resolved against; always ends with `/`.
	pub base_url: Url,
	/// Path of the refresh endpoint, relative to `base_url`.
	pub refresh_path: String,
	/// Unauthenticated route the host navigates to when the session is invalidated.
	pub login_route: String,
	/// Wall-clock timeout applied to every API call.
	pub request_timeout: StdDuration,
	/// Wall-clock timeout applied to every refresh call.
	pub refresh_timeout: StdDuration,
	/// Lifetime of access tokens written to the cookie jar.
	pub cookie_max_age: Duration,
}
impl ClientConfig {
	/// Default refresh endpoint path.
	pub const DEFAULT_REFRESH_PATH: &'static str = "auth/token/refresh/";
	/// Default unauthenticated entry point.
	pub const DEFAULT_LOGIN_ROUTE: &'static str = "/login";
	/// Default API call timeout.
	pub const DEFAULT_REQUEST_TIMEOUT: StdDuration = StdDuration::from_secs(15);
	/// Default refresh call timeout.
	pub const DEFAULT_REFRESH_TIMEOUT: StdDuration = StdDuration::from_secs(10);

	/// Environment variable holding the backend base URL.
	pub const ENV_BASE_URL: &'static str = "COMPASS_API_BASE_URL";
	/// Environment variable overriding the refresh endpoint path.
	pub const ENV_REFRESH_PATH: &'static str = "COMPASS_REFRESH_PATH";
	/// Environment variable overriding the login route.
	pub const ENV_LOGIN_ROUTE: &'static str = "COMPASS_LOGIN_ROUTE";
	/// Environment variable overriding the API timeout, in seconds.
	pub const ENV_REQUEST_TIMEOUT: &'static str = "COMPASS_REQUEST_TIMEOUT_SECS";
	/// Environment variable overriding the refresh timeout, in seconds.
	pub const ENV_REFRESH_TIMEOUT: &'static str = "COMPASS_REFRESH_TIMEOUT_SECS";

	/// Creates a new builder with defaults for everything except the base URL.
	pub fn builder() -> ClientConfigBuilder {
		ClientConfigBuilder::default()
	}

	/// Loads configuration from `COMPASS_*` environment variables.
	pub fn from_env() -> Result<Self, ConfigError> {
		Self::from_lookup(|var| env::var(var).ok())
	}

	/// Loads configuration through an arbitrary variable lookup.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
	where
		F: Fn(&'static str) -> Option<String>,
	{
		let raw_base = lookup(Self::ENV_BASE_URL)
			.ok_or(ConfigError::MissingEnv { var: Self::ENV_BASE_URL })?;
		let base_url =
			Url::parse(&raw_base).map_err(|source| ConfigError::InvalidBaseUrl { source })?;
		let mut builder = Self::builder().base_url(base_url);

		if let Some(path) = lookup(Self::ENV_REFRESH_PATH) {
			builder = builder.refresh_path(path);
		}
		if let Some(route) = lookup(Self::ENV_LOGIN_ROUTE) {
			builder = builder.login_route(route);
		}
		if let Some(secs) = lookup(Self::ENV_REQUEST_TIMEOUT) {
			builder = builder.request_timeout(parse_secs(Self::ENV_REQUEST_TIMEOUT, secs)?);
		}
		if let Some(secs) = lookup(Self::ENV_REFRESH_TIMEOUT) {
			builder = builder.refresh_timeout(parse_secs(Self::ENV_REFRESH_TIMEOUT, secs)?);
		}

		builder.build()
	}

	/// Resolves a request path against the base URL.
	///
	/// Leading slashes are ignored so `/auth/profiles/` and `auth/profiles/` address the same
	/// resource below the base path.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		self.base_url
			.join(path.trim_start_matches('/'))
			.map_err(|source| ConfigError::InvalidEndpoint { path: path.to_owned(), source })
	}

	/// Resolves the refresh endpoint.
	pub fn refresh_endpoint(&self) -> Result<Url, ConfigError> {
		self.endpoint(&self.refresh_path)
	}

	fn validate(&self) -> Result<(), ConfigError> {
		if !matches!(self.base_url.scheme(), "http" | "https") || self.base_url.cannot_be_a_base()
		{
			return Err(ConfigError::UnsupportedScheme { url: self.base_url.to_string() });
		}
		if self.refresh_path.trim().is_empty() {
			return Err(ConfigError::EmptyField { field: "refresh_path" });
		}
		if self.login_route.trim().is_empty() {
			return Err(ConfigError::EmptyField { field: "login_route" });
		}
		if self.request_timeout.is_zero() {
			return Err(ConfigError::ZeroTimeout { field: "request_timeout" });
		}
		if self.refresh_timeout.is_zero() {
			return Err(ConfigError::ZeroTimeout { field: "refresh_timeout" });
		}
		if !self.cookie_max_age.is_positive() || self.cookie_max_age > CookieJar::MAX_MAX_AGE {
			return Err(ConfigError::InvalidCookieMaxAge { max_age: self.cookie_max_age });
		}

		self.refresh_endpoint().map(|_| ())
	}
}

/// Builder for [`ClientConfig`] values.
#[derive(Debug)]
pub struct ClientConfigBuilder {
	/// Backend base URL (required).
	pub base_url: Option<Url>,
	/// Refresh endpoint path.
	pub refresh_path: String,
	/// Login route.
	pub login_route: String,
	/// API call timeout.
	pub request_timeout: StdDuration,
	/// Refresh call timeout.
	pub refresh_timeout: StdDuration,
	/// Cookie lifetime.
	pub cookie_max_age: Duration,
}
impl Default for ClientConfigBuilder {
	fn default() -> Self {
		Self {
			base_url: None,
			refresh_path: ClientConfig::DEFAULT_REFRESH_PATH.into(),
			login_route: ClientConfig::DEFAULT_LOGIN_ROUTE.into(),
			request_timeout: ClientConfig::DEFAULT_REQUEST_TIMEOUT,
			refresh_timeout: ClientConfig::DEFAULT_REFRESH_TIMEOUT,
			cookie_max_age: CookieJar::DEFAULT_MAX_AGE,
		}
	}
}
impl ClientConfigBuilder {
	/// Sets the backend base URL.
	pub fn base_url(mut self, url: Url) -> Self {
		self.base_url = Some(url);

		self
	}

	/// Overrides the refresh endpoint path.
	pub fn refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = path.into();

		self
	}

	/// Overrides the login route.
	pub fn login_route(mut self, route: impl Into<String>) -> Self {
		self.login_route = route.into();

		self
	}

	/// Overrides the API call timeout.
	pub fn request_timeout(mut self, timeout: StdDuration) -> Self {
		self.request_timeout = timeout;

		self
	}

	/// Overrides the refresh call timeout.
	pub fn refresh_timeout(mut self, timeout: StdDuration) -> Self {
		self.refresh_timeout = timeout;

		self
	}

	/// Overrides the cookie lifetime.
	pub fn cookie_max_age(mut self, max_age: Duration) -> Self {
		self.cookie_max_age = max_age;

		self
	}

	/// Consumes the builder and validates the resulting configuration.
	pub fn build(self) -> Result<ClientConfig, ConfigError> {
		let mut base_url = self.base_url.ok_or(ConfigError::MissingBaseUrl)?;

		if !base_url.path().ends_with('/') {
			let path = format!("{}/", base_url.path());

			base_url.set_path(&path);
		}

		let config = ClientConfig {
			base_url,
			refresh_path: self.refresh_path,
			login_route: self.login_route,
			request_timeout: self.request_timeout,
			refresh_timeout: self.refresh_timeout,
			cookie_max_age: self.cookie_max_age,
		};

		config.validate()?;

		Ok(config)
	}
}

fn parse_secs(var: &'static str, raw: String) -> Result<StdDuration, ConfigError> {
	raw.trim()
		.parse::<u64>()
		.map(StdDuration::from_secs)
		.map_err(|_| ConfigError::InvalidEnv { var, value: raw })
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn base() -> Url {
		Url::parse("https://api.compass.example/api").expect("Base URL fixture should parse.")
	}

	#[test]
	fn builder_normalizes_base_path_and_applies_defaults() {
		let config = ClientConfig::builder().base_url(base()).build().expect("Config should build.");

		assert_eq!(config.base_url.as_str(), "https://api.compass.example/api/");
		assert_eq!(config.login_route, "/login");
		assert_eq!(config.cookie_max_age, Duration::days(1));
		assert_eq!(
			config.refresh_endpoint().expect("Refresh endpoint should resolve.").as_str(),
			"https://api.compass.example/api/auth/token/refresh/",
		);
		assert_eq!(
			config.endpoint("/auth/profiles/").expect("Profile endpoint should resolve.").as_str(),
			"https://api.compass.example/api/auth/profiles/",
		);
	}

	#[test]
	fn builder_rejects_invalid_values() {
		assert!(matches!(ClientConfig::builder().build(), Err(ConfigError::MissingBaseUrl)));
		assert!(matches!(
			ClientConfig::builder()
				.base_url(Url::parse("ftp://files.example").expect("FTP fixture should parse."))
				.build(),
			Err(ConfigError::UnsupportedScheme { .. })
		));
		assert!(matches!(
			ClientConfig::builder().base_url(base()).login_route(" ").build(),
			Err(ConfigError::EmptyField { field: "login_route" })
		));
		assert!(matches!(
			ClientConfig::builder().base_url(base()).refresh_timeout(StdDuration::ZERO).build(),
			Err(ConfigError::ZeroTimeout { field: "refresh_timeout" })
		));
		assert!(matches!(
			ClientConfig::builder().base_url(base()).cookie_max_age(Duration::MAX).build(),
			Err(ConfigError::InvalidCookieMaxAge { .. })
		));
		assert!(matches!(
			ClientConfig::builder().base_url(base()).cookie_max_age(Duration::ZERO).build(),
			Err(ConfigError::InvalidCookieMaxAge { .. })
		));
		assert!(
			ClientConfig::builder()
				.base_url(base())
				.cookie_max_age(CookieJar::MAX_MAX_AGE)
				.build()
				.is_ok()
		);
	}

	#[test]
	fn lookup_reads_overrides() {
		let config = ClientConfig::from_lookup(|var| match var {
			ClientConfig::ENV_BASE_URL => Some("http://localhost:8000/api/".into()),
			ClientConfig::ENV_LOGIN_ROUTE => Some("/auth/login".into()),
			ClientConfig::ENV_REQUEST_TIMEOUT => Some("30".into()),
			_ => None,
		})
		.expect("Lookup-driven config should build.");

		assert_eq!(config.login_route, "/auth/login");
		assert_eq!(config.request_timeout, StdDuration::from_secs(30));
		assert_eq!(config.refresh_timeout, ClientConfig::DEFAULT_REFRESH_TIMEOUT);
	}

	#[test]
	fn lookup_requires_base_url_and_numeric_timeouts() {
		assert!(matches!(
			ClientConfig::from_lookup(|_| None),
			Err(ConfigError::MissingEnv { var: ClientConfig::ENV_BASE_URL })
		));
		assert!(matches!(
			ClientConfig::from_lookup(|var| match var {
				ClientConfig::ENV_BASE_URL => Some("http://localhost:8000/".into()),
				ClientConfig::ENV_REFRESH_TIMEOUT => Some("soon".into()),
				_ => None,
			}),
			Err(ConfigError::InvalidEnv { var: ClientConfig::ENV_REFRESH_TIMEOUT, .. })
		));
	}
}
