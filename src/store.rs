//! Credential storage contracts, built-in backends, and the composite [`CredentialStore`].
//!
//! Credentials live in two places: a cookie jar holding the access token with a bounded
//! lifetime, and a persistent key/value backend holding both tokens without expiry. The
//! [`CredentialStore`] wraps the pair behind a single capability whose composite operations
//! (fallback read, dual-write replace, purge) are serialized by an async read/write lock.

pub mod cookie;
pub mod file;
pub mod memory;

pub use cookie::CookieJar;
pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{CredentialKind, Credentials, TokenPair, TokenSecret},
};

/// Boxed future returned by [`CredentialBackend`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Key/value backend holding credentials by [`CredentialKind`].
pub trait CredentialBackend
where
	Self: Send + Sync,
{
	/// Reads the credential, returning `None` when absent or expired.
	fn load(&self, kind: CredentialKind) -> StoreFuture<'_, Option<TokenSecret>>;

	/// Writes or overwrites the credential.
	fn save(&self, kind: CredentialKind, secret: TokenSecret) -> StoreFuture<'_, ()>;

	/// Removes the credential; removing an absent key succeeds.
	fn remove(&self, kind: CredentialKind) -> StoreFuture<'_, ()>;
}

/// Error type produced by [`CredentialBackend`] implementations.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum StoreError {
	/// Serialization failures surfaced by the backend.
	#[error("Serialization error: {message}.")]
	Serialization {
		/// Human-readable error payload.
		message: String,
	},
	/// Backend-level failure for the storage engine.
	#[error("Backend failure: {message}.")]
	Backend {
		/// Human-readable error payload.
		message: String,
	},
}

/// Single credential capability spanning the cookie jar and the persistent backend.
pub struct CredentialStore {
	cookie: Arc<dyn CredentialBackend>,
	local: Arc<dyn CredentialBackend>,
	lock: AsyncRwLock<()>,
}
impl CredentialStore {
	/// Combines a cookie backend and a persistent backend.
	pub fn new(cookie: Arc<dyn CredentialBackend>, local: Arc<dyn CredentialBackend>) -> Self {
		Self { cookie, local, lock: AsyncRwLock::new(()) }
	}

	/// Store backed by a fresh cookie jar and an in-memory persistent backend.
	pub fn in_memory(cookie_max_age: Duration) -> Self {
		Self::new(Arc::new(CookieJar::new(cookie_max_age)), Arc::new(MemoryStore::default()))
	}

	/// Resolves the access token, cookie first, falling back to the persistent backend.
	pub async fn access_token(&self) -> Result<Option<TokenSecret>, StoreError> {
		let _read = self.lock.read().await;

		self.access_unlocked().await
	}

	/// Resolves the refresh token from the persistent backend.
	pub async fn refresh_token(&self) -> Result<Option<TokenSecret>, StoreError> {
		let _read = self.lock.read().await;

		self.local.load(CredentialKind::Refresh).await
	}

	/// Reads both credentials under one lock acquisition.
	pub async fn snapshot(&self) -> Result<Credentials, StoreError> {
		let _read = self.lock.read().await;
		let access = self.access_unlocked().await?;
		let refresh = self.local.load(CredentialKind::Refresh).await?;

		Ok(Credentials { access, refresh })
	}

	/// Overwrites the access token in both backends.
	pub async fn replace_access(&self, access: TokenSecret) -> Result<(), StoreError> {
		let _write = self.lock.write().await;

		self.cookie.save(CredentialKind::Access, access.clone()).await?;
		self.local.save(CredentialKind::Access, access).await
	}

	/// Overwrites the access token in both backends and, when supplied, the refresh token in the
	/// persistent backend.
	pub async fn rotate(
		&self,
		access: TokenSecret,
		refresh: Option<TokenSecret>,
	) -> Result<(), StoreError> {
		let _write = self.lock.write().await;

		self.cookie.save(CredentialKind::Access, access.clone()).await?;
		self.local.save(CredentialKind::Access, access).await?;

		if let Some(refresh) = refresh {
			self.local.save(CredentialKind::Refresh, refresh).await?;
		}

		Ok(())
	}

	/// Persists a freshly issued login pair.
	pub async fn store_pair(&self, pair: TokenPair) -> Result<(), StoreError> {
		self.rotate(pair.access, Some(pair.refresh)).await
	}

	/// Purges every credential from both backends.
	///
	/// Every removal is attempted even if an earlier one fails; the first failure is returned.
	pub async fn clear(&self) -> Result<(), StoreError> {
		let _write = self.lock.write().await;
		let mut first_err = None;

		for backend in [&self.cookie, &self.local] {
			for kind in CredentialKind::ALL {
				if let Err(e) = backend.remove(kind).await {
					first_err.get_or_insert(e);
				}
			}
		}

		first_err.map_or(Ok(()), Err)
	}

	async fn access_unlocked(&self) -> Result<Option<TokenSecret>, StoreError> {
		match self.cookie.load(CredentialKind::Access).await? {
			Some(secret) => Ok(Some(secret)),
			None => self.local.load(CredentialKind::Access).await,
		}
	}
}
impl Debug for CredentialStore {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("CredentialStore(..)")
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;
	use crate::error::Error;

	#[test]
	fn store_error_converts_into_client_error_with_source() {
		let store_error = StoreError::Backend { message: "disk unavailable".into() };
		let client_error: Error = store_error.clone().into();

		assert!(matches!(client_error, Error::Storage(_)));
		assert!(client_error.to_string().contains("disk unavailable"));

		let source = StdError::source(&client_error)
			.expect("Client error should expose the original store error as its source.");

		assert_eq!(source.to_string(), store_error.to_string());
	}

	#[tokio::test]
	async fn access_falls_back_to_persistent_backend() {
		let cookie = Arc::new(CookieJar::new(Duration::days(1)));
		let local = Arc::new(MemoryStore::default());
		let store = CredentialStore::new(cookie.clone(), local.clone());

		local
			.save(CredentialKind::Access, TokenSecret::new("local-access"))
			.await
			.expect("Seeding the persistent backend should succeed.");

		let access = store
			.access_token()
			.await
			.expect("Reading the access token should succeed.")
			.expect("Persistent fallback should resolve the access token.");

		assert_eq!(access.expose(), "local-access");

		cookie
			.save(CredentialKind::Access, TokenSecret::new("cookie-access"))
			.await
			.expect("Seeding the cookie jar should succeed.");

		let access = store
			.access_token()
			.await
			.expect("Reading the access token should succeed.")
			.expect("Cookie jar should resolve the access token.");

		assert_eq!(access.expose(), "cookie-access");
	}

	#[tokio::test]
	async fn refresh_token_never_reads_cookie_jar() {
		let cookie = Arc::new(CookieJar::new(Duration::days(1)));
		let store = CredentialStore::new(cookie.clone(), Arc::new(MemoryStore::default()));

		cookie
			.save(CredentialKind::Refresh, TokenSecret::new("cookie-refresh"))
			.await
			.expect("Seeding the cookie jar should succeed.");

		assert_eq!(store.refresh_token().await.expect("Refresh read should succeed."), None);
	}
}
