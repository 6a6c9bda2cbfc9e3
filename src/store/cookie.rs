//! Cookie-jar [`CredentialBackend`] whose entries expire after a fixed max-age.

// self
use crate::{
	_prelude::*,
	auth::{CredentialKind, TokenSecret},
	store::{CredentialBackend, StoreError, StoreFuture},
};

#[derive(Clone, Debug)]
struct CookieEntry {
	value: TokenSecret,
	expires_at: OffsetDateTime,
}
impl CookieEntry {
	fn is_expired_at(&self, instant: OffsetDateTime) -> bool {
		instant >= self.expires_at
	}
}

type CookieMap = Arc<RwLock<HashMap<CredentialKind, CookieEntry>>>;

/// In-process cookie jar; every write is stamped with `now + max_age`.
#[derive(Clone, Debug)]
pub struct CookieJar {
	max_age: Duration,
	entries: CookieMap,
}
impl CookieJar {
	/// Browser cookies written by the web app live for one day.
	pub const DEFAULT_MAX_AGE: Duration = Duration::days(1);
	/// Longest max-age browsers honour for a cookie.
	pub const MAX_MAX_AGE: Duration = Duration::days(400);

	/// Creates an empty jar with the provided max-age.
	pub fn new(max_age: Duration) -> Self {
		Self { max_age, entries: Default::default() }
	}

	/// Returns the max-age applied to new entries.
	pub fn max_age(&self) -> Duration {
		self.max_age
	}

	/// Returns the expiry instant of a live entry, if any.
	pub fn expires_at(&self, kind: CredentialKind) -> Option<OffsetDateTime> {
		let now = OffsetDateTime::now_utc();

		self.entries
			.read()
			.get(&kind)
			.filter(|entry| !entry.is_expired_at(now))
			.map(|entry| entry.expires_at)
	}

	fn load_now(map: CookieMap, kind: CredentialKind, now: OffsetDateTime) -> Option<TokenSecret> {
		{
			let guard = map.read();

			match guard.get(&kind) {
				Some(entry) if !entry.is_expired_at(now) => return Some(entry.value.clone()),
				Some(_) => {},
				None => return None,
			}
		}

		// Lazily evict the stale entry.
		let mut guard = map.write();

		if guard.get(&kind).is_some_and(|entry| entry.is_expired_at(now)) {
			guard.remove(&kind);
		}

		None
	}
}
impl Default for CookieJar {
	fn default() -> Self {
		Self::new(Self::DEFAULT_MAX_AGE)
	}
}
impl CredentialBackend for CookieJar {
	fn load(&self, kind: CredentialKind) -> StoreFuture<'_, Option<TokenSecret>> {
		let map = self.entries.clone();

		Box::pin(async move { Ok(Self::load_now(map, kind, OffsetDateTime::now_utc())) })
	}

	fn save(&self, kind: CredentialKind, secret: TokenSecret) -> StoreFuture<'_, ()> {
		let map = self.entries.clone();
		let expires_at = OffsetDateTime::now_utc().checked_add(self.max_age);
		let max_age = self.max_age;

		Box::pin(async move {
			let expires_at = expires_at.ok_or_else(|| StoreError::Backend {
				message: format!("Cookie max-age {max_age} overflows the expiry timestamp"),
			})?;

			map.write().insert(kind, CookieEntry { value: secret, expires_at });

			Ok(())
		})
	}

	fn remove(&self, kind: CredentialKind) -> StoreFuture<'_, ()> {
		let map = self.entries.clone();

		Box::pin(async move {
			map.write().remove(&kind);

			Ok(())
		})
	}
}
