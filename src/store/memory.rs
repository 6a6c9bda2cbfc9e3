//! Thread-safe in-memory [`CredentialBackend`] standing in for the browser's persistent store.

// self
use crate::{
	_prelude::*,
	auth::{CredentialKind, TokenSecret},
	store::{CredentialBackend, StoreFuture},
};

type SecretMap = Arc<RwLock<HashMap<CredentialKind, TokenSecret>>>;

/// Persistent-store backend without expiry that keeps credentials in-process.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(SecretMap);
impl MemoryStore {
	/// Returns the number of stored credentials.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Returns `true` when nothing is stored.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
impl CredentialBackend for MemoryStore {
	fn load(&self, kind: CredentialKind) -> StoreFuture<'_, Option<TokenSecret>> {
		let map = self.0.clone();

		Box::pin(async move { Ok(map.read().get(&kind).cloned()) })
	}

	fn save(&self, kind: CredentialKind, secret: TokenSecret) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().insert(kind, secret);

			Ok(())
		})
	}

	fn remove(&self, kind: CredentialKind) -> StoreFuture<'_, ()> {
		let map = self.0.clone();

		Box::pin(async move {
			map.write().remove(&kind);

			Ok(())
		})
	}
}
