//! Thread-safe in-memory [`TokenStore`] implementation for tests and short-lived processes.

// self
use crate::{
	_prelude::*,
	auth::TokenPair,
	store::{CompareAndSwapOutcome, StoreError, StoreFuture, StoredSession, TokenStore},
};

type Slot = Arc<RwLock<Option<StoredSession>>>;

/// Thread-safe storage backend that keeps the session in-process.
///
/// Clones share the same slot, so a test can keep a handle and inspect what the client wrote.
#[derive(Clone, Debug, Default)]
pub struct MemoryStore(Slot);
impl MemoryStore {
	/// Creates a store pre-populated with `session`.
	pub fn with_session(session: StoredSession) -> Self {
		Self(Arc::new(RwLock::new(Some(session))))
	}

	/// Returns a copy of the stored session without going through the async contract.
	pub fn snapshot(&self) -> Option<StoredSession> {
		self.0.read().clone()
	}

	fn cas_now(slot: &Slot, expected_refresh: &str, replacement: TokenPair) -> CompareAndSwapOutcome {
		let mut guard = slot.write();

		match guard.as_mut() {
			Some(existing) if existing.refresh_matches(expected_refresh) => {
				existing.tokens = replacement;

				CompareAndSwapOutcome::Updated
			},
			Some(_) => CompareAndSwapOutcome::RefreshMismatch,
			None => CompareAndSwapOutcome::Missing,
		}
	}
}
impl TokenStore for MemoryStore {
	fn load(&self) -> StoreFuture<'_, Option<StoredSession>> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(slot.read().clone()) })
	}

	fn save(&self, session: StoredSession) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			*slot.write() = Some(session);

			Ok::<_, StoreError>(())
		})
	}

	fn compare_and_swap_refresh<'a>(
		&'a self,
		expected_refresh: &'a str,
		replacement: TokenPair,
	) -> StoreFuture<'a, CompareAndSwapOutcome> {
		let slot = self.0.clone();

		Box::pin(async move { Ok(Self::cas_now(&slot, expected_refresh, replacement)) })
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		let slot = self.0.clone();

		Box::pin(async move {
			slot.write().take();

			Ok(())
		})
	}
}
