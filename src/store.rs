//! Storage contracts and built-in store implementations for the session's token pair.

pub mod file;
pub mod memory;

pub use file::FileStore;
pub use memory::MemoryStore;

// self
use crate::{
	_prelude::*,
	auth::{Principal, TokenPair, TokenSecret},
};

/// Boxed future returned by [`TokenStore`] operations.
pub type StoreFuture<'a, T> = Pin<Box<dyn Future<Output = Result<T, StoreError>> + 'a + Send>>;

/// Persistence contract for the single session held by a client.
///
/// The access and refresh tokens are always written and cleared together; implementations must
/// never expose a state where only one of them changed.
pub trait TokenStore
where
	Self: Send + Sync,
{
	/// Loads the persisted session, if any.
	fn load(&self) -> StoreFuture<'_, Option<StoredSession>>;

	/// Persists `session`, replacing whatever was stored before.
	fn save(&self, session: StoredSession) -> StoreFuture<'_, ()>;

	/// Replaces the token pair when the stored refresh token still equals `expected_refresh`.
	///
	/// The stored principal is kept untouched.
	fn compare_and_swap_refresh<'a>(
		&'a self,
		expected_refresh: &'a str,
		replacement: TokenPair,
	) -> StoreFuture<'a, CompareAndSwapOutcome>;

	/// Removes the tokens and the principal snapshot.
	fn clear(&self) -> StoreFuture<'_, ()>;
}

/// Result of a refresh-token compare-and-swap attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareAndSwapOutcome {
	/// The refresh secret matched the expected value and the pair was replaced.
	Updated,
	/// A session exists but its refresh secret did not match.
	RefreshMismatch,
	/// Nothing is stored.
	Missing,
}

/// Error type produced by [`TokenStore`] implementations.
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

/// Persisted session: the token pair plus the last-known principal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
	/// Current access/refresh pair.
	pub tokens: TokenPair,
	/// Last-known authenticated user.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub principal: Option<Principal>,
}
impl StoredSession {
	/// Creates a session without a principal snapshot.
	pub fn new(tokens: TokenPair) -> Self {
		Self { tokens, principal: None }
	}

	/// Attaches the principal snapshot.
	pub fn with_principal(mut self, principal: Principal) -> Self {
		self.principal = Some(principal);

		self
	}

	/// Current access token.
	pub fn access(&self) -> &TokenSecret {
		&self.tokens.access
	}

	/// Current refresh token, when present and non-blank.
	pub fn refresh(&self) -> Option<&TokenSecret> {
		self.tokens.refresh_token()
	}

	pub(crate) fn refresh_matches(&self, expected: &str) -> bool {
		self.refresh().is_some_and(|current| current.expose() == expected)
	}
}
