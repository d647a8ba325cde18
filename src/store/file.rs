//! File-backed [`TokenStore`] that survives process restarts.
//!
//! The session is written as a flat JSON object with `access_token`, `refresh_token`, and `user`
//! keys. Every mutation rewrites the whole file through a temporary sibling and a rename, so a
//! crash never leaves one token updated without the other.

// std
use std::{
	fs::{self, File},
	io::{ErrorKind, Write},
	path::{Path, PathBuf},
};
// self
use crate::{
	_prelude::*,
	auth::{Principal, TokenPair, TokenSecret},
	store::{CompareAndSwapOutcome, StoreError, StoreFuture, StoredSession, TokenStore},
};

/// Persists the session to a JSON file after each mutation.
#[derive(Clone, Debug)]
pub struct FileStore {
	path: PathBuf,
	inner: Arc<RwLock<Option<StoredSession>>>,
}
impl FileStore {
	/// Opens (or creates) a store at the provided path, eagerly loading existing data.
	pub fn open(path: impl Into<PathBuf>) -> Result<Self, StoreError> {
		let path = path.into();

		Self::ensure_parent_exists(&path)?;

		let snapshot = Self::load_snapshot(&path)?;

		Ok(Self { path, inner: Arc::new(RwLock::new(snapshot)) })
	}

	/// Location of the backing file.
	pub fn path(&self) -> &Path {
		&self.path
	}

	fn load_snapshot(path: &Path) -> Result<Option<StoredSession>, StoreError> {
		let bytes = match fs::read(path) {
			Ok(bytes) => bytes,
			Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
			Err(e) =>
				return Err(StoreError::Backend {
					message: format!("Failed to read {}: {e}", path.display()),
				}),
		};

		if bytes.iter().all(u8::is_ascii_whitespace) {
			return Ok(None);
		}

		let record: FileRecord =
			serde_json::from_slice(&bytes).map_err(|e| StoreError::Serialization {
				message: format!("Failed to parse {}: {e}", path.display()),
			})?;

		Ok(record.into_session())
	}

	fn ensure_parent_exists(path: &Path) -> Result<(), StoreError> {
		if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
			fs::create_dir_all(parent).map_err(|e| StoreError::Backend {
				message: format!("Failed to create store directory {}: {e}", parent.display()),
			})?;
		}

		Ok(())
	}

	fn persist_locked(&self, contents: &StoredSession) -> Result<(), StoreError> {
		Self::ensure_parent_exists(&self.path)?;

		let serialized = serde_json::to_vec_pretty(&FileRecord::from_session(contents)).map_err(
			|e| StoreError::Serialization {
				message: format!("Failed to serialize session snapshot: {e}"),
			},
		)?;
		let mut tmp_path = self.path.clone();

		tmp_path.set_extension("tmp");

		{
			let mut file = File::create(&tmp_path).map_err(|e| StoreError::Backend {
				message: format!("Failed to create {}: {e}", tmp_path.display()),
			})?;

			file.write_all(&serialized).map_err(|e| StoreError::Backend {
				message: format!("Failed to write {}: {e}", tmp_path.display()),
			})?;
			file.sync_all().map_err(|e| StoreError::Backend {
				message: format!("Failed to sync {}: {e}", tmp_path.display()),
			})?;
		}

		fs::rename(&tmp_path, &self.path).map_err(|e| StoreError::Backend {
			message: format!("Failed to replace {}: {e}", self.path.display()),
		})
	}

	fn remove_locked(&self) -> Result<(), StoreError> {
		match fs::remove_file(&self.path) {
			Ok(()) => Ok(()),
			Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
			Err(e) => Err(StoreError::Backend {
				message: format!("Failed to remove {}: {e}", self.path.display()),
			}),
		}
	}
}
impl TokenStore for FileStore {
	fn load(&self) -> StoreFuture<'_, Option<StoredSession>> {
		Box::pin(async move { Ok(self.inner.read().clone()) })
	}

	fn save(&self, session: StoredSession) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			self.persist_locked(&session)?;
			*guard = Some(session);

			Ok(())
		})
	}

	fn compare_and_swap_refresh<'a>(
		&'a self,
		expected_refresh: &'a str,
		replacement: TokenPair,
	) -> StoreFuture<'a, CompareAndSwapOutcome> {
		Box::pin(async move {
			let mut guard = self.inner.write();
			let Some(existing) = guard.as_ref() else {
				return Ok(CompareAndSwapOutcome::Missing);
			};

			if !existing.refresh_matches(expected_refresh) {
				return Ok(CompareAndSwapOutcome::RefreshMismatch);
			}

			let updated = StoredSession { tokens: replacement, principal: existing.principal.clone() };

			self.persist_locked(&updated)?;
			*guard = Some(updated);

			Ok(CompareAndSwapOutcome::Updated)
		})
	}

	fn clear(&self) -> StoreFuture<'_, ()> {
		Box::pin(async move {
			let mut guard = self.inner.write();

			self.remove_locked()?;
			guard.take();

			Ok(())
		})
	}
}

#[derive(Serialize, Deserialize)]
struct FileRecord {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	access_token: Option<TokenSecret>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	refresh_token: Option<TokenSecret>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	user: Option<Principal>,
}
impl FileRecord {
	fn from_session(session: &StoredSession) -> Self {
		Self {
			access_token: Some(session.tokens.access.clone()),
			refresh_token: session.tokens.refresh.clone(),
			user: session.principal.clone(),
		}
	}

	/// A record without an access token is treated as no session at all.
	fn into_session(self) -> Option<StoredSession> {
		let access = self.access_token.filter(|token| !token.is_blank())?;

		Some(StoredSession {
			tokens: TokenPair { access, refresh: self.refresh_token },
			principal: self.user,
		})
	}
}
