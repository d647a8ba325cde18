//! Idempotent session teardown.

// self
use crate::{
	_prelude::*,
	obs,
	session::{RefreshCoordinator, SignOutReason},
	store::TokenStore,
};

/// Clears the stored session and publishes `Unauthenticated` exactly once per session.
#[derive(Clone)]
pub struct SessionTerminator {
	store: Arc<dyn TokenStore>,
	write_guard: Arc<AsyncMutex<()>>,
	coordinator: Arc<RefreshCoordinator>,
}
impl SessionTerminator {
	/// Creates a terminator sharing `write_guard` with every other store mutation.
	pub fn new(
		store: Arc<dyn TokenStore>,
		write_guard: Arc<AsyncMutex<()>>,
		coordinator: Arc<RefreshCoordinator>,
	) -> Self {
		Self { store, write_guard, coordinator }
	}

	/// Tears the session down.
	///
	/// Returns `true` when this call emitted the sign-out; concurrent or repeated calls find the
	/// store already empty and return `false`. The store is cleared even when nothing is emitted.
	///
	/// A store failure is traced, counted in [`SessionMetrics`](crate::session::SessionMetrics),
	/// and returned; the published state is left untouched.
	pub async fn terminate(&self, reason: SignOutReason) -> Result<bool> {
		let _write = self.write_guard.lock().await;
		let had_session = match self.clear_store().await {
			Ok(had_session) => had_session,
			Err(e) => {
				self.coordinator.metrics().record_teardown_failure();
				obs::trace_teardown_failure(&reason, &e);

				return Err(e);
			},
		};
		let emitted = self.coordinator.mark_unauthenticated(had_session);

		if emitted {
			self.coordinator.metrics().record_sign_out();
			obs::record_sign_out(&reason);
			obs::trace_sign_out(&reason);
		}

		Ok(emitted)
	}

	async fn clear_store(&self) -> Result<bool> {
		let had_session = self.store.load().await?.is_some();

		self.store.clear().await?;

		Ok(had_session)
	}
}
impl Debug for SessionTerminator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionTerminator").field("state", &self.coordinator.state()).finish()
	}
}
