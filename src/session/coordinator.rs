//! Single-flight refresh coordination.
//!
//! [`RefreshCoordinator`] owns the `Idle | Refreshing` phase. The first caller that reports an
//! expired credential while the phase is idle becomes the leader and runs the refresh; every
//! caller that arrives while it runs parks on a one-shot channel and is released with the
//! leader's outcome. The phase lock is a plain mutex that is never held across an `.await`.

mod metrics;

pub use metrics::SessionMetrics;

// crates.io
use tokio::sync::{oneshot, watch};
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	session::{SessionState, SignOutReason},
};

/// Outcome of one refresh, shared by the leader and every queued caller.
pub type RefreshOutcome = std::result::Result<TokenSecret, SignOutReason>;

/// Owned single-flight coordinator for refresh demand.
pub struct RefreshCoordinator {
	phase: Mutex<Phase>,
	state: watch::Sender<SessionState>,
	metrics: SessionMetrics,
}
impl RefreshCoordinator {
	/// Creates an idle coordinator publishing `initial`.
	pub fn new(initial: SessionState) -> Self {
		let (state, _) = watch::channel(initial);

		Self { phase: Mutex::new(Phase::Idle), state, metrics: SessionMetrics::default() }
	}

	/// Runs `refresh` unless one is already in flight, in which case waits for that one.
	///
	/// Exactly one `refresh` future runs per refresh cycle. Every caller, leader included,
	/// receives the same outcome. Dropping the leader before it settles releases the queued
	/// callers with [`Error::RefreshAbandoned`].
	pub async fn coalesce<F, Fut>(&self, refresh: F) -> Result<TokenSecret>
	where
		F: FnOnce() -> Fut,
		Fut: Future<Output = RefreshOutcome>,
	{
		let outcome = match self.enter() {
			Ticket::Leader(leader) => {
				self.metrics.record_attempt();

				let outcome = refresh().await;

				match &outcome {
					Ok(_) => self.metrics.record_success(),
					Err(_) => self.metrics.record_failure(),
				}

				leader.complete(outcome.clone());

				outcome
			},
			Ticket::Follower(receiver) => {
				self.metrics.record_coalesced();

				receiver.await.map_err(|_| Error::RefreshAbandoned)?
			},
		};

		outcome.map_err(|reason| Error::SessionExpired { reason })
	}

	/// Returns `true` while a refresh is in flight.
	pub fn is_refreshing(&self) -> bool {
		matches!(*self.phase.lock(), Phase::Refreshing { .. })
	}

	/// Number of callers parked behind the in-flight refresh.
	pub fn waiting(&self) -> usize {
		match &*self.phase.lock() {
			Phase::Idle => 0,
			Phase::Refreshing { waiters } => waiters.len(),
		}
	}

	/// Current published state.
	pub fn state(&self) -> SessionState {
		*self.state.borrow()
	}

	/// Subscribes to state changes.
	pub fn subscribe(&self) -> watch::Receiver<SessionState> {
		self.state.subscribe()
	}

	/// In-process counters for refresh and teardown activity.
	pub fn metrics(&self) -> &SessionMetrics {
		&self.metrics
	}

	pub(crate) fn mark_authenticated(&self) {
		self.state.send_if_modified(|state| {
			let changed = *state != SessionState::Authenticated;

			*state = SessionState::Authenticated;

			changed
		});
	}

	/// Publishes `Unauthenticated`; `force` notifies subscribers even when already there.
	///
	/// Returns whether subscribers were notified.
	pub(crate) fn mark_unauthenticated(&self, force: bool) -> bool {
		self.state.send_if_modified(|state| {
			let changed = *state != SessionState::Unauthenticated;

			*state = SessionState::Unauthenticated;

			changed || force
		})
	}

	fn enter(&self) -> Ticket<'_> {
		let mut phase = self.phase.lock();

		if let Phase::Refreshing { waiters } = &mut *phase {
			let (sender, receiver) = oneshot::channel();

			waiters.push(sender);

			return Ticket::Follower(receiver);
		}

		*phase = Phase::Refreshing { waiters: Vec::new() };

		// A torn-down session stays `Unauthenticated` until a refresh actually renews it.
		self.state.send_if_modified(|state| {
			if *state == SessionState::Authenticated {
				*state = SessionState::Refreshing;

				true
			} else {
				false
			}
		});

		drop(phase);

		Ticket::Leader(LeaderGuard { coordinator: self, settled: false })
	}

	/// Flips back to idle and hands the queued senders to the caller.
	fn settle(&self) -> Vec<oneshot::Sender<RefreshOutcome>> {
		let waiters = match std::mem::replace(&mut *self.phase.lock(), Phase::Idle) {
			Phase::Idle => Vec::new(),
			Phase::Refreshing { waiters } => waiters,
		};

		self.state.send_if_modified(|state| {
			if *state == SessionState::Refreshing {
				*state = SessionState::Authenticated;

				true
			} else {
				false
			}
		});

		waiters
	}
}
impl Default for RefreshCoordinator {
	fn default() -> Self {
		Self::new(SessionState::Unauthenticated)
	}
}
impl Debug for RefreshCoordinator {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RefreshCoordinator")
			.field("refreshing", &self.is_refreshing())
			.field("waiting", &self.waiting())
			.field("state", &self.state())
			.finish()
	}
}

enum Phase {
	Idle,
	Refreshing { waiters: Vec<oneshot::Sender<RefreshOutcome>> },
}

enum Ticket<'a> {
	Leader(LeaderGuard<'a>),
	Follower(oneshot::Receiver<RefreshOutcome>),
}

/// Held by the caller running the refresh; dropping it unsettled abandons the cycle.
struct LeaderGuard<'a> {
	coordinator: &'a RefreshCoordinator,
	settled: bool,
}
impl LeaderGuard<'_> {
	fn complete(mut self, outcome: RefreshOutcome) {
		self.settled = true;

		for waiter in self.coordinator.settle() {
			// A waiter whose caller went away has nothing to receive.
			let _ = waiter.send(outcome.clone());
		}
	}
}
impl Drop for LeaderGuard<'_> {
	fn drop(&mut self) {
		if !self.settled {
			// Dropping the senders wakes every waiter with a receive error.
			drop(self.coordinator.settle());
		}
	}
}

#[cfg(test)]
mod tests {
	// std
	use std::sync::atomic::{AtomicUsize, Ordering};
	// crates.io
	use tokio::sync::Notify;
	// self
	use super::*;

	async fn wait_for_waiters(coordinator: &RefreshCoordinator, count: usize) {
		while coordinator.waiting() < count {
			tokio::task::yield_now().await;
		}
	}

	#[tokio::test]
	async fn concurrent_callers_share_one_refresh() {
		let coordinator = Arc::new(RefreshCoordinator::new(SessionState::Authenticated));
		let calls = Arc::new(AtomicUsize::new(0));
		let gate = Arc::new(Notify::new());
		let mut handles = Vec::new();

		for _ in 0..5 {
			let coordinator = coordinator.clone();
			let calls = calls.clone();
			let gate = gate.clone();

			handles.push(tokio::spawn(async move {
				coordinator
					.coalesce(|| async move {
						calls.fetch_add(1, Ordering::SeqCst);
						gate.notified().await;

						Ok(TokenSecret::new("fresh"))
					})
					.await
			}));
		}

		wait_for_waiters(&coordinator, 4).await;

		assert!(coordinator.is_refreshing());
		assert_eq!(coordinator.state(), SessionState::Refreshing);

		gate.notify_one();

		for handle in handles {
			let token = handle
				.await
				.expect("Coalesced task should not panic.")
				.expect("Every caller should receive the fresh token.");

			assert_eq!(token.expose(), "fresh");
		}

		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert!(!coordinator.is_refreshing());
		assert_eq!(coordinator.waiting(), 0);
		assert_eq!(coordinator.state(), SessionState::Authenticated);
		assert_eq!(coordinator.metrics().attempts(), 1);
		assert_eq!(coordinator.metrics().coalesced(), 4);
	}

	#[tokio::test]
	async fn failure_is_fanned_out_to_every_waiter() {
		let coordinator = Arc::new(RefreshCoordinator::new(SessionState::Authenticated));
		let gate = Arc::new(Notify::new());
		let leader = {
			let coordinator = coordinator.clone();
			let gate = gate.clone();

			tokio::spawn(async move {
				coordinator
					.coalesce(|| async move {
						gate.notified().await;

						Err(SignOutReason::RefreshRejected { status: 401 })
					})
					.await
			})
		};

		while !coordinator.is_refreshing() {
			tokio::task::yield_now().await;
		}

		let followers: Vec<_> = (0..3)
			.map(|_| {
				let coordinator = coordinator.clone();

				tokio::spawn(async move {
					coordinator
						.coalesce(|| async { Ok(TokenSecret::new("never")) })
						.await
				})
			})
			.collect();

		wait_for_waiters(&coordinator, 3).await;
		gate.notify_one();

		for handle in std::iter::once(leader).chain(followers) {
			let err = handle
				.await
				.expect("Coalesced task should not panic.")
				.expect_err("Every caller should observe the refresh failure.");

			assert!(matches!(
				err,
				Error::SessionExpired { reason: SignOutReason::RefreshRejected { status: 401 } }
			));
		}

		assert_eq!(coordinator.metrics().failures(), 1);
	}

	#[tokio::test]
	async fn dropped_leader_releases_waiters() {
		let coordinator = Arc::new(RefreshCoordinator::new(SessionState::Authenticated));
		let leader = {
			let coordinator = coordinator.clone();

			tokio::spawn(async move {
				coordinator
					.coalesce(|| std::future::pending::<RefreshOutcome>())
					.await
			})
		};

		while !coordinator.is_refreshing() {
			tokio::task::yield_now().await;
		}

		let follower = {
			let coordinator = coordinator.clone();

			tokio::spawn(async move {
				coordinator.coalesce(|| async { Ok(TokenSecret::new("never")) }).await
			})
		};

		wait_for_waiters(&coordinator, 1).await;
		leader.abort();

		let err = follower
			.await
			.expect("Follower task should not panic.")
			.expect_err("Follower should be released when the leader is dropped.");

		assert!(matches!(err, Error::RefreshAbandoned));
		assert!(!coordinator.is_refreshing());
		assert_eq!(coordinator.state(), SessionState::Authenticated);

		let token = coordinator
			.coalesce(|| async { Ok(TokenSecret::new("next")) })
			.await
			.expect("A new cycle should start after abandonment.");

		assert_eq!(token.expose(), "next");
	}

	#[tokio::test]
	async fn refresh_never_publishes_over_a_torn_down_session() {
		let coordinator = RefreshCoordinator::default();
		let mut receiver = coordinator.subscribe();
		let err = coordinator
			.coalesce(|| async {
				assert_eq!(*receiver.borrow_and_update(), SessionState::Unauthenticated);

				Err(SignOutReason::SessionCleared)
			})
			.await
			.expect_err("The refresh outcome should be returned.");

		assert!(matches!(err, Error::SessionExpired { reason: SignOutReason::SessionCleared }));
		assert_eq!(coordinator.state(), SessionState::Unauthenticated);
		assert!(!receiver.has_changed().expect("Sender should still be alive."));
	}

	#[test]
	fn unauthenticated_is_published_once_unless_forced() {
		let coordinator = RefreshCoordinator::new(SessionState::Authenticated);
		let mut receiver = coordinator.subscribe();

		assert!(coordinator.mark_unauthenticated(false));
		assert!(!coordinator.mark_unauthenticated(false));
		assert!(receiver.has_changed().expect("Sender should still be alive."));
		assert_eq!(*receiver.borrow_and_update(), SessionState::Unauthenticated);
		assert!(coordinator.mark_unauthenticated(true));
		assert!(receiver.has_changed().expect("Sender should still be alive."));
	}
}
