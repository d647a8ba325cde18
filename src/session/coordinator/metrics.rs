// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for refresh, retry, and teardown activity.
#[derive(Debug, Default)]
pub struct SessionMetrics {
	attempts: AtomicU64,
	success: AtomicU64,
	failure: AtomicU64,
	coalesced: AtomicU64,
	retries: AtomicU64,
	sign_outs: AtomicU64,
	teardown_failures: AtomicU64,
}
impl SessionMetrics {
	/// Returns the number of refresh cycles led by a caller.
	pub fn attempts(&self) -> u64 {
		self.attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh operations that produced a usable token.
	pub fn successes(&self) -> u64 {
		self.success.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh operations that ended the session.
	pub fn failures(&self) -> u64 {
		self.failure.load(Ordering::Relaxed)
	}

	/// Returns how many callers waited on another caller's refresh.
	pub fn coalesced(&self) -> u64 {
		self.coalesced.load(Ordering::Relaxed)
	}

	/// Returns how many requests were replayed after a credential renewal.
	pub fn retries(&self) -> u64 {
		self.retries.load(Ordering::Relaxed)
	}

	/// Returns how many teardowns emitted a sign-out.
	pub fn sign_outs(&self) -> u64 {
		self.sign_outs.load(Ordering::Relaxed)
	}

	/// Returns how many teardowns failed to clear the store.
	pub fn teardown_failures(&self) -> u64 {
		self.teardown_failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_attempt(&self) {
		self.attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_success(&self) {
		self.success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_coalesced(&self) {
		self.coalesced.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_retry(&self) {
		self.retries.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_sign_out(&self) {
		self.sign_outs.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_teardown_failure(&self) {
		self.teardown_failures.fetch_add(1, Ordering::Relaxed);
	}
}
