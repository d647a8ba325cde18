// self
use session_broker::{
	auth::{Principal, TokenPair, TokenSecret},
	store::{CompareAndSwapOutcome, MemoryStore, StoredSession, TokenStore},
};

fn build_session(access: &str, refresh: Option<&str>) -> StoredSession {
	let tokens = match refresh {
		Some(refresh) => TokenPair::new(access, refresh),
		None => TokenPair::access_only(access),
	};

	StoredSession::new(tokens).with_principal(Principal::new(42, "ops@example.com"))
}

#[tokio::test]
async fn save_and_load_round_trip() {
	let store = MemoryStore::default();
	let session = build_session("access-1", Some("refresh-1"));

	store.save(session.clone()).await.expect("Saving session fixture into memory store should succeed.");

	let fetched = store
		.load()
		.await
		.expect("Loading session from memory store should succeed.")
		.expect("Stored session should remain present.");

	assert_eq!(fetched, session);
}

#[tokio::test]
async fn cas_success_mismatch_and_missing() {
	let store = MemoryStore::default();
	let missing = store
		.compare_and_swap_refresh("whatever", TokenPair::access_only("access"))
		.await
		.expect("CAS should report a missing session on an empty store.");

	assert_eq!(missing, CompareAndSwapOutcome::Missing);

	store
		.save(build_session("access-initial", Some("refresh-old")))
		.await
		.expect("Saving initial session into memory store should succeed.");

	let outcome = store
		.compare_and_swap_refresh("refresh-old", TokenPair::new("access-new", "refresh-new"))
		.await
		.expect("CAS operation should succeed when refresh tokens match.");

	assert_eq!(outcome, CompareAndSwapOutcome::Updated);

	let fetched = store.snapshot().expect("Updated session should remain present.");

	assert_eq!(fetched.access().expose(), "access-new");
	assert_eq!(fetched.refresh().map(TokenSecret::expose), Some("refresh-new"));
	assert_eq!(fetched.principal.map(|principal| principal.id), Some(42));

	let mismatch = store
		.compare_and_swap_refresh("refresh-old", TokenPair::new("access-x", "refresh-x"))
		.await
		.expect("CAS should report a refresh mismatch when tokens differ.");

	assert_eq!(mismatch, CompareAndSwapOutcome::RefreshMismatch);
}

#[tokio::test]
async fn concurrent_cas_allows_single_winner() {
	let store = MemoryStore::with_session(build_session("access-base", Some("refresh-base")));
	let store_a = store.clone();
	let store_b = store.clone();
	let task_a = tokio::spawn(async move {
		store_a
			.compare_and_swap_refresh("refresh-base", TokenPair::new("access-a", "refresh-a"))
			.await
			.expect("CAS task A should complete successfully.")
	});
	let task_b = tokio::spawn(async move {
		store_b
			.compare_and_swap_refresh("refresh-base", TokenPair::new("access-b", "refresh-b"))
			.await
			.expect("CAS task B should complete successfully.")
	});
	let (outcome_a, outcome_b) = tokio::join!(task_a, task_b);
	let outcome_a = outcome_a.expect("CAS task A should not panic.");
	let outcome_b = outcome_b.expect("CAS task B should not panic.");
	let successes = [outcome_a, outcome_b]
		.iter()
		.filter(|outcome| matches!(outcome, CompareAndSwapOutcome::Updated))
		.count();

	assert_eq!(successes, 1, "only one CAS should succeed");

	let final_session = store.snapshot().expect("Final session should remain present.");

	assert!(matches!(
		final_session.refresh().map(TokenSecret::expose),
		Some("refresh-a") | Some("refresh-b")
	));
}

#[tokio::test]
async fn sessions_without_refresh_tokens_never_match() {
	let store = MemoryStore::with_session(build_session("access", None));
	let outcome = store
		.compare_and_swap_refresh("", TokenPair::access_only("access-updated"))
		.await
		.expect("CAS should not error for a session without a refresh token.");

	assert_eq!(outcome, CompareAndSwapOutcome::RefreshMismatch);
}

#[tokio::test]
async fn clear_removes_tokens_and_principal_together() {
	let store = MemoryStore::with_session(build_session("access", Some("refresh")));

	store.clear().await.expect("Clearing the memory store should succeed.");

	assert!(store.load().await.expect("Loading after clear should succeed.").is_none());

	store.clear().await.expect("Clearing an empty memory store should succeed.");
}
