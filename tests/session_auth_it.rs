#![cfg(feature = "reqwest")]

// crates.io
use httpmock::prelude::*;
use serde_json::json;
// self
use session_broker::{
	_preludet::*,
	auth::{LoginCredentials, Principal, TokenPair, TokenSecret},
	session::SessionState,
	store::{MemoryStore, StoredSession, TokenStore},
};

fn user_json() -> serde_json::Value {
	json!({
		"id": 12,
		"email": "ana@example.com",
		"first_name": "Ana",
		"last_name": "Ruiz",
		"role": "supervisor",
		"company": 3,
	})
}

async fn seed(store: &MemoryStore, tokens: TokenPair) {
	store
		.save(StoredSession::new(tokens).with_principal(Principal::new(12, "stale@example.com")))
		.await
		.expect("Failed to seed the session into the memory store.");
}

#[tokio::test]
async fn login_stores_the_pair_and_principal() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());
	let login = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/login/")
				.header_missing("authorization")
				.json_body(json!({ "email": "ana@example.com", "password": "hunter2" }));
			then.status(200).json_body(json!({
				"access": "access-1",
				"refresh": "refresh-1",
				"user": user_json(),
			}));
		})
		.await;
	let mut state = client.subscribe();
	let principal = client
		.login(&LoginCredentials::new("ana@example.com", "hunter2"))
		.await
		.expect("Login should succeed against the mock backend.");

	login.assert_async().await;
	assert_eq!(principal.display_name().as_deref(), Some("Ana Ruiz"));
	assert!(state.has_changed().expect("Client should still be alive."));
	assert_eq!(*state.borrow_and_update(), SessionState::Authenticated);

	let stored = store.snapshot().expect("Login should persist the session.");

	assert_eq!(stored.access().expose(), "access-1");
	assert_eq!(stored.refresh().map(TokenSecret::expose), Some("refresh-1"));
	assert_eq!(stored.principal, Some(principal));
	assert!(client.is_authenticated().await.expect("Store read should succeed."));
}

#[tokio::test]
async fn rejected_login_reports_backend_message() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/login/");
			then.status(401)
				.json_body(json!({ "detail": "No active account found with the given credentials" }));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh/");
			then.status(200);
		})
		.await;

	seed(&store, TokenPair::new("access-old", "refresh-old")).await;

	let err = client
		.login(&LoginCredentials::new("ana@example.com", "wrong"))
		.await
		.expect_err("Login with bad credentials should fail.");

	match err {
		Error::Api(api) => {
			assert_eq!(api.status, 401);
			assert_eq!(api.message, "No active account found with the given credentials");
		},
		other => panic!("Unexpected error variant: {other:?}."),
	}

	login.assert_calls_async(1).await;
	refresh.assert_calls_async(0).await;
	assert!(store.snapshot().is_none());
}

#[tokio::test]
async fn logout_clears_locally_even_when_backend_fails() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());
	let logout = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/logout/")
				.header("authorization", "Bearer access-1")
				.json_body(json!({ "refresh": "refresh-1" }));
			then.status(500);
		})
		.await;

	seed(&store, TokenPair::new("access-1", "refresh-1")).await;

	client.logout().await.expect("Logout should succeed despite the backend failure.");
	logout.assert_async().await;

	assert!(store.snapshot().is_none());
	assert_eq!(client.state(), SessionState::Unauthenticated);
	assert_eq!(client.metrics().sign_outs(), 1);
	assert!(client.current_user().await.expect("Store read should succeed.").is_none());

	client.logout().await.expect("Logging out twice should be harmless.");

	logout.assert_calls_async(1).await;
	assert_eq!(client.metrics().sign_outs(), 1);
}

#[tokio::test]
async fn restore_verifies_and_updates_the_principal() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());
	let me = server
		.mock_async(|when, then| {
			when.method(GET).path("/auth/me/").header("authorization", "Bearer access-1");
			then.status(200).json_body(user_json());
		})
		.await;

	seed(&store, TokenPair::new("access-1", "refresh-1")).await;

	let principal = client
		.restore()
		.await
		.expect("Restore should succeed.")
		.expect("A verified session should yield a principal.");

	me.assert_async().await;
	assert_eq!(principal.email, "ana@example.com");
	assert_eq!(client.state(), SessionState::Authenticated);
	assert_eq!(
		client
			.current_user()
			.await
			.expect("Store read should succeed.")
			.map(|user| user.email),
		Some("ana@example.com".into())
	);
}

#[tokio::test]
async fn restore_clears_a_session_the_backend_rejects() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());
	let me = server
		.mock_async(|when, then| {
			when.method(GET).path("/auth/me/");
			then.status(401);
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/auth/refresh/");
			then.status(401);
		})
		.await;

	seed(&store, TokenPair::new("access-1", "refresh-1")).await;

	let restored = client.restore().await.expect("A rejected session is not an error.");

	assert!(restored.is_none());
	me.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;
	assert!(store.snapshot().is_none());
	assert_eq!(client.state(), SessionState::Unauthenticated);
}

#[tokio::test]
async fn restore_without_a_session_makes_no_calls() {
	let server = MockServer::start_async().await;
	let (client, _store) = build_reqwest_test_client(&server.base_url());
	let me = server
		.mock_async(|when, then| {
			when.method(GET).path("/auth/me/");
			then.status(200).json_body(user_json());
		})
		.await;

	assert!(client.restore().await.expect("Restore should succeed.").is_none());
	me.assert_calls_async(0).await;
}

#[tokio::test]
async fn password_helpers_post_expected_bodies() {
	let server = MockServer::start_async().await;
	let (client, store) = build_reqwest_test_client(&server.base_url());
	let change = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/change-password/")
				.header("authorization", "Bearer access-1")
				.json_body(json!({ "old_password": "old", "new_password": "new" }));
			then.status(200).json_body(json!({ "message": "Password updated." }));
		})
		.await;
	let reset = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/password-reset/")
				.json_body(json!({ "email": "ana@example.com" }));
			then.status(200);
		})
		.await;
	let confirm = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/auth/password-reset/confirm/")
				.json_body(json!({ "token": "reset-token", "new_password": "new" }));
			then.status(400).json_body(json!({ "message": "Token expired." }));
		})
		.await;

	seed(&store, TokenPair::new("access-1", "refresh-1")).await;

	client.change_password("old", "new").await.expect("Password change should succeed.");
	client
		.request_password_reset("ana@example.com")
		.await
		.expect("Password reset request should succeed.");

	let err = client
		.confirm_password_reset("reset-token", "new")
		.await
		.expect_err("An expired reset token should be rejected.");

	assert_eq!(err.status(), Some(400));
	change.assert_async().await;
	reset.assert_async().await;
	confirm.assert_async().await;
}
