//! Refresh operation: exchange the stored refresh token for a new pair.
//!
//! Only the coordinator's leader reaches [`SessionClient::refresh_tokens`]. Any failure, be it a
//! missing refresh token, a non-2xx answer, an undecodable body, or a transport error, tears the
//! session down before the waiters are released. Rotation is stored with a compare-and-swap on
//! the refresh token that was sent, so a login or logout that raced the refresh wins.

// self
use crate::{
	_prelude::*,
	auth::{RefreshBody, RefreshResponse, TokenPair, TokenSecret},
	client::SessionClient,
	http::{HttpTransport, TransportErrorMapper},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	request::{ApiRequest, EndpointKind},
	session::{RefreshOutcome, SignOutReason},
	store::CompareAndSwapOutcome,
};

impl<C, M> SessionClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Resolves an expired credential into a usable access token.
	///
	/// `sent_with` is the token the rejected request carried. When the stored token already
	/// differs from it, the pair rotated while the request was in flight and the stored token is
	/// returned without another refresh. When nothing is stored, the session was torn down after
	/// the request left and the caller fails with [`SignOutReason::SessionCleared`] without
	/// starting a refresh. Otherwise the caller joins the single in-flight refresh, starting it if
	/// necessary.
	pub async fn handle_expired_credential(&self, sent_with: &TokenSecret) -> Result<TokenSecret> {
		let Some(current) = self.stored_access().await? else {
			return Err(Error::SessionExpired { reason: SignOutReason::SessionCleared });
		};

		if current != *sent_with {
			return Ok(current);
		}

		self.coordinator.coalesce(|| self.refresh_tokens(sent_with)).await
	}

	async fn refresh_tokens(&self, sent_with: &TokenSecret) -> RefreshOutcome {
		const KIND: OperationKind = OperationKind::Refresh;

		let span = OperationSpan::new(KIND, "refresh_tokens");

		obs::record_operation_outcome(KIND, OperationOutcome::Attempt);

		let outcome = span.instrument(self.exchange_refresh_token(sent_with)).await;

		obs::record_operation_outcome(KIND, OperationOutcome::of(&outcome));

		if let Err(reason) = &outcome {
			// Waiters get the reason either way; a failed clear is traced and counted by the
			// terminator.
			let _ = self.terminator.terminate(reason.clone()).await;
		}

		outcome
	}

	async fn exchange_refresh_token(&self, sent_with: &TokenSecret) -> RefreshOutcome {
		let Some(session) = self.store.load().await.map_err(refresh_failed)? else {
			return Err(SignOutReason::SessionCleared);
		};

		// Another cycle finished between the caller's check and this one.
		if !session.access().is_blank() && session.access() != sent_with {
			return Ok(session.tokens.access);
		}

		let Some(refresh) = session.refresh().cloned() else {
			return Err(SignOutReason::MissingRefreshToken);
		};
		let request = ApiRequest::post(self.descriptor.paths.refresh.as_str())
			.endpoint(EndpointKind::Refresh)
			.json(&RefreshBody { refresh: refresh.expose() })
			.map_err(refresh_failed)?;
		let response = self.execute(&request, None).await.map_err(refresh_failed)?;

		if !response.is_success() {
			return Err(SignOutReason::RefreshRejected { status: response.status.as_u16() });
		}

		let body = response.json::<RefreshResponse>().map_err(refresh_failed)?;

		if body.access.is_blank() {
			return Err(SignOutReason::RefreshFailed {
				message: "The refresh response did not contain an access token.".into(),
			});
		}

		let replacement =
			TokenPair { access: body.access, refresh: body.refresh }.or_previous_refresh(Some(&refresh));
		let access = replacement.access.clone();
		let _write = self.write_guard.lock().await;
		let outcome = self
			.store
			.compare_and_swap_refresh(refresh.expose(), replacement)
			.await
			.map_err(refresh_failed)?;

		match outcome {
			CompareAndSwapOutcome::Updated => {
				self.coordinator.mark_authenticated();

				Ok(access)
			},
			// A login replaced the pair mid-refresh; its token is the one to use.
			CompareAndSwapOutcome::RefreshMismatch => self
				.store
				.load()
				.await
				.map_err(refresh_failed)?
				.map(|session| session.tokens.access)
				.ok_or(SignOutReason::SessionCleared),
			CompareAndSwapOutcome::Missing => Err(SignOutReason::SessionCleared),
		}
	}
}

fn refresh_failed(error: impl Display) -> SignOutReason {
	SignOutReason::RefreshFailed { message: error.to_string() }
}

#[cfg(all(test, feature = "reqwest"))]
mod tests {
	// crates.io
	use httpmock::prelude::*;
	// self
	use super::*;
	use crate::{
		_preludet::build_reqwest_test_client,
		store::{StoredSession, TokenStore},
	};

	#[tokio::test]
	async fn leader_reuses_a_pair_rotated_before_it_started() {
		let server = MockServer::start_async().await;
		let (client, store) = build_reqwest_test_client(&server.base_url());
		let refresh = server
			.mock_async(|when, then| {
				when.method(POST).path("/auth/refresh/");
				then.status(200).json_body(serde_json::json!({ "access": "access-3" }));
			})
			.await;

		store
			.save(StoredSession::new(TokenPair::new("access-2", "refresh-2")))
			.await
			.expect("Seeding the rotated session should succeed.");

		let stale = TokenSecret::new("access-1");
		let token = client
			.coordinator
			.coalesce(|| client.refresh_tokens(&stale))
			.await
			.expect("The rotated token should be handed out.");

		assert_eq!(token.expose(), "access-2");
		refresh.assert_calls_async(0).await;
		assert_eq!(
			store.snapshot().and_then(|session| session.refresh().map(|t| t.expose().to_owned())),
			Some("refresh-2".into())
		);
	}
}
