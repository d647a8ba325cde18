//! Login, logout, and startup restoration.

// self
use crate::{
	_prelude::*,
	auth::{LoginCredentials, LoginResponse, Principal, RefreshBody, TokenPair},
	client::SessionClient,
	http::{HttpTransport, TransportErrorMapper},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	request::{ApiRequest, EndpointKind},
	session::SignOutReason,
	store::StoredSession,
};

impl<C, M> SessionClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Exchanges e-mail/password for a token pair and stores the new session.
	///
	/// Rejected credentials surface as [`Error::Api`] carrying the backend's message. A 401
	/// also tears down whatever session was held before.
	pub async fn login(&self, credentials: &LoginCredentials) -> Result<Principal> {
		const KIND: OperationKind = OperationKind::Login;

		let span = OperationSpan::new(KIND, "login");

		obs::record_operation_outcome(KIND, OperationOutcome::Attempt);

		let result = span
			.instrument(async move {
				let request = ApiRequest::post(self.descriptor.paths.login.as_str())
					.endpoint(EndpointKind::Login)
					.json(credentials)?;
				let body = self.send_auth(request).await?.json::<LoginResponse>()?;
				let session = StoredSession::new(TokenPair::new(body.access, body.refresh))
					.with_principal(body.user.clone());
				let _write = self.write_guard.lock().await;

				self.store.save(session).await?;
				self.coordinator.mark_authenticated();

				Ok(body.user)
			})
			.await;

		obs::record_operation_outcome(KIND, OperationOutcome::of(&result));

		result
	}

	/// Logs out on the backend, then clears the local session.
	///
	/// The backend call is best effort: its failures are logged and the local teardown always
	/// runs. Only a failure to clear the store is returned.
	pub async fn logout(&self) -> Result<()> {
		const KIND: OperationKind = OperationKind::Logout;

		let span = OperationSpan::new(KIND, "logout");

		obs::record_operation_outcome(KIND, OperationOutcome::Attempt);

		let result = span
			.instrument(async move {
				if let Err(err) = self.revoke_remote().await {
					obs::trace_logout_failure(&err);
				}

				self.terminator.terminate(SignOutReason::Logout).await.map(|_| ())
			})
			.await;

		obs::record_operation_outcome(KIND, OperationOutcome::of(&result));

		result
	}

	/// Picks up a persisted session at startup and verifies it against the backend.
	///
	/// Returns the refreshed principal, or `None` when nothing was stored or the backend
	/// rejected the session; a rejected session is cleared. Transport failures propagate and
	/// leave the stored session in place so a later restore can retry.
	pub async fn restore(&self) -> Result<Option<Principal>> {
		if self.stored_access().await?.is_none() {
			self.coordinator.mark_unauthenticated(false);

			return Ok(None);
		}

		self.coordinator.mark_authenticated();

		match self.fetch_current_user().await {
			Ok(principal) => Ok(Some(principal)),
			Err(Error::SessionExpired { .. }) => Ok(None),
			Err(Error::Api(api) | Error::CredentialRejected(api))
				if matches!(api.status, 401 | 403) =>
			{
				self.terminator.terminate(SignOutReason::RestoreRejected { status: api.status }).await?;

				Ok(None)
			},
			Err(err) => Err(err),
		}
	}

	async fn revoke_remote(&self) -> Result<()> {
		let Some(session) = self.store.load().await? else {
			return Ok(());
		};
		let Some(refresh) = session.refresh() else {
			return Ok(());
		};
		let request = ApiRequest::post(self.descriptor.paths.logout.as_str())
			.endpoint(EndpointKind::Logout)
			.json(&RefreshBody { refresh: refresh.expose() })?;

		self.execute(&request, Some(session.access())).await?.error_for_status()?;

		Ok(())
	}
}
