//! Account helpers and read-only views of the stored session.

// self
use crate::{
	_prelude::*,
	auth::{PasswordChange, PasswordResetConfirm, PasswordResetRequest, Principal, TokenSecret},
	client::SessionClient,
	http::{HttpTransport, TransportErrorMapper},
	request::ApiRequest,
};

impl<C, M> SessionClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Last-known principal from the store.
	pub async fn current_user(&self) -> Result<Option<Principal>> {
		Ok(self.store.load().await?.and_then(|session| session.principal))
	}

	/// Returns `true` while the store holds a usable access token.
	pub async fn is_authenticated(&self) -> Result<bool> {
		Ok(self.stored_access().await?.is_some())
	}

	/// Current access token, if any.
	pub async fn access_token(&self) -> Result<Option<TokenSecret>> {
		self.stored_access().await
	}

	/// Fetches the authenticated principal and records it as the stored snapshot.
	pub async fn fetch_current_user(&self) -> Result<Principal> {
		let principal = self.get_json::<Principal>(self.descriptor.paths.me.as_str()).await?;
		let _write = self.write_guard.lock().await;

		if let Some(mut session) = self.store.load().await? {
			session.principal = Some(principal.clone());

			self.store.save(session).await?;
		}

		Ok(principal)
	}

	/// Changes the password of the authenticated principal.
	pub async fn change_password(&self, old_password: &str, new_password: &str) -> Result<()> {
		let request = ApiRequest::post(self.descriptor.paths.change_password.as_str())
			.json(&PasswordChange { old_password, new_password })?;

		self.send(request).await?;

		Ok(())
	}

	/// Starts a password reset for `email`.
	pub async fn request_password_reset(&self, email: &str) -> Result<()> {
		let request = ApiRequest::post(self.descriptor.paths.password_reset.as_str())
			.json(&PasswordResetRequest { email })?;

		self.send(request).await?;

		Ok(())
	}

	/// Completes a password reset with the token delivered out of band.
	pub async fn confirm_password_reset(&self, token: &str, new_password: &str) -> Result<()> {
		let request = ApiRequest::post(self.descriptor.paths.password_reset_confirm.as_str())
			.json(&PasswordResetConfirm { token, new_password })?;

		self.send(request).await?;

		Ok(())
	}
}
