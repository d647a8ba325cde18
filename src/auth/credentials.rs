//! Request bodies for the `/auth/*` endpoints.

// self
use crate::{
	_prelude::*,
	auth::{Principal, TokenSecret},
};

/// E-mail/password pair posted to the login endpoint.
#[derive(Clone, Serialize)]
pub struct LoginCredentials {
	/// Account e-mail address.
	pub email: String,
	/// Account password.
	pub password: String,
}
impl LoginCredentials {
	/// Creates a credential pair.
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
		Self { email: email.into(), password: password.into() }
	}
}
impl Debug for LoginCredentials {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginCredentials")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Successful login payload.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct LoginResponse {
	pub(crate) access: TokenSecret,
	pub(crate) refresh: TokenSecret,
	pub(crate) user: Principal,
}

/// Body posted to the refresh and logout endpoints.
#[derive(Serialize)]
pub(crate) struct RefreshBody<'a> {
	pub(crate) refresh: &'a str,
}

/// Successful refresh payload; `refresh` is absent when the backend does not rotate it.
#[derive(Clone, Debug, Deserialize)]
pub(crate) struct RefreshResponse {
	pub(crate) access: TokenSecret,
	#[serde(default)]
	pub(crate) refresh: Option<TokenSecret>,
}

/// Body posted to the change-password endpoint.
#[derive(Serialize)]
pub(crate) struct PasswordChange<'a> {
	pub(crate) old_password: &'a str,
	pub(crate) new_password: &'a str,
}

/// Body posted to the password-reset request endpoint.
#[derive(Serialize)]
pub(crate) struct PasswordResetRequest<'a> {
	pub(crate) email: &'a str,
}

/// Body posted to the password-reset confirmation endpoint.
#[derive(Serialize)]
pub(crate) struct PasswordResetConfirm<'a> {
	pub(crate) token: &'a str,
	pub(crate) new_password: &'a str,
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn credentials_debug_hides_password() {
		let rendered = format!("{:?}", LoginCredentials::new("a@example.com", "hunter2"));

		assert!(rendered.contains("a@example.com"));
		assert!(!rendered.contains("hunter2"));
	}

	#[test]
	fn refresh_response_tolerates_missing_rotation() {
		let response: RefreshResponse = serde_json::from_str(r#"{"access":"a-2"}"#)
			.expect("Refresh payload without rotation should parse.");

		assert_eq!(response.access.expose(), "a-2");
		assert!(response.refresh.is_none());
	}
}
