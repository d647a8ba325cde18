// self
use crate::{_prelude::*, api::ApiDescriptorError, request::EndpointKind};

/// Routes of the authentication endpoints, relative to the base URL.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthPaths {
	/// Exchanges e-mail/password for a token pair.
	pub login: String,
	/// Exchanges a refresh token for a new pair.
	pub refresh: String,
	/// Invalidates a refresh token server-side.
	pub logout: String,
	/// Returns the current principal.
	pub me: String,
	/// Changes the password of the current principal.
	pub change_password: String,
	/// Starts a password reset.
	pub password_reset: String,
	/// Completes a password reset.
	pub password_reset_confirm: String,
}
impl AuthPaths {
	/// Maps a request path onto login/refresh/logout when it targets one of them.
	///
	/// Leading and trailing slashes are ignored, so `/auth/refresh` and `auth/refresh/` both
	/// match the default refresh route.
	pub fn classify(&self, path: &str) -> Option<EndpointKind> {
		let path = trim_slashes(strip_query(path));

		[
			(&self.login, EndpointKind::Login),
			(&self.refresh, EndpointKind::Refresh),
			(&self.logout, EndpointKind::Logout),
		]
		.into_iter()
		.find(|(route, _)| trim_slashes(route) == path)
		.map(|(_, kind)| kind)
	}

	pub(crate) fn validate(&self) -> Result<(), ApiDescriptorError> {
		let routes = [
			("login", &self.login),
			("refresh", &self.refresh),
			("logout", &self.logout),
			("me", &self.me),
			("change_password", &self.change_password),
			("password_reset", &self.password_reset),
			("password_reset_confirm", &self.password_reset_confirm),
		];

		for (endpoint, route) in routes {
			if trim_slashes(route).is_empty() {
				return Err(ApiDescriptorError::EmptyAuthPath { endpoint });
			}
		}

		let auth = &routes[..3];

		for (idx, (first, a)) in auth.iter().enumerate() {
			for (second, b) in &auth[idx + 1..] {
				if trim_slashes(a) == trim_slashes(b) {
					return Err(ApiDescriptorError::DuplicateAuthPath {
						first: *first,
						second: *second,
					});
				}
			}
		}

		Ok(())
	}
}
impl Default for AuthPaths {
	fn default() -> Self {
		Self {
			login: "auth/login/".into(),
			refresh: "auth/refresh/".into(),
			logout: "auth/logout/".into(),
			me: "auth/me/".into(),
			change_password: "auth/change-password/".into(),
			password_reset: "auth/password-reset/".into(),
			password_reset_confirm: "auth/password-reset/confirm/".into(),
		}
	}
}

fn trim_slashes(path: &str) -> &str {
	path.trim().trim_matches('/')
}

fn strip_query(path: &str) -> &str {
	path.split(['?', '#']).next().unwrap_or(path)
}
