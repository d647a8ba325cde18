//! Access/refresh token pair issued by the identity backend.

// self
use crate::{_prelude::*, auth::token::secret::TokenSecret};

/// Access/refresh pair replaced as a single unit on login and rotation.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPair {
	/// Short-lived bearer credential attached to business requests.
	pub access: TokenSecret,
	/// Longer-lived credential used solely to mint a new access token.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub refresh: Option<TokenSecret>,
}
impl TokenPair {
	/// Creates a pair holding both secrets.
	pub fn new(access: impl Into<TokenSecret>, refresh: impl Into<TokenSecret>) -> Self {
		Self { access: access.into(), refresh: Some(refresh.into()) }
	}

	/// Creates a pair without a refresh token; such a session cannot be renewed.
	pub fn access_only(access: impl Into<TokenSecret>) -> Self {
		Self { access: access.into(), refresh: None }
	}

	/// Returns the refresh token when one is present and non-blank.
	pub fn refresh_token(&self) -> Option<&TokenSecret> {
		self.refresh.as_ref().filter(|secret| !secret.is_blank())
	}

	/// Keeps `previous` as the refresh token when the backend did not rotate it.
	pub fn or_previous_refresh(mut self, previous: Option<&TokenSecret>) -> Self {
		if self.refresh_token().is_none() {
			self.refresh = previous.cloned();
		}

		self
	}
}
impl Debug for TokenPair {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("TokenPair")
			.field("access", &"<redacted>")
			.field("refresh", &self.refresh.as_ref().map(|_| "<redacted>"))
			.finish()
	}
}
