//! Session lifecycle: the published [`SessionState`], the single-flight refresh coordinator, and
//! the idempotent terminator.

pub mod coordinator;
pub mod terminator;

pub use coordinator::*;
pub use terminator::*;

// self
use crate::{_prelude::*, request::EndpointKind};

/// Authentication state published to observers.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
	/// No usable token pair is held.
	#[default]
	Unauthenticated,
	/// A token pair is held and no refresh is running.
	Authenticated,
	/// A refresh operation is in flight.
	Refreshing,
}
impl SessionState {
	/// Returns `true` unless the session has been torn down.
	pub const fn has_session(self) -> bool {
		!matches!(self, Self::Unauthenticated)
	}
}

/// Why a session ended.
///
/// The same value is handed to every caller released by a failed refresh.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SignOutReason {
	/// The user logged out.
	#[error("the user logged out")]
	Logout,
	/// No refresh token was available to renew the access token.
	#[error("no refresh token is available")]
	MissingRefreshToken,
	/// The refresh endpoint answered with a non-success status.
	#[error("the refresh endpoint rejected the token with status {status}")]
	RefreshRejected {
		/// HTTP status returned by the refresh endpoint.
		status: u16,
	},
	/// The refresh call failed before producing a usable response.
	#[error("the refresh call failed: {message}")]
	RefreshFailed {
		/// Description of the underlying failure.
		message: String,
	},
	/// An authentication endpoint answered 401.
	#[error("the {endpoint} endpoint rejected the credentials")]
	AuthEndpointRejected {
		/// Endpoint that answered 401.
		endpoint: EndpointKind,
	},
	/// A persisted session failed verification at startup.
	#[error("the restored session was rejected with status {status}")]
	RestoreRejected {
		/// HTTP status returned while verifying the session.
		status: u16,
	},
	/// The session was cleared while a refresh was in flight.
	#[error("the session was cleared during a refresh")]
	SessionCleared,
}
impl SignOutReason {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn label(&self) -> &'static str {
		match self {
			Self::Logout => "logout",
			Self::MissingRefreshToken => "missing_refresh_token",
			Self::RefreshRejected { .. } => "refresh_rejected",
			Self::RefreshFailed { .. } => "refresh_failed",
			Self::AuthEndpointRejected { .. } => "auth_endpoint_rejected",
			Self::RestoreRejected { .. } => "restore_rejected",
			Self::SessionCleared => "session_cleared",
		}
	}
}
