//! Client-level error types shared across the dispatcher, coordinator, and stores.

// self
use crate::{_prelude::*, request::EndpointKind, session::SignOutReason};

/// Crate-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Storage-layer failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::store::StoreError,
	),
	/// Local configuration problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// Transport failure (DNS, TCP, TLS, timeouts).
	#[error(transparent)]
	Transport(#[from] TransportError),
	/// Backend answered with a non-success status.
	#[error(transparent)]
	Api(#[from] ApiError),
	/// Response body could not be decoded into the expected shape.
	#[error("Response body with status {status} could not be decoded.")]
	Decode {
		/// Structured parsing failure, including the JSON path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status of the undecodable response.
		status: u16,
	},

	/// Session ended and no further automatic recovery will be attempted.
	#[error("Session expired: {reason}.")]
	SessionExpired {
		/// Why the session was torn down; shared by every caller released together.
		reason: SignOutReason,
	},
	/// The request was retried with a freshly minted token and still rejected.
	#[error("Credentials were rejected after a token refresh.")]
	CredentialRejected(#[source] ApiError),
	/// The caller leading the refresh was cancelled before it settled.
	#[error("Token refresh was abandoned before completion.")]
	RefreshAbandoned,
}
impl Error {
	/// Returns `true` when the error ends the session rather than a single request.
	pub fn is_terminal(&self) -> bool {
		matches!(self, Self::SessionExpired { .. } | Self::CredentialRejected(_))
	}

	/// HTTP status associated with the failure, when one was observed.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Api(api) | Self::CredentialRejected(api) => Some(api.status),
			Self::Decode { status, .. } => Some(*status),
			_ => None,
		}
	}
}

/// Configuration and request-construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] ::http::Error),
	/// Request path cannot be resolved against the base URL.
	#[error("Request path `{path}` cannot be resolved against the base URL.")]
	InvalidPath {
		/// Offending request path.
		path: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// Request body could not be serialized.
	#[error("Request body for the {endpoint} endpoint could not be serialized.")]
	RequestBody {
		/// Endpoint the body was meant for.
		endpoint: EndpointKind,
		/// Serializer failure.
		#[source]
		source: serde_json::Error,
	},
	/// Descriptor validation failed.
	#[error(transparent)]
	Descriptor(#[from] crate::api::ApiDescriptorError),
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the {endpoint} endpoint.")]
	Network {
		/// Endpoint that was being called.
		endpoint: EndpointKind,
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// The request exceeded the configured timeout.
	#[error("Request to the {endpoint} endpoint timed out.")]
	Timeout {
		/// Endpoint that was being called.
		endpoint: EndpointKind,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the backend.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(
		endpoint: EndpointKind,
		src: impl 'static + Send + Sync + std::error::Error,
	) -> Self {
		Self::Network { endpoint, source: Box::new(src) }
	}
}

/// Normalized view of a non-success backend response.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
#[error("Request failed with status {status}: {message}")]
pub struct ApiError {
	/// HTTP status code.
	pub status: u16,
	/// Human-readable message from the backend, or a status description.
	pub message: String,
	/// Field-level validation errors keyed by field name.
	pub errors: Option<BTreeMap<String, Vec<String>>>,
	/// Backend-specific error code.
	pub code: Option<String>,
	/// Retry-After hint expressed as a relative duration.
	pub retry_after: Option<Duration>,
}
impl ApiError {
	/// Builds an error carrying only a status and message.
	pub fn new(status: u16, message: impl Into<String>) -> Self {
		Self { status, message: message.into(), errors: None, code: None, retry_after: None }
	}

	/// Returns `true` for HTTP 401.
	pub fn is_unauthorized(&self) -> bool {
		self.status == 401
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn session_expired_is_terminal_and_displays_reason() {
		let err = Error::SessionExpired { reason: SignOutReason::RefreshRejected { status: 401 } };

		assert!(err.is_terminal());
		assert!(err.to_string().contains("401"));
		assert_eq!(err.status(), None);
	}

	#[test]
	fn api_error_exposes_status() {
		let err = Error::from(ApiError::new(404, "Not found."));

		assert!(!err.is_terminal());
		assert_eq!(err.status(), Some(404));
		assert_eq!(err.to_string(), "Request failed with status 404: Not found.");
	}

	#[test]
	fn credential_rejection_keeps_source() {
		let err = Error::CredentialRejected(ApiError::new(401, "Token invalid."));
		let source = StdError::source(&err).expect("Rejected credentials should expose a source.");

		assert!(err.is_terminal());
		assert!(source.to_string().contains("Token invalid."));
	}
}
