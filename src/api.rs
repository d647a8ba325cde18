//! Backend descriptor: base URL, timeout, and the `/auth/*` routes the session layer owns.
//!
//! [`ApiDescriptor`] is the client's only configuration surface. Build it with
//! [`ApiDescriptor::builder`], deserialize it from a config file, or read it from the
//! environment with [`ApiDescriptor::from_env`].

/// Builder API for assembling descriptors.
pub mod builder;
/// Route table for the authentication endpoints.
pub mod paths;

pub use builder::*;
pub use paths::*;

// self
use crate::{_prelude::*, error::ConfigError, request::EndpointKind};

/// Environment variable holding the backend base URL.
pub const ENV_BASE_URL: &str = "SESSION_API_BASE_URL";
/// Environment variable holding the request timeout in milliseconds.
pub const ENV_TIMEOUT_MS: &str = "SESSION_API_TIMEOUT_MS";
/// Base URL used when none is configured.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8000/api";
/// Request timeout used when none is configured.
pub const DEFAULT_TIMEOUT: Duration = Duration::milliseconds(10_000);

/// Immutable backend descriptor consumed by the session client.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "ApiDescriptorBuilder")]
pub struct ApiDescriptor {
	/// Base URL every request path is resolved against; always ends with `/`.
	pub base_url: Url,
	/// Per-request timeout handed to the transport.
	pub timeout: Duration,
	/// Authentication routes.
	pub paths: AuthPaths,
}
impl ApiDescriptor {
	/// Creates a new builder rooted at `base_url`.
	pub fn builder(base_url: Url) -> ApiDescriptorBuilder {
		ApiDescriptorBuilder::new(base_url)
	}

	/// Reads the descriptor from `SESSION_API_BASE_URL` and `SESSION_API_TIMEOUT_MS`, falling back
	/// to `http://localhost:8000/api` and 10 seconds.
	pub fn from_env() -> Result<Self, ApiDescriptorError> {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	/// Same as [`ApiDescriptor::from_env`] but reads variables through `lookup`.
	pub fn from_lookup<F>(lookup: F) -> Result<Self, ApiDescriptorError>
	where
		F: Fn(&str) -> Option<String>,
	{
		let raw_base = lookup(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_owned());
		let base_url = Url::parse(raw_base.trim()).map_err(|_| ApiDescriptorError::InvalidEnv {
			variable: ENV_BASE_URL,
			value: raw_base.clone(),
		})?;
		let mut builder = Self::builder(base_url);

		if let Some(raw_timeout) = lookup(ENV_TIMEOUT_MS) {
			let millis = raw_timeout.trim().parse::<i64>().map_err(|_| {
				ApiDescriptorError::InvalidEnv { variable: ENV_TIMEOUT_MS, value: raw_timeout.clone() }
			})?;

			builder = builder.timeout(Duration::milliseconds(millis));
		}

		builder.build()
	}

	/// Resolves a request path against the base URL.
	pub fn endpoint(&self, path: &str) -> Result<Url, ConfigError> {
		self.base_url
			.join(path.trim_start_matches('/'))
			.map_err(|source| ConfigError::InvalidPath { path: path.to_owned(), source })
	}

	/// Classifies a request path as one of the authentication endpoints, if it matches.
	pub fn classify(&self, path: &str) -> Option<EndpointKind> {
		self.paths.classify(path)
	}
}

/// Ensures the base URL path ends with `/` so relative joins append instead of replacing the
/// last segment.
pub(crate) fn normalize_base(mut url: Url) -> Url {
	if !url.path().ends_with('/') {
		let path = format!("{}/", url.path());

		url.set_path(&path);
	}

	url.set_query(None);
	url.set_fragment(None);

	url
}
