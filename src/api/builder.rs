// self
use crate::{
	_prelude::*,
	api::{ApiDescriptor, AuthPaths, DEFAULT_TIMEOUT, normalize_base},
};

/// Errors raised while constructing or validating descriptors.
#[derive(Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ApiDescriptorError {
	/// Only `http` and `https` backends are supported.
	#[error("The base URL must use http or https: {url}.")]
	UnsupportedScheme {
		/// URL that failed validation.
		url: String,
	},
	/// Base URLs such as `mailto:` cannot have paths joined onto them.
	#[error("The base URL cannot be used as a base: {url}.")]
	CannotBeABase {
		/// URL that failed validation.
		url: String,
	},
	/// Timeouts must be strictly positive.
	#[error("Request timeout must be positive.")]
	NonPositiveTimeout,
	/// Authentication routes cannot be blank.
	#[error("The {endpoint} path cannot be empty.")]
	EmptyAuthPath {
		/// Which route failed validation.
		endpoint: &'static str,
	},
	/// Login, refresh, and logout must be distinct routes.
	#[error("The {first} and {second} paths must differ.")]
	DuplicateAuthPath {
		/// First colliding route.
		first: &'static str,
		/// Second colliding route.
		second: &'static str,
	},
	/// Environment variable could not be parsed.
	#[error("Environment variable {variable} has an invalid value: {value}.")]
	InvalidEnv {
		/// Variable name.
		variable: &'static str,
		/// Raw value that failed to parse.
		value: String,
	},
}

/// Builder for [`ApiDescriptor`] values.
///
/// Deserialized descriptors go through this type, so config files get the same validation as
/// programmatic construction.
#[derive(Debug, Deserialize)]
pub struct ApiDescriptorBuilder {
	/// Backend base URL.
	pub base_url: Url,
	/// Per-request timeout.
	#[serde(default = "default_timeout")]
	pub timeout: Duration,
	/// Authentication routes.
	#[serde(default)]
	pub paths: AuthPaths,
}
impl ApiDescriptorBuilder {
	/// Creates a new builder seeded with the provided base URL.
	pub fn new(base_url: Url) -> Self {
		Self { base_url, timeout: DEFAULT_TIMEOUT, paths: AuthPaths::default() }
	}

	/// Overrides the per-request timeout (defaults to 10 seconds).
	pub fn timeout(mut self, timeout: Duration) -> Self {
		self.timeout = timeout;

		self
	}

	/// Overrides the authentication routes.
	pub fn paths(mut self, paths: AuthPaths) -> Self {
		self.paths = paths;

		self
	}

	/// Consumes the builder and validates the resulting descriptor.
	pub fn build(self) -> Result<ApiDescriptor, ApiDescriptorError> {
		let descriptor = ApiDescriptor {
			base_url: normalize_base(self.base_url),
			timeout: self.timeout,
			paths: self.paths,
		};

		descriptor.validate()?;

		Ok(descriptor)
	}
}

impl TryFrom<ApiDescriptorBuilder> for ApiDescriptor {
	type Error = ApiDescriptorError;

	fn try_from(builder: ApiDescriptorBuilder) -> Result<Self, Self::Error> {
		builder.build()
	}
}

impl ApiDescriptor {
	/// Validates invariants for the descriptor.
	fn validate(&self) -> Result<(), ApiDescriptorError> {
		if !matches!(self.base_url.scheme(), "http" | "https") {
			return Err(ApiDescriptorError::UnsupportedScheme { url: self.base_url.to_string() });
		}
		if self.base_url.cannot_be_a_base() {
			return Err(ApiDescriptorError::CannotBeABase { url: self.base_url.to_string() });
		}
		if !self.timeout.is_positive() {
			return Err(ApiDescriptorError::NonPositiveTimeout);
		}

		self.paths.validate()
	}
}

fn default_timeout() -> Duration {
	DEFAULT_TIMEOUT
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	fn url(value: &str) -> Url {
		Url::parse(value).expect("Failed to parse descriptor test URL.")
	}

	#[test]
	fn builder_normalizes_trailing_slash_and_query() {
		let descriptor = ApiDescriptor::builder(url("https://example.com/api?debug=1"))
			.build()
			.expect("Descriptor should build for a plain https URL.");

		assert_eq!(descriptor.base_url.as_str(), "https://example.com/api/");
	}

	#[test]
	fn builder_rejects_invalid_settings() {
		let err = ApiDescriptor::builder(url("ftp://example.com/"))
			.build()
			.expect_err("Non-HTTP schemes should be rejected.");

		assert!(matches!(err, ApiDescriptorError::UnsupportedScheme { .. }));

		let err = ApiDescriptor::builder(url("https://example.com/"))
			.timeout(Duration::ZERO)
			.build()
			.expect_err("Zero timeout should be rejected.");

		assert_eq!(err, ApiDescriptorError::NonPositiveTimeout);

		let paths = AuthPaths { refresh: "auth/login/".into(), ..AuthPaths::default() };
		let err = ApiDescriptor::builder(url("https://example.com/"))
			.paths(paths)
			.build()
			.expect_err("Colliding auth paths should be rejected.");

		assert_eq!(
			err,
			ApiDescriptorError::DuplicateAuthPath { first: "login", second: "refresh" }
		);
	}

	#[test]
	fn deserialized_descriptors_are_validated() {
		let valid = ApiDescriptor::builder(url("https://example.com/api/"))
			.build()
			.expect("Descriptor should build for a plain https URL.");
		let mut raw = serde_json::to_value(&valid).expect("Descriptor should serialize.");

		raw["base_url"] = serde_json::json!("https://example.com/v2?debug=1");

		let normalized: ApiDescriptor = serde_json::from_value(raw.clone())
			.expect("A descriptor without a trailing slash should still load.");

		assert_eq!(normalized.base_url.as_str(), "https://example.com/v2/");

		raw["timeout"] =
			serde_json::to_value(Duration::seconds(-5)).expect("Duration should serialize.");

		let err = serde_json::from_value::<ApiDescriptor>(raw.clone())
			.expect_err("A negative timeout should be rejected.");

		assert!(err.to_string().contains("timeout must be positive"));

		raw["timeout"] =
			serde_json::to_value(Duration::seconds(5)).expect("Duration should serialize.");
		raw["paths"]["logout"] = serde_json::json!("auth/refresh/");

		let err = serde_json::from_value::<ApiDescriptor>(raw)
			.expect_err("Colliding auth paths should be rejected.");

		assert!(err.to_string().contains("refresh and logout paths must differ"));
	}

	#[test]
	fn deserialized_descriptor_defaults_timeout_and_paths() {
		let descriptor: ApiDescriptor =
			serde_json::from_value(serde_json::json!({ "base_url": "http://localhost:8000/api" }))
				.expect("A descriptor with only a base URL should load.");

		assert_eq!(descriptor.base_url.as_str(), "http://localhost:8000/api/");
		assert_eq!(descriptor.timeout, DEFAULT_TIMEOUT);
		assert_eq!(descriptor.paths, AuthPaths::default());
	}
}
