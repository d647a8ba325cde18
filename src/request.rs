//! Transport-agnostic request/response descriptors and the bearer authenticator.
//!
//! [`ApiRequest`] carries everything needed to (re)issue a call: method, path, query, headers,
//! body, and the [`EndpointKind`] that decides whether the call may enter the refresh path.
//! [`authorize`] is the only place credentials are attached to a request.

// crates.io
use ::http::{
	HeaderMap, HeaderName, HeaderValue, Method, StatusCode,
	header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE, RETRY_AFTER},
};
use serde::de::DeserializeOwned;
use time::format_description::well_known::Rfc2822;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	error::{ApiError, ConfigError},
};

/// Classifies an endpoint for the purposes of the refresh logic.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EndpointKind {
	/// Ordinary business endpoint; a 401 triggers the refresh path.
	#[default]
	Business,
	/// Login endpoint.
	Login,
	/// Refresh endpoint.
	Refresh,
	/// Logout endpoint.
	Logout,
}
impl EndpointKind {
	/// Returns `true` for login/refresh/logout, which never enter the refresh path.
	pub const fn is_auth(self) -> bool {
		!matches!(self, Self::Business)
	}

	/// Returns `true` when requests to this endpoint carry the bearer token.
	pub const fn carries_bearer(self) -> bool {
		matches!(self, Self::Business | Self::Logout)
	}

	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Self::Business => "business",
			Self::Login => "login",
			Self::Refresh => "refresh",
			Self::Logout => "logout",
		}
	}
}
impl Display for EndpointKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Replayable description of an outgoing API call.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path relative to the descriptor's base URL.
	pub path: String,
	/// Query parameters appended in order.
	pub query: Vec<(String, String)>,
	/// Extra request headers.
	pub headers: HeaderMap,
	/// Optional request body.
	pub body: Option<Vec<u8>>,
	/// Endpoint classification.
	pub endpoint: EndpointKind,
}
impl ApiRequest {
	/// Creates a business request.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self {
			method,
			path: path.into(),
			query: Vec::new(),
			headers: HeaderMap::new(),
			body: None,
			endpoint: EndpointKind::Business,
		}
	}

	/// Shorthand for a `GET` request.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// Shorthand for a `POST` request.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// Shorthand for a `PUT` request.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::PUT, path)
	}

	/// Shorthand for a `PATCH` request.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::PATCH, path)
	}

	/// Shorthand for a `DELETE` request.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Marks the request as targeting one of the authentication endpoints.
	pub fn endpoint(mut self, endpoint: EndpointKind) -> Self {
		self.endpoint = endpoint;

		self
	}

	/// Appends a query parameter.
	pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.query.push((key.into(), value.into()));

		self
	}

	/// Inserts a header, replacing any previous value.
	pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.headers.insert(name, value);

		self
	}

	/// Serializes `body` as JSON and sets the content type.
	pub fn json<T>(mut self, body: &T) -> Result<Self, ConfigError>
	where
		T: ?Sized + Serialize,
	{
		let bytes = serde_json::to_vec(body)
			.map_err(|source| ConfigError::RequestBody { endpoint: self.endpoint, source })?;

		self.headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
		self.body = Some(bytes);

		Ok(self)
	}

	/// Returns the bearer token attached to this request, if any.
	pub fn bearer(&self) -> Option<&str> {
		self.headers.get(AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ")
	}
}

/// Returns a copy of `request` carrying `access` as a bearer credential.
///
/// Login and refresh calls never carry the token. Any previous `Authorization` header is
/// replaced, or removed when `access` is `None`, so a replayed request never leaks a stale
/// credential. A token that cannot be encoded as a header value is left off and the request
/// goes out unauthenticated.
pub fn authorize(request: &ApiRequest, access: Option<&TokenSecret>) -> ApiRequest {
	let mut authorized = request.clone();

	authorized.headers.remove(AUTHORIZATION);

	if !request.endpoint.carries_bearer() {
		return authorized;
	}
	if let Some(mut value) = access.and_then(|token| HeaderValue::from_str(&token.bearer()).ok())
	{
		value.set_sensitive(true);
		authorized.headers.insert(AUTHORIZATION, value);
	}

	authorized
}

/// Buffered backend response.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// HTTP status.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Returns `true` for HTTP 401.
	pub fn is_unauthorized(&self) -> bool {
		self.status == StatusCode::UNAUTHORIZED
	}

	/// Decodes the body as JSON, reporting the failing path on mismatch.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let mut de = serde_json::Deserializer::from_slice(&self.body);

		serde_path_to_error::deserialize(&mut de)
			.map_err(|source| Error::Decode { source, status: self.status.as_u16() })
	}

	/// Returns the body as lossy UTF-8 text.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	/// Passes 2xx responses through and converts everything else into [`Error::Api`].
	pub fn error_for_status(self) -> Result<Self> {
		if self.is_success() { Ok(self) } else { Err(self.api_error().into()) }
	}

	/// Builds the normalized [`ApiError`] for this response.
	pub fn api_error(&self) -> ApiError {
		let body = serde_json::from_slice::<ErrorBody>(&self.body).ok();
		let message = body
			.as_ref()
			.and_then(ErrorBody::message)
			.unwrap_or_else(|| describe_status(self.status));
		let (errors, code) = match body {
			Some(body) => (body.errors.filter(|errors| !errors.is_empty()), body.code),
			None => (None, None),
		};

		ApiError {
			status: self.status.as_u16(),
			message,
			errors,
			code,
			retry_after: parse_retry_after(&self.headers),
		}
	}
}

/// Headers sent with every request regardless of endpoint.
pub(crate) fn default_headers(headers: &mut HeaderMap) {
	headers.entry(ACCEPT).or_insert_with(|| HeaderValue::from_static("application/json"));
}

#[derive(Deserialize)]
struct ErrorBody {
	#[serde(default)]
	message: Option<String>,
	#[serde(default)]
	detail: Option<String>,
	#[serde(default)]
	error: Option<String>,
	#[serde(default)]
	errors: Option<BTreeMap<String, Vec<String>>>,
	#[serde(default)]
	code: Option<String>,
}
impl ErrorBody {
	fn message(&self) -> Option<String> {
		[&self.message, &self.detail, &self.error]
			.into_iter()
			.flatten()
			.find(|value| !value.trim().is_empty())
			.cloned()
	}
}

fn describe_status(status: StatusCode) -> String {
	match status.canonical_reason() {
		Some(reason) => format!("{} {reason}", status.as_u16()),
		None => format!("HTTP {}", status.as_u16()),
	}
}

fn parse_retry_after(headers: &HeaderMap) -> Option<Duration> {
	let value = headers.get(RETRY_AFTER)?;
	let raw = value.to_str().ok()?.trim();

	if let Ok(secs) = raw.parse::<u64>() {
		return Some(Duration::seconds(i64::try_from(secs).unwrap_or(i64::MAX)));
	}
	if let Ok(moment) = OffsetDateTime::parse(raw, &Rfc2822) {
		let delta = moment - OffsetDateTime::now_utc();

		if delta.is_positive() {
			return Some(delta);
		}
	}

	None
}
