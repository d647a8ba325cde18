//! Request pipeline: authenticate, send, and replay once after a credential renewal.

// crates.io
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::TokenSecret,
	client::SessionClient,
	http::{HttpRequest, HttpTransport, TransportErrorMapper},
	obs::{self, OperationKind, OperationOutcome, OperationSpan},
	request::{self, ApiRequest, ApiResponse},
	session::SignOutReason,
};

impl<C, M> SessionClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Sends `request` and returns the 2xx response.
	///
	/// Requests whose path matches a configured login/refresh/logout route are treated as
	/// authentication calls and never enter the refresh path. For everything else, a 401
	/// produced by a request that carried an access token is resolved through
	/// [`SessionClient::handle_expired_credential`] and the request is replayed exactly once;
	/// the replay's outcome is returned as if it were the first. Non-2xx responses surface as
	/// [`Error::Api`].
	pub async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
		let request = self.classify(request);

		if request.endpoint.is_auth() {
			return self.send_auth(request).await;
		}

		const KIND: OperationKind = OperationKind::Request;

		let span = OperationSpan::new(KIND, "send");

		obs::record_operation_outcome(KIND, OperationOutcome::Attempt);

		let result = span
			.instrument(async move {
				let access = self.stored_access().await?;
				let response = self.execute(&request, access.as_ref()).await?;

				if !response.is_unauthorized() {
					return response.error_for_status();
				}

				// Without a credential there is nothing to renew.
				let Some(sent_with) = access else {
					return response.error_for_status();
				};
				let fresh = self.handle_expired_credential(&sent_with).await?;

				self.retry(&request, &fresh).await
			})
			.await;

		obs::record_operation_outcome(KIND, OperationOutcome::of(&result));

		result
	}

	/// Sends a `GET` to `path` and decodes the JSON body.
	pub async fn get_json<T>(&self, path: &str) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.send(ApiRequest::get(path)).await?.json()
	}

	/// Sends a JSON `POST` to `path` and decodes the JSON body.
	pub async fn post_json<B, T>(&self, path: &str, body: &B) -> Result<T>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		self.send(ApiRequest::post(path).json(body)?).await?.json()
	}

	/// Sends a login/refresh/logout request without touching the refresh path.
	///
	/// A 401 from one of these endpoints means the credentials themselves are unusable, so the
	/// session is torn down before the error is returned.
	pub(crate) async fn send_auth(&self, request: ApiRequest) -> Result<ApiResponse> {
		let access =
			if request.endpoint.carries_bearer() { self.stored_access().await? } else { None };
		let response = self.execute(&request, access.as_ref()).await?;

		if response.is_unauthorized() {
			self.terminator
				.terminate(SignOutReason::AuthEndpointRejected { endpoint: request.endpoint })
				.await?;
		}

		response.error_for_status()
	}

	/// Authorizes `request` with `access` and performs one transport round trip.
	///
	/// Every status is returned as a response; only transport failures are errors.
	pub(crate) async fn execute(
		&self,
		request: &ApiRequest,
		access: Option<&TokenSecret>,
	) -> Result<ApiResponse> {
		let http_request = self.build_http_request(request::authorize(request, access))?;
		let response = self
			.http_client
			.execute(http_request)
			.await
			.map_err(|err| self.transport_mapper.map_transport_error(request.endpoint, err))?;
		let (parts, body) = response.into_parts();

		Ok(ApiResponse { status: parts.status, headers: parts.headers, body })
	}

	async fn retry(&self, request: &ApiRequest, fresh: &TokenSecret) -> Result<ApiResponse> {
		const KIND: OperationKind = OperationKind::Retry;

		let span = OperationSpan::new(KIND, "retry");

		obs::record_operation_outcome(KIND, OperationOutcome::Attempt);
		self.metrics().record_retry();

		let result = span
			.instrument(async move {
				let response = self.execute(request, Some(fresh)).await?;

				if response.is_unauthorized() {
					return Err(Error::CredentialRejected(response.api_error()));
				}

				response.error_for_status()
			})
			.await;

		obs::record_operation_outcome(KIND, OperationOutcome::of(&result));

		result
	}

	fn classify(&self, request: ApiRequest) -> ApiRequest {
		match self.descriptor.classify(&request.path) {
			Some(kind) if !request.endpoint.is_auth() => request.endpoint(kind),
			_ => request,
		}
	}

	fn build_http_request(&self, request: ApiRequest) -> Result<HttpRequest> {
		let mut url = self.descriptor.endpoint(&request.path)?;

		if !request.query.is_empty() {
			url.query_pairs_mut().extend_pairs(&request.query);
		}

		let mut headers = request.headers;

		request::default_headers(&mut headers);

		let mut http_request = ::http::Request::builder()
			.method(request.method)
			.uri(url.as_str())
			.body(request.body.unwrap_or_default())
			.map_err(crate::error::ConfigError::from)?;

		*http_request.headers_mut() = headers;

		Ok(http_request)
	}
}
