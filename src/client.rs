//! Session-aware client facade.
//!
//! [`SessionClient`] owns the transport, the token store, and the session machinery. Every
//! business call goes through [`SessionClient::send`], which attaches the stored access token,
//! funnels expired-credential responses into one shared refresh, and replays the request once.
//! Login, logout, and startup restoration live alongside so all store mutations share the same
//! write guard.

mod account;
mod dispatch;
mod login;
mod refresh;

// self
use crate::{
	_prelude::*,
	api::ApiDescriptor,
	auth::TokenSecret,
	http::{HttpTransport, TransportErrorMapper},
	session::{
		RefreshCoordinator, SessionMetrics, SessionState, SessionTerminator, SignOutReason,
	},
	store::TokenStore,
};
#[cfg(feature = "reqwest")]
use crate::http::{ReqwestHttpClient, ReqwestTransportErrorMapper};

/// Client specialized for the crate's default reqwest transport stack.
#[cfg(feature = "reqwest")]
pub type ReqwestSessionClient = SessionClient<ReqwestHttpClient, ReqwestTransportErrorMapper>;

/// Authenticated HTTP client sharing one token pair across every in-flight call.
///
/// Cloning is cheap and every clone shares the store, the refresh coordinator, and the write
/// guard, so concurrent callers on different clones still trigger at most one refresh.
pub struct SessionClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// HTTP transport used for every outbound request.
	pub http_client: Arc<C>,
	/// Mapper applied to transport-layer errors before surfacing them to callers.
	pub transport_mapper: Arc<M>,
	/// Token store holding the session.
	pub store: Arc<dyn TokenStore>,
	/// Backend descriptor.
	pub descriptor: ApiDescriptor,
	coordinator: Arc<RefreshCoordinator>,
	terminator: SessionTerminator,
	write_guard: Arc<AsyncMutex<()>>,
}
impl<C, M> SessionClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	/// Creates a client that reuses the caller-provided transport + mapper pair.
	///
	/// The published state starts as `Unauthenticated`; call [`SessionClient::restore`] to pick
	/// up a persisted session.
	pub fn with_http_client(
		store: Arc<dyn TokenStore>,
		descriptor: ApiDescriptor,
		http_client: impl Into<Arc<C>>,
		mapper: impl Into<Arc<M>>,
	) -> Self {
		let coordinator = Arc::new(RefreshCoordinator::default());
		let write_guard = Arc::new(AsyncMutex::new(()));
		let terminator =
			SessionTerminator::new(store.clone(), write_guard.clone(), coordinator.clone());

		Self {
			http_client: http_client.into(),
			transport_mapper: mapper.into(),
			store,
			descriptor,
			coordinator,
			terminator,
			write_guard,
		}
	}

	/// Current published session state.
	pub fn state(&self) -> SessionState {
		self.coordinator.state()
	}

	/// Subscribes to session state changes.
	pub fn subscribe(&self) -> tokio::sync::watch::Receiver<SessionState> {
		self.coordinator.subscribe()
	}

	/// Refresh coordinator shared by every clone of this client.
	pub fn coordinator(&self) -> &RefreshCoordinator {
		&self.coordinator
	}

	/// In-process session counters.
	pub fn metrics(&self) -> &SessionMetrics {
		self.coordinator.metrics()
	}

	/// Tears the session down with `reason`; returns whether this call emitted the sign-out.
	pub async fn terminate(&self, reason: SignOutReason) -> Result<bool> {
		self.terminator.terminate(reason).await
	}

	pub(crate) async fn stored_access(&self) -> Result<Option<TokenSecret>> {
		Ok(self
			.store
			.load()
			.await?
			.map(|session| session.tokens.access)
			.filter(|access| !access.is_blank()))
	}
}
#[cfg(feature = "reqwest")]
impl SessionClient<ReqwestHttpClient, ReqwestTransportErrorMapper> {
	/// Creates a client backed by a reqwest transport honoring the descriptor's timeout.
	pub fn new(store: Arc<dyn TokenStore>, descriptor: ApiDescriptor) -> Result<Self> {
		let http_client = ReqwestHttpClient::with_timeout(descriptor.timeout)?;

		Ok(Self::with_http_client(
			store,
			descriptor,
			http_client,
			Arc::new(ReqwestTransportErrorMapper),
		))
	}
}
impl<C, M> Clone for SessionClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn clone(&self) -> Self {
		Self {
			http_client: self.http_client.clone(),
			transport_mapper: self.transport_mapper.clone(),
			store: self.store.clone(),
			descriptor: self.descriptor.clone(),
			coordinator: self.coordinator.clone(),
			terminator: self.terminator.clone(),
			write_guard: self.write_guard.clone(),
		}
	}
}
impl<C, M> Debug for SessionClient<C, M>
where
	C: ?Sized + HttpTransport,
	M: ?Sized + TransportErrorMapper<C::TransportError>,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionClient")
			.field("descriptor", &self.descriptor)
			.field("coordinator", &self.coordinator)
			.finish()
	}
}
