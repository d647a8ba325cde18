// self
use crate::{_prelude::*, obs::OperationKind, session::SignOutReason};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedOperation<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedOperation<F> = F;

/// A span builder used by session operations.
#[derive(Clone, Debug)]
pub struct OperationSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OperationSpan {
	/// Creates a new span tagged with the provided operation kind + stage.
	pub fn new(kind: OperationKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span =
				tracing::info_span!("session_broker.operation", operation = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedOperation<Fut>
	where
		Fut: Future,
	{
		#[cfg(feature = "tracing")]
		{
			use tracing::Instrument;

			fut.instrument(self.span.clone())
		}
		#[cfg(not(feature = "tracing"))]
		{
			fut
		}
	}
}

/// Emits the single teardown event for a session.
pub fn trace_sign_out(reason: &SignOutReason) {
	#[cfg(feature = "tracing")]
	{
		tracing::info!(reason = reason.label(), detail = %reason, "Session terminated.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = reason;
	}
}

/// Reports a failed server-side logout; local teardown proceeds regardless.
pub fn trace_logout_failure(error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(error = %error, "Server-side logout failed; clearing the local session anyway.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = error;
	}
}

/// Reports a teardown whose store clear failed; the session may still be persisted.
pub fn trace_teardown_failure(reason: &SignOutReason, error: &Error) {
	#[cfg(feature = "tracing")]
	{
		tracing::error!(reason = reason.label(), error = %error, "Failed to clear the session store.");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (reason, error);
	}
}
