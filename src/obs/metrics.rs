// self
use crate::{
	obs::{OperationKind, OperationOutcome},
	session::SignOutReason,
};

/// Records an operation outcome via the global metrics recorder (when enabled).
pub fn record_operation_outcome(kind: OperationKind, outcome: OperationOutcome) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!(
			"session_broker_operation_total",
			"operation" => kind.as_str(),
			"outcome" => outcome.as_str()
		)
		.increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = (kind, outcome);
	}
}

/// Counts a session teardown, labeled by its reason.
pub fn record_sign_out(reason: &SignOutReason) {
	#[cfg(feature = "metrics")]
	{
		metrics::counter!("session_broker_sign_out_total", "reason" => reason.label()).increment(1);
	}

	#[cfg(not(feature = "metrics"))]
	{
		let _ = reason;
	}
}
