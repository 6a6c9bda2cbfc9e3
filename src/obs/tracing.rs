// self
use crate::{_prelude::*, obs::CallKind};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type InstrumentedCall<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type InstrumentedCall<F> = F;

/// A span builder used by client calls.
#[derive(Clone, Debug)]
pub struct CallSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl CallSpan {
	/// Creates a new span tagged with the provided call kind + stage.
	pub fn new(kind: CallKind, stage: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = tracing::info_span!("compass_client.call", call = kind.as_str(), stage);

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (kind, stage);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> InstrumentedCall<Fut>
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

/// Emits a debug event when a request is re-sent with a renewed credential.
pub fn trace_retry(method: &str, path: &str) {
	#[cfg(feature = "tracing")]
	{
		tracing::debug!(method, path, "retrying request with renewed access token");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (method, path);
	}
}

/// Emits a warning event when a refresh failure ends the session.
pub fn trace_session_invalidated(login_route: &str, reason: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::warn!(login_route, %reason, "refresh failed; credentials purged");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = (login_route, reason);
	}
}

/// Emits an error event when purging credentials after a failed refresh did not complete.
pub fn trace_purge_failed(reason: &dyn Display) {
	#[cfg(feature = "tracing")]
	{
		tracing::error!(%reason, "failed to purge credentials after refresh failure");
	}
	#[cfg(not(feature = "tracing"))]
	{
		let _ = reason;
	}
}
