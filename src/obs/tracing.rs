// self
use crate::{_prelude::*, obs::Stage};

/// Type alias that resolves to an instrumented future when tracing is enabled.
#[cfg(feature = "tracing")]
pub type Instrumented<F> = tracing::instrument::Instrumented<F>;
/// Passthrough future type when tracing is disabled.
#[cfg(not(feature = "tracing"))]
pub type Instrumented<F> = F;

/// Span wrapper used around requests and refreshes.
#[derive(Clone, Debug)]
pub struct OpSpan {
	#[cfg(feature = "tracing")]
	span: tracing::Span,
}
impl OpSpan {
	/// Creates a span for `stage`; `operation` names the call site (e.g., the HTTP method).
	pub fn new(stage: Stage, operation: &'static str) -> Self {
		#[cfg(feature = "tracing")]
		{
			let span = match stage {
				Stage::Request => tracing::info_span!(
					"restforce_client.request",
					stage = stage.as_str(),
					method = operation
				),
				Stage::Refresh => tracing::info_span!(
					"restforce_client.refresh",
					stage = stage.as_str(),
					operation
				),
			};

			Self { span }
		}
		#[cfg(not(feature = "tracing"))]
		{
			let _ = (stage, operation);

			Self {}
		}
	}

	/// Instruments an async block without holding a guard across `.await` points.
	pub fn instrument<Fut>(&self, fut: Fut) -> Instrumented<Fut>
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

/// Emits a debug event for a 401 response.
pub fn trace_unauthorized(attempt: u32, max_attempts: u32) {
	#[cfg(feature = "tracing")]
	tracing::debug!(attempt, max_attempts, "Request was rejected with 401.");
	#[cfg(not(feature = "tracing"))]
	let _ = (attempt, max_attempts);
}

/// Emits a warning once the attempt budget is spent.
pub fn trace_retry_exhausted(max_attempts: u32) {
	#[cfg(feature = "tracing")]
	tracing::warn!(max_attempts, "Retry budget exhausted while still unauthorized.");
	#[cfg(not(feature = "tracing"))]
	let _ = max_attempts;
}
