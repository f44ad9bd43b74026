//! Optional observability helpers for client requests and credential refreshes.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit structured spans named `restforce_client.request` and
//!   `restforce_client.refresh`, plus events for unauthorized responses and exhausted budgets.
//! - Enable `metrics` to increment the `restforce_client_request_total` counter for every
//!   attempt/success/unauthorized/failure, labeled by `stage` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Client stages observed by spans and counters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Stage {
	/// One execution of the caller's request.
	Request,
	/// Credential refresh through the exchanger.
	Refresh,
}
impl Stage {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Stage::Request => "request",
			Stage::Refresh => "refresh",
		}
	}
}
impl Display for Stage {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each stage.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Outcome {
	/// Stage entered.
	Attempt,
	/// Stage completed and the caller gets a usable result.
	Success,
	/// Request came back with 401.
	Unauthorized,
	/// Error propagated back to the caller.
	Failure,
}
impl Outcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			Outcome::Attempt => "attempt",
			Outcome::Success => "success",
			Outcome::Unauthorized => "unauthorized",
			Outcome::Failure => "failure",
		}
	}
}
impl Display for Outcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
