// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for request executions and refreshes.
#[derive(Debug, Default)]
pub struct RetryMetrics {
	executions: AtomicU64,
	unauthorized: AtomicU64,
	refreshes: AtomicU64,
	failures: AtomicU64,
}
impl RetryMetrics {
	/// Returns the number of times the executor was called.
	pub fn executions(&self) -> u64 {
		self.executions.load(Ordering::Relaxed)
	}

	/// Returns the number of 401 responses observed.
	pub fn unauthorized(&self) -> u64 {
		self.unauthorized.load(Ordering::Relaxed)
	}

	/// Returns the number of completed credential refreshes.
	pub fn refreshes(&self) -> u64 {
		self.refreshes.load(Ordering::Relaxed)
	}

	/// Returns the number of requests that ended in an error.
	pub fn failures(&self) -> u64 {
		self.failures.load(Ordering::Relaxed)
	}

	pub(crate) fn record_execution(&self) {
		self.executions.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_unauthorized(&self) {
		self.unauthorized.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh(&self) {
		self.refreshes.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_failure(&self) {
		self.failures.fetch_add(1, Ordering::Relaxed);
	}
}
