//! Per-item outcomes and the run summary built from them

use std::collections::HashMap;

use crate::error::{StoreError, SyncError};
use crate::types::{ActionItem, ActionKind};

/// Result of carrying out one plan item
#[derive(Debug)]
pub struct ItemOutcome {
	pub key: String,
	pub kind: ActionKind,
	pub message: String,
	pub result: Result<(), StoreError>,
}

impl ItemOutcome {
	pub fn failed(key: String, item: &ActionItem, error: StoreError) -> Self {
		ItemOutcome { key, kind: item.kind, message: item.message.clone(), result: Err(error) }
	}
}

/// Succeeded and failed counts for one action kind
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KindSummary {
	pub succeeded: usize,
	pub failed: usize,
}

/// A failed plan item
#[derive(Debug, Clone, PartialEq)]
pub struct Failure {
	pub key: String,
	pub kind: ActionKind,
	pub message: String,
	pub error: String,
}

/// Everything the executor did, in reporting order
#[derive(Debug, Default)]
pub struct ExecutionReport {
	/// Item messages in dispatch order; identical for dry and live runs
	pub messages: Vec<String>,
	pub failures: Vec<Failure>,
	pub dry_run: bool,
	pub cancelled: bool,
	counts: HashMap<ActionKind, KindSummary>,
}

const REPORT_ORDER: [ActionKind; 4] =
	[ActionKind::Copy, ActionKind::Download, ActionKind::Upload, ActionKind::Delete];

impl ExecutionReport {
	pub fn new(dry_run: bool) -> Self {
		ExecutionReport { dry_run, ..Default::default() }
	}

	pub fn record(&mut self, outcome: ItemOutcome) {
		let counts = self.counts.entry(outcome.kind).or_default();
		match outcome.result {
			Ok(()) => counts.succeeded += 1,
			Err(e) => {
				counts.failed += 1;
				if let StoreError::Cancelled = e {
					self.cancelled = true;
				}
				self.failures.push(Failure {
					key: outcome.key,
					kind: outcome.kind,
					message: outcome.message,
					error: e.to_string(),
				});
			}
		}
	}

	/// Items whose outcome never arrived (worker task died)
	pub fn record_lost(&mut self, kind: ActionKind, count: usize) {
		for _ in 0..count {
			self.record(ItemOutcome {
				key: String::new(),
				kind,
				message: format!("{}: outcome lost", kind),
				result: Err(StoreError::Other("worker terminated before reporting".to_string())),
			});
		}
	}

	pub fn summary(&self, kind: ActionKind) -> KindSummary {
		self.counts.get(&kind).copied().unwrap_or_default()
	}

	pub fn succeeded(&self) -> usize {
		self.counts.values().map(|c| c.succeeded).sum()
	}

	pub fn failed(&self) -> usize {
		self.counts.values().map(|c| c.failed).sum()
	}

	/// One line per-kind summary, e.g. `upload: 3 ok, 1 failed; delete: 2 ok, 0 failed`
	pub fn summary_line(&self) -> String {
		let parts: Vec<String> = REPORT_ORDER
			.iter()
			.filter_map(|kind| {
				self.counts
					.get(kind)
					.map(|c| format!("{}: {} ok, {} failed", kind, c.succeeded, c.failed))
			})
			.collect();
		if parts.is_empty() {
			"nothing to do".to_string()
		} else {
			parts.join("; ")
		}
	}

	/// Ok when every item succeeded
	pub fn into_result(self) -> Result<ExecutionReport, SyncError> {
		if self.cancelled {
			return Err(SyncError::Aborted);
		}
		if !self.failures.is_empty() {
			return Err(SyncError::ExecutionFailed {
				failed: self.failures.len(),
				summary: self.summary_line(),
			});
		}
		Ok(self)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn outcome(kind: ActionKind, ok: bool) -> ItemOutcome {
		ItemOutcome {
			key: "k".into(),
			kind,
			message: format!("{}: k", kind),
			result: if ok { Ok(()) } else { Err(StoreError::Other("boom".into())) },
		}
	}

	#[test]
	fn test_counts_and_summary_line() {
		let mut report = ExecutionReport::new(false);
		report.record(outcome(ActionKind::Upload, true));
		report.record(outcome(ActionKind::Upload, false));
		report.record(outcome(ActionKind::Delete, true));

		assert_eq!(report.summary(ActionKind::Upload), KindSummary { succeeded: 1, failed: 1 });
		assert_eq!(report.summary(ActionKind::Copy), KindSummary::default());
		assert_eq!(report.succeeded(), 2);
		assert_eq!(report.failed(), 1);
		assert_eq!(report.summary_line(), "upload: 1 ok, 1 failed; delete: 1 ok, 0 failed");
		assert_eq!(report.failures[0].error, "boom");
	}

	#[test]
	fn test_into_result() {
		assert!(ExecutionReport::new(true).into_result().is_ok());

		let mut report = ExecutionReport::new(false);
		report.record(outcome(ActionKind::Copy, false));
		assert!(matches!(report.into_result(), Err(SyncError::ExecutionFailed { failed: 1, .. })));

		let mut report = ExecutionReport::new(false);
		report.record(ItemOutcome {
			key: "k".into(),
			kind: ActionKind::Copy,
			message: "copy: k".into(),
			result: Err(StoreError::Cancelled),
		});
		assert!(matches!(report.into_result(), Err(SyncError::Aborted)));
	}

	#[test]
	fn test_empty_summary() {
		assert_eq!(ExecutionReport::new(false).summary_line(), "nothing to do");
	}
}

// vim: ts=4
