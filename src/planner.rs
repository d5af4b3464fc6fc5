//! Translation of a diff into an action plan

use tracing::debug;

use crate::diff::DiffResult;
use crate::endpoint::{Endpoint, EndpointKind};
use crate::error::SyncError;
use crate::types::{ActionItem, ActionKind, ActionPlan};

/// Transfer kind for a (source, destination) endpoint pair
pub fn transfer_kind(source: EndpointKind, destination: EndpointKind) -> Result<ActionKind, SyncError> {
	match (source, destination) {
		(EndpointKind::Remote, EndpointKind::Remote) => Ok(ActionKind::Copy),
		(EndpointKind::Remote, EndpointKind::Local) => Ok(ActionKind::Download),
		(EndpointKind::Local, EndpointKind::Remote) => Ok(ActionKind::Upload),
		(EndpointKind::Local, EndpointKind::Local) => Err(SyncError::UnsupportedEndpointPair {
			source: source.to_string(),
			destination: destination.to_string(),
		}),
	}
}

/// Build the action plan for a diff
///
/// Source-only and mismatched keys become transfers carrying the source
/// entry's digest and size. With `delete_enabled`, destination-only keys
/// become deletions; no other key is ever deleted. Common keys produce
/// nothing.
pub fn plan(
	diff: &DiffResult,
	source: &Endpoint,
	destination: &Endpoint,
	delete_enabled: bool,
) -> Result<ActionPlan, SyncError> {
	let kind = transfer_kind(source.kind(), destination.kind())?;
	let mut actions = ActionPlan::new();

	for (key, entry) in diff.needs_sync() {
		let item = ActionItem::transfer(kind, source.locate(key), destination.locate(key), entry);
		debug!("planned {}", item.message);
		actions.insert(key.clone(), item);
	}

	if delete_enabled {
		for (key, entry) in &diff.destination_only {
			let item = ActionItem::delete(destination.locate(key), entry);
			debug!("planned {}", item.message);
			actions.insert(key.clone(), item);
		}
	}

	Ok(actions)
}

/// Count planned items per kind: (copy, download, upload, delete)
pub fn count_by_kind(actions: &ActionPlan) -> (usize, usize, usize, usize) {
	actions.values().fold((0, 0, 0, 0), |(c, d, u, x), item| match item.kind {
		ActionKind::Copy => (c + 1, d, u, x),
		ActionKind::Download => (c, d + 1, u, x),
		ActionKind::Upload => (c, d, u + 1, x),
		ActionKind::Delete => (c, d, u, x + 1),
	})
}


// vim: ts=4
