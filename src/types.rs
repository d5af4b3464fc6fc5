use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::path;

/// One synchronizable file
///
/// `key` is relative to the endpoint root, `/`-separated, with no leading
/// separator. It is the join key between the two sides.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct Entry {
	pub key: String,
	pub size: u64,
	pub content_digest: String,
	pub is_directory: bool,
}

impl Entry {
	pub fn file(key: &str, size: u64, content_digest: &str) -> Self {
		Entry {
			key: key.to_string(),
			size,
			content_digest: content_digest.to_string(),
			is_directory: false,
		}
	}
}

/// All entries of one endpoint side, by key
pub type EntrySet = HashMap<String, Entry>;

#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum ActionKind {
	Copy,
	Upload,
	Download,
	Delete,
}

impl fmt::Display for ActionKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			ActionKind::Copy => write!(f, "copy"),
			ActionKind::Upload => write!(f, "upload"),
			ActionKind::Download => write!(f, "download"),
			ActionKind::Delete => write!(f, "delete"),
		}
	}
}

/// Where one side of an action lives
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum Locator {
	Local(path::PathBuf),
	Remote { bucket: String, key: String },
}

impl fmt::Display for Locator {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Locator::Local(path) => write!(f, "{}", path.display()),
			Locator::Remote { bucket, key } => write!(f, "remote://{}/{}", bucket, key),
		}
	}
}

/// A single planned operation, consumed once by the executor
#[derive(Clone, PartialEq, Debug)]
pub struct ActionItem {
	pub kind: ActionKind,
	/// None for deletions
	pub source: Option<Locator>,
	pub destination: Locator,
	pub content_digest: String,
	pub size: u64,
	pub message: String,
}

impl ActionItem {
	pub fn transfer(kind: ActionKind, source: Locator, destination: Locator, entry: &Entry) -> Self {
		let message = format!("{}: {} to {}", kind, source, destination);
		ActionItem {
			kind,
			source: Some(source),
			destination,
			content_digest: entry.content_digest.clone(),
			size: entry.size,
			message,
		}
	}

	pub fn delete(destination: Locator, entry: &Entry) -> Self {
		let message = format!("delete: {}", destination);
		ActionItem {
			kind: ActionKind::Delete,
			source: None,
			destination,
			content_digest: entry.content_digest.clone(),
			size: entry.size,
			message,
		}
	}
}

/// Planned actions by key; ordered so reporting is deterministic
pub type ActionPlan = BTreeMap<String, ActionItem>;

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_transfer_message_format() {
		let entry = Entry::file("b", 20, "Y");
		let item = ActionItem::transfer(
			ActionKind::Upload,
			Locator::Local(path::PathBuf::from("/src/data/b")),
			Locator::Remote { bucket: "bkt".into(), key: "data/b".into() },
			&entry,
		);
		assert_eq!(item.message, "upload: /src/data/b to remote://bkt/data/b");
		assert_eq!(item.size, 20);
		assert_eq!(item.content_digest, "Y");
	}

	#[test]
	fn test_delete_message_format() {
		let entry = Entry::file("c", 5, "Z");
		let item = ActionItem::delete(Locator::Remote { bucket: "bkt".into(), key: "data/c".into() }, &entry);
		assert_eq!(item.message, "delete: remote://bkt/data/c");
		assert!(item.source.is_none());
	}
}

// vim: ts=4
