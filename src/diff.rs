//! Three-way comparison of two entry sets
//!
//! Every key of the source set lands in exactly one of `common`,
//! `source_only` or `source_mismatch`; every key of the destination set in
//! exactly one of `common`, `destination_only` or `destination_mismatch`.
//! The two mismatch maps always hold the same keys.

use std::collections::HashMap;

use crate::types::{Entry, EntrySet};

/// Classification of the union of source and destination keys
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiffResult {
	/// Same key, same digest
	pub common: HashMap<String, Entry>,
	pub source_only: HashMap<String, Entry>,
	pub destination_only: HashMap<String, Entry>,
	/// Same key, different digest; source-side entry
	pub source_mismatch: HashMap<String, Entry>,
	/// Same key, different digest; destination-side entry
	pub destination_mismatch: HashMap<String, Entry>,
}

impl DiffResult {
	/// Entries that have to be transferred: source-only plus mismatched
	pub fn needs_sync(&self) -> impl Iterator<Item = (&String, &Entry)> {
		self.source_only.iter().chain(self.source_mismatch.iter())
	}

	/// True when the destination already matches the source
	pub fn is_in_sync(&self) -> bool {
		self.source_only.is_empty() && self.source_mismatch.is_empty()
	}
}

/// Compare two entry sets by key and content digest
pub fn diff(source: &EntrySet, destination: &EntrySet) -> DiffResult {
	let mut result = DiffResult::default();

	for (key, entry) in source {
		match destination.get(key) {
			Some(other) if other.content_digest == entry.content_digest => {
				result.common.insert(key.clone(), entry.clone());
			}
			Some(_) => {
				result.source_mismatch.insert(key.clone(), entry.clone());
			}
			None => {
				result.source_only.insert(key.clone(), entry.clone());
			}
		}
	}

	for (key, entry) in destination {
		match source.get(key) {
			Some(other) if other.content_digest == entry.content_digest => {
				// Already recorded from the source pass
				result.common.entry(key.clone()).or_insert_with(|| entry.clone());
			}
			Some(_) => {
				result.destination_mismatch.insert(key.clone(), entry.clone());
			}
			None => {
				result.destination_only.insert(key.clone(), entry.clone());
			}
		}
	}

	result
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::collections::HashSet;

	fn set(entries: &[(&str, u64, &str)]) -> EntrySet {
		entries.iter().map(|(k, size, digest)| (k.to_string(), Entry::file(k, *size, digest))).collect()
	}

	fn keys(map: &HashMap<String, Entry>) -> HashSet<String> {
		map.keys().cloned().collect()
	}

	fn key_set(names: &[&str]) -> HashSet<String> {
		names.iter().map(|s| s.to_string()).collect()
	}

	#[test]
	fn test_example_scenario() {
		let source = set(&[("a", 10, "X"), ("b", 20, "Y")]);
		let destination = set(&[("a", 10, "X"), ("c", 5, "Z")]);
		let result = diff(&source, &destination);

		assert_eq!(keys(&result.common), key_set(&["a"]));
		assert_eq!(keys(&result.source_only), key_set(&["b"]));
		assert_eq!(keys(&result.destination_only), key_set(&["c"]));
		assert!(result.source_mismatch.is_empty());
		assert!(result.destination_mismatch.is_empty());
	}

	#[test]
	fn test_mismatch_keeps_both_views() {
		let source = set(&[("a", 10, "X")]);
		let destination = set(&[("a", 12, "W")]);
		let result = diff(&source, &destination);

		assert!(result.common.is_empty());
		assert_eq!(result.source_mismatch["a"].content_digest, "X");
		assert_eq!(result.destination_mismatch["a"].content_digest, "W");
		assert!(!result.is_in_sync());
	}

	#[test]
	fn test_self_diff_is_all_common() {
		let source = set(&[("a", 1, "1"), ("b/c", 2, "2"), ("d", 3, "3")]);
		let result = diff(&source, &source);

		assert_eq!(keys(&result.common), keys(&source));
		assert!(result.source_only.is_empty());
		assert!(result.destination_only.is_empty());
		assert!(result.source_mismatch.is_empty());
		assert!(result.destination_mismatch.is_empty());
		assert!(result.is_in_sync());
	}

	#[test]
	fn test_partition_and_symmetry() {
		let source = set(&[("a", 1, "1"), ("b", 2, "2"), ("c", 3, "3"), ("e", 5, "5")]);
		let destination = set(&[("a", 1, "1"), ("b", 2, "x"), ("d", 4, "4"), ("e", 5, "y")]);
		let result = diff(&source, &destination);

		let mut source_side = keys(&result.common);
		for k in keys(&result.source_only).into_iter().chain(keys(&result.source_mismatch)) {
			assert!(source_side.insert(k), "key classified twice on the source side");
		}
		assert_eq!(source_side, keys(&source));

		let mut destination_side = keys(&result.common);
		for k in keys(&result.destination_only).into_iter().chain(keys(&result.destination_mismatch)) {
			assert!(destination_side.insert(k), "key classified twice on the destination side");
		}
		assert_eq!(destination_side, keys(&destination));

		assert_eq!(keys(&result.source_mismatch), keys(&result.destination_mismatch));
		assert_eq!(keys(&result.source_mismatch), key_set(&["b", "e"]));
	}

	#[test]
	fn test_empty_sides() {
		let source = set(&[("a", 1, "1")]);
		let result = diff(&source, &EntrySet::new());
		assert_eq!(keys(&result.source_only), key_set(&["a"]));

		let result = diff(&EntrySet::new(), &source);
		assert_eq!(keys(&result.destination_only), key_set(&["a"]));
		assert!(result.is_in_sync());
	}
}

// vim: ts=4
