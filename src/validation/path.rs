//! Key validation functions

use std::path::{Component, Path};

use super::ValidationError;

/// Check if a path is safe (no parent directory references)
///
/// Keys come from remote listings too, so a key like `a/../../etc/passwd`
/// must never be joined onto a local destination root.
pub fn is_path_safe(path: &Path) -> bool {
	!path.components().any(|c| matches!(c, Component::ParentDir))
}

/// Validate an entry key: relative and free of `..` segments
pub fn validate_key(key: &str) -> Result<(), ValidationError> {
	if key.is_empty() {
		return Err(ValidationError::PathError("Key must not be empty".to_string()));
	}
	if key.starts_with('/') || Path::new(key).is_absolute() {
		return Err(ValidationError::PathError(format!(
			"Key must be relative, got absolute path: {:?}",
			key
		)));
	}
	if key.split('/').any(|segment| segment == "..") || !is_path_safe(Path::new(key)) {
		return Err(ValidationError::PathError(format!(
			"Key {:?} contains parent directory reference (..)",
			key
		)));
	}
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_is_path_safe_normal() {
		assert!(is_path_safe(Path::new("file.txt")));
		assert!(is_path_safe(Path::new("dir/file.txt")));
		assert!(is_path_safe(Path::new("a/b/c/file.txt")));
	}

	#[test]
	fn test_is_path_safe_with_parent() {
		assert!(!is_path_safe(Path::new("../file.txt")));
		assert!(!is_path_safe(Path::new("dir/../file.txt")));
	}

	#[test]
	fn test_validate_key_ok() {
		assert!(validate_key("file.txt").is_ok());
		assert!(validate_key("dir/subdir/file.txt").is_ok());
	}

	#[test]
	fn test_validate_key_err() {
		assert!(validate_key("").is_err());
		assert!(validate_key("/etc/passwd").is_err());
		let result = validate_key("a/../../etc/passwd");
		assert!(result.is_err());
		assert!(result.unwrap_err().to_string().contains("parent directory"));
	}
}

// vim: ts=4
