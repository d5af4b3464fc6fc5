//! Configuration validation functions

use super::ValidationError;

/// Validate the worker pool width
///
/// # Arguments
/// * `max_threads` - Maximum number of concurrent transfers (must be at least 1)
pub fn validate_max_threads(max_threads: usize) -> Result<(), ValidationError> {
	if max_threads < 1 {
		return Err(ValidationError::ConfigError(
			"max threads cannot be less than 1".to_string(),
		));
	}
	Ok(())
}

/// Validate the listing page size
pub fn validate_page_size(page_size: usize) -> Result<(), ValidationError> {
	if page_size == 0 {
		return Err(ValidationError::ConfigError("Page size must be greater than 0".to_string()));
	}
	Ok(())
}

/// Validate that a required option was given
///
/// # Arguments
/// * `name` - Option name used in the error message
/// * `value` - Option value; blank counts as missing
pub fn validate_required(name: &str, value: &str) -> Result<(), ValidationError> {
	if value.trim().is_empty() {
		return Err(ValidationError::ConfigError(format!("the {} option is required", name)));
	}
	Ok(())
}


// vim: ts=4
