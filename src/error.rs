//! Error types for bucketsync operations

use std::error::Error;
use std::fmt;
use std::io;

use crate::validation::ValidationError;

/// Main error type for a mirror run
///
/// Everything except `ExecutionFailed` is fatal: the run stops before (or
/// instead of) touching the destination.
#[derive(Debug)]
pub enum SyncError {
	/// Missing or invalid configuration
	InvalidConfig { message: String },

	/// Source or destination string could not be parsed
	InvalidLocation { location: String, message: String },

	/// Traversal or provider listing failure
	Listing { location: String, source: Box<dyn Error + Send + Sync> },

	/// Symbolic link whose target does not exist
	BrokenLink { path: String, target: String },

	/// Endpoint kinds that cannot be mirrored into each other
	UnsupportedEndpointPair { source: String, destination: String },

	/// Storage backend unreachable or credentials rejected
	Connectivity { message: String },

	/// One or more plan items failed; siblings still ran
	ExecutionFailed { failed: usize, summary: String },

	/// Operation aborted by user
	Aborted,
}

impl fmt::Display for SyncError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			SyncError::InvalidConfig { message } => {
				write!(f, "Invalid configuration: {}", message)
			}
			SyncError::InvalidLocation { location, message } => {
				write!(f, "Invalid location '{}': {}", location, message)
			}
			SyncError::Listing { location, source } => {
				write!(f, "Failed to list {}: {}", location, source)
			}
			SyncError::BrokenLink { path, target } => {
				write!(
					f,
					"The symlink {} has a target {} but the target does not exist",
					path, target
				)
			}
			SyncError::UnsupportedEndpointPair { source, destination } => {
				write!(f, "Cannot mirror {} endpoint to {} endpoint", source, destination)
			}
			SyncError::Connectivity { message } => {
				write!(f, "Connectivity check failed: {}", message)
			}
			SyncError::ExecutionFailed { failed, summary } => {
				write!(f, "{} action(s) failed ({})", failed, summary)
			}
			SyncError::Aborted => write!(f, "Operation aborted by user"),
		}
	}
}

impl Error for SyncError {}

impl From<ValidationError> for SyncError {
	fn from(e: ValidationError) -> Self {
		SyncError::InvalidConfig { message: e.to_string() }
	}
}

/// Storage backend errors
///
/// Returned by every `ObjectStore` call. Inside the executor these are
/// per-item failures and never abort sibling work.
#[derive(Debug)]
pub enum StoreError {
	/// Bucket does not exist
	NoSuchBucket { bucket: String },

	/// Object does not exist
	NoSuchKey { bucket: String, key: String },

	/// Underlying I/O failure
	Io(io::Error),

	/// Content read back does not match the expected digest
	DigestMismatch { location: String, expected: String, actual: String },

	/// Operation interrupted by cancellation
	Cancelled,

	/// Generic error message
	Other(String),
}

impl fmt::Display for StoreError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			StoreError::NoSuchBucket { bucket } => write!(f, "No such bucket: {}", bucket),
			StoreError::NoSuchKey { bucket, key } => {
				write!(f, "No such key: {}/{}", bucket, key)
			}
			StoreError::Io(e) => write!(f, "I/O error: {}", e),
			StoreError::DigestMismatch { location, expected, actual } => {
				write!(f, "Digest mismatch on {}: expected {}, got {}", location, expected, actual)
			}
			StoreError::Cancelled => write!(f, "Cancelled"),
			StoreError::Other(msg) => write!(f, "{}", msg),
		}
	}
}

impl Error for StoreError {}

impl From<io::Error> for StoreError {
	fn from(e: io::Error) -> Self {
		StoreError::Io(e)
	}
}


// vim: ts=4
