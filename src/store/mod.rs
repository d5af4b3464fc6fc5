//! Storage backend abstraction
//!
//! The mirror engine talks to object storage only through the `ObjectStore`
//! trait. Two implementations ship with the crate:
//!
//! - `FsObjectStore`: buckets are directories under a store root
//! - `MemoryStore`: in-process map, used as the fake backend in tests
//!
//! A cloud provider client plugs in by implementing the same trait.

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncWrite};

use crate::acl::Acl;
use crate::error::StoreError;

pub mod fs;
pub mod memory;

pub use self::fs::FsObjectStore;
pub use self::memory::MemoryStore;

/// Result type for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Content type used when detection fails
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// One object as reported by a listing or head call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectInfo {
	pub key: String,
	pub size: u64,
	/// Provider entity tag, possibly still quoted
	pub etag: String,
}

/// One page of a listing
#[derive(Debug, Clone, Default)]
pub struct ListPage {
	pub objects: Vec<ObjectInfo>,
	/// Token for the next page; None on the last page
	pub next_continuation: Option<String>,
}

/// Operations the mirror engine needs from an object store
#[async_trait]
pub trait ObjectStore: Send + Sync {
	/// Verify the store is reachable and credentials are accepted
	async fn check_connectivity(&self) -> StoreResult<()>;

	/// List one page of objects whose key starts with `prefix`
	async fn list_objects(
		&self,
		bucket: &str,
		prefix: &str,
		continuation: Option<&str>,
	) -> StoreResult<ListPage>;

	/// Stream an object into `writer`, returning the byte count
	async fn get_object(
		&self,
		bucket: &str,
		key: &str,
		writer: &mut (dyn AsyncWrite + Send + Unpin),
	) -> StoreResult<u64>;

	/// Store the bytes of `reader` as an object
	async fn put_object(
		&self,
		bucket: &str,
		key: &str,
		reader: &mut (dyn AsyncRead + Send + Unpin),
		content_type: &str,
		acl: Acl,
	) -> StoreResult<()>;

	/// Server-side copy
	async fn copy_object(
		&self,
		source_bucket: &str,
		source_key: &str,
		bucket: &str,
		key: &str,
		content_type: &str,
		acl: Acl,
	) -> StoreResult<()>;

	/// Remove an object; removing a missing object is not an error
	async fn delete_object(&self, bucket: &str, key: &str) -> StoreResult<()>;

	/// Size and entity tag of one object, None if it does not exist
	async fn head_object(&self, bucket: &str, key: &str) -> StoreResult<Option<ObjectInfo>>;
}

/// List every object under `prefix`, following continuation tokens until
/// the store reports the last page
pub async fn list_all(
	store: &dyn ObjectStore,
	bucket: &str,
	prefix: &str,
) -> StoreResult<Vec<ObjectInfo>> {
	let mut objects = Vec::new();
	let mut continuation: Option<String> = None;

	loop {
		let page = store.list_objects(bucket, prefix, continuation.as_deref()).await?;
		objects.extend(page.objects);

		match page.next_continuation {
			Some(next) => {
				if continuation.as_deref() == Some(next.as_str()) {
					return Err(StoreError::Other(format!(
						"Listing of {}/{} repeated continuation token {}",
						bucket, prefix, next
					)));
				}
				continuation = Some(next);
			}
			None => break,
		}
	}

	Ok(objects)
}

/// Best-effort MIME type for a key, falling back to a generic binary type
pub fn content_type_for(key: &str) -> String {
	mime_guess::from_path(key)
		.first_raw()
		.map(str::to_string)
		.unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string())
}


// vim: ts=4
