//! In-memory object store
//!
//! Keeps every object in a map and records the content type and ACL each
//! write was made with. Individual keys can be marked as failing, and the
//! whole store can be taken offline, to exercise error paths.

use async_trait::async_trait;
use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::{Mutex, MutexGuard};
use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use super::{ListPage, ObjectInfo, ObjectStore, StoreResult};
use crate::acl::Acl;
use crate::error::StoreError;
use crate::util;

/// An object held by `MemoryStore`
#[derive(Debug, Clone, PartialEq)]
pub struct StoredObject {
	pub data: Vec<u8>,
	pub content_type: String,
	pub acl: Acl,
	pub etag: String,
}

#[derive(Default)]
struct Inner {
	buckets: BTreeSet<String>,
	objects: BTreeMap<(String, String), StoredObject>,
	failing: HashSet<String>,
	stalling: HashSet<String>,
	offline: bool,
	calls: usize,
}

/// Object store kept entirely in process memory
pub struct MemoryStore {
	inner: Mutex<Inner>,
	page_size: usize,
}

impl MemoryStore {
	pub fn new() -> Self {
		MemoryStore { inner: Mutex::new(Inner::default()), page_size: 1000 }
	}

	/// Limit listing pages to `page_size` objects
	pub fn with_page_size(mut self, page_size: usize) -> Self {
		self.page_size = page_size.max(1);
		self
	}

	fn lock(&self) -> MutexGuard<'_, Inner> {
		self.inner.lock().unwrap_or_else(|e| e.into_inner())
	}

	pub fn create_bucket(&self, bucket: &str) {
		self.lock().buckets.insert(bucket.to_string());
	}

	/// Insert an object directly, creating the bucket if needed
	pub fn insert(&self, bucket: &str, key: &str, data: &[u8]) {
		let mut inner = self.lock();
		inner.buckets.insert(bucket.to_string());
		inner.objects.insert(
			(bucket.to_string(), key.to_string()),
			StoredObject {
				data: data.to_vec(),
				content_type: super::DEFAULT_CONTENT_TYPE.to_string(),
				acl: Acl::Private,
				etag: format!("\"{}\"", util::hash(data)),
			},
		);
	}

	/// Override the entity tag of an existing object
	pub fn set_etag(&self, bucket: &str, key: &str, etag: &str) {
		if let Some(object) = self.lock().objects.get_mut(&(bucket.to_string(), key.to_string())) {
			object.etag = etag.to_string();
		}
	}

	pub fn object(&self, bucket: &str, key: &str) -> Option<StoredObject> {
		self.lock().objects.get(&(bucket.to_string(), key.to_string())).cloned()
	}

	/// All keys in a bucket, sorted
	pub fn keys(&self, bucket: &str) -> Vec<String> {
		self.lock()
			.objects
			.keys()
			.filter(|(b, _)| b == bucket)
			.map(|(_, k)| k.clone())
			.collect()
	}

	/// Make every operation touching `key` fail
	pub fn fail_key(&self, key: &str) {
		self.lock().failing.insert(key.to_string());
	}

	/// Make `get_object` on `key` deliver its data and then never finish
	pub fn stall_key(&self, key: &str) {
		self.lock().stalling.insert(key.to_string());
	}

	/// Make every operation fail, including the connectivity check
	pub fn set_offline(&self, offline: bool) {
		self.lock().offline = offline;
	}

	/// Number of store calls made so far
	pub fn call_count(&self) -> usize {
		self.lock().calls
	}

	fn begin(&self, bucket: &str, keys: &[&str]) -> StoreResult<MutexGuard<'_, Inner>> {
		let mut inner = self.lock();
		inner.calls += 1;
		if inner.offline {
			return Err(StoreError::Other("store is offline".to_string()));
		}
		if !inner.buckets.contains(bucket) {
			return Err(StoreError::NoSuchBucket { bucket: bucket.to_string() });
		}
		if let Some(key) = keys.iter().find(|k| inner.failing.contains(**k)) {
			return Err(StoreError::Other(format!("injected failure for {}", key)));
		}
		Ok(inner)
	}
}

impl Default for MemoryStore {
	fn default() -> Self {
		Self::new()
	}
}

#[async_trait]
impl ObjectStore for MemoryStore {
	async fn check_connectivity(&self) -> StoreResult<()> {
		if self.lock().offline {
			return Err(StoreError::Other("store is offline".to_string()));
		}
		Ok(())
	}

	async fn list_objects(
		&self,
		bucket: &str,
		prefix: &str,
		continuation: Option<&str>,
	) -> StoreResult<ListPage> {
		let inner = self.begin(bucket, &[])?;
		let mut matching = inner
			.objects
			.iter()
			.filter(|((b, k), _)| b == bucket && k.starts_with(prefix))
			.filter(|((_, k), _)| continuation.map_or(true, |after| k.as_str() > after));

		let mut page = ListPage::default();
		for ((_, key), object) in matching.by_ref().take(self.page_size) {
			page.objects.push(ObjectInfo {
				key: key.clone(),
				size: object.data.len() as u64,
				etag: object.etag.clone(),
			});
		}
		if matching.next().is_some() {
			page.next_continuation = page.objects.last().map(|o| o.key.clone());
		}
		Ok(page)
	}

	async fn get_object(
		&self,
		bucket: &str,
		key: &str,
		writer: &mut (dyn AsyncWrite + Send + Unpin),
	) -> StoreResult<u64> {
		let (data, stall) = {
			let inner = self.begin(bucket, &[key])?;
			match inner.objects.get(&(bucket.to_string(), key.to_string())) {
				Some(object) => (object.data.clone(), inner.stalling.contains(key)),
				None => {
					return Err(StoreError::NoSuchKey {
						bucket: bucket.to_string(),
						key: key.to_string(),
					})
				}
			}
		};
		writer.write_all(&data).await?;
		writer.flush().await?;
		if stall {
			std::future::pending::<()>().await;
		}
		Ok(data.len() as u64)
	}

	async fn put_object(
		&self,
		bucket: &str,
		key: &str,
		reader: &mut (dyn AsyncRead + Send + Unpin),
		content_type: &str,
		acl: Acl,
	) -> StoreResult<()> {
		let mut data = Vec::new();
		reader.read_to_end(&mut data).await?;

		let mut inner = self.begin(bucket, &[key])?;
		let etag = format!("\"{}\"", util::hash(&data));
		inner.objects.insert(
			(bucket.to_string(), key.to_string()),
			StoredObject { data, content_type: content_type.to_string(), acl, etag },
		);
		Ok(())
	}

	async fn copy_object(
		&self,
		source_bucket: &str,
		source_key: &str,
		bucket: &str,
		key: &str,
		content_type: &str,
		acl: Acl,
	) -> StoreResult<()> {
		let mut inner = self.begin(bucket, &[source_key, key])?;
		let source = match inner.objects.get(&(source_bucket.to_string(), source_key.to_string())) {
			Some(object) => object.clone(),
			None => {
				return Err(StoreError::NoSuchKey {
					bucket: source_bucket.to_string(),
					key: source_key.to_string(),
				})
			}
		};
		inner.objects.insert(
			(bucket.to_string(), key.to_string()),
			StoredObject { content_type: content_type.to_string(), acl, ..source },
		);
		Ok(())
	}

	async fn delete_object(&self, bucket: &str, key: &str) -> StoreResult<()> {
		let mut inner = self.begin(bucket, &[key])?;
		inner.objects.remove(&(bucket.to_string(), key.to_string()));
		Ok(())
	}

	async fn head_object(&self, bucket: &str, key: &str) -> StoreResult<Option<ObjectInfo>> {
		let inner = self.begin(bucket, &[key])?;
		Ok(inner.objects.get(&(bucket.to_string(), key.to_string())).map(|object| ObjectInfo {
			key: key.to_string(),
			size: object.data.len() as u64,
			etag: object.etag.clone(),
		}))
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[tokio::test]
	async fn test_put_get_roundtrip_records_metadata() {
		let store = MemoryStore::new();
		store.create_bucket("b");

		let mut reader: &[u8] = b"payload";
		store.put_object("b", "k.txt", &mut reader, "text/plain", Acl::PublicRead).await.unwrap();

		let object = store.object("b", "k.txt").unwrap();
		assert_eq!(object.content_type, "text/plain");
		assert_eq!(object.acl, Acl::PublicRead);
		assert_eq!(object.etag, format!("\"{}\"", util::hash(b"payload")));

		let mut out = Vec::new();
		let n = store.get_object("b", "k.txt", &mut out).await.unwrap();
		assert_eq!(n, 7);
		assert_eq!(out, b"payload");
	}

	#[tokio::test]
	async fn test_missing_bucket_and_key() {
		let store = MemoryStore::new();
		let err = store.head_object("nope", "k").await.unwrap_err();
		assert!(matches!(err, StoreError::NoSuchBucket { .. }));

		store.create_bucket("b");
		let mut out = Vec::new();
		let err = store.get_object("b", "missing", &mut out).await.unwrap_err();
		assert!(matches!(err, StoreError::NoSuchKey { .. }));
	}

	#[tokio::test]
	async fn test_failing_key_and_offline() {
		let store = MemoryStore::new();
		store.insert("b", "bad", b"x");
		store.fail_key("bad");
		assert!(store.delete_object("b", "bad").await.is_err());
		assert!(store.delete_object("b", "good").await.is_ok());

		store.set_offline(true);
		assert!(store.check_connectivity().await.is_err());
	}

	#[tokio::test]
	async fn test_pagination_tokens() {
		let store = MemoryStore::new().with_page_size(2);
		for key in ["a", "b", "c"].iter() {
			store.insert("b", key, b"x");
		}
		let first = store.list_objects("b", "", None).await.unwrap();
		assert_eq!(first.objects.len(), 2);
		assert_eq!(first.next_continuation.as_deref(), Some("b"));

		let second = store.list_objects("b", "", Some("b")).await.unwrap();
		assert_eq!(second.objects.len(), 1);
		assert!(second.next_continuation.is_none());
	}
}

// vim: ts=4
