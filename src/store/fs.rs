//! Directory-backed object store
//!
//! Layout: `<root>/<bucket>/<key>`. Each bucket is a directory directly
//! under the store root and each object is a regular file. Entity tags are
//! the quoted MD5 of the file content. Writes go to a temporary sibling and
//! are renamed into place, so a reader never sees a half-written object.
//!
//! Content types and ACLs are accepted but not persisted.

use async_trait::async_trait;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs as afs;
use tokio::io::{AsyncRead, AsyncWrite, AsyncWriteExt};
use tracing::debug;

use super::{ListPage, ObjectInfo, ObjectStore, StoreResult};
use crate::acl::Acl;
use crate::endpoint;
use crate::error::StoreError;
use crate::util;
use crate::validation;

/// Object store whose buckets are directories
pub struct FsObjectStore {
	root: PathBuf,
	page_size: usize,
}

impl FsObjectStore {
	pub fn new<P: Into<PathBuf>>(root: P) -> Self {
		FsObjectStore { root: root.into(), page_size: 1000 }
	}

	/// Limit listing pages to `page_size` objects
	pub fn with_page_size(mut self, page_size: usize) -> Self {
		self.page_size = page_size.max(1);
		self
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	fn bucket_dir(&self, bucket: &str) -> StoreResult<PathBuf> {
		if bucket.is_empty() || bucket.contains('/') || bucket.contains('\\') || bucket == ".." {
			return Err(StoreError::Other(format!("Invalid bucket name: {:?}", bucket)));
		}
		let dir = self.root.join(bucket);
		if !dir.is_dir() {
			return Err(StoreError::NoSuchBucket { bucket: bucket.to_string() });
		}
		Ok(dir)
	}

	fn object_path(&self, bucket: &str, key: &str) -> StoreResult<PathBuf> {
		validation::validate_key(key).map_err(|e| StoreError::Other(e.to_string()))?;
		let mut path = self.bucket_dir(bucket)?;
		for segment in key.split('/').filter(|s| !s.is_empty()) {
			path.push(segment);
		}
		Ok(path)
	}

	/// Write `reader` to `path` through a temporary sibling
	async fn write_atomic(
		path: &Path,
		reader: &mut (dyn AsyncRead + Send + Unpin),
	) -> io::Result<u64> {
		if let Some(parent) = path.parent() {
			afs::create_dir_all(parent).await?;
		}
		let partial = util::PartialFile::new(path);
		let mut file = afs::File::create(partial.path()).await?;
		let written = tokio::io::copy(reader, &mut file).await?;
		file.flush().await?;
		drop(file);
		partial.commit().await?;
		Ok(written)
	}
}

fn not_found_as_no_such_key(e: io::Error, bucket: &str, key: &str) -> StoreError {
	if e.kind() == io::ErrorKind::NotFound {
		StoreError::NoSuchKey { bucket: bucket.to_string(), key: key.to_string() }
	} else {
		StoreError::Io(e)
	}
}

/// Collect `(key, size)` for every regular file under `dir`
fn walk_bucket(bucket_dir: &Path, dir: &Path, out: &mut Vec<(String, u64)>) -> io::Result<()> {
	for entry in fs::read_dir(dir)? {
		let entry = entry?;
		let path = entry.path();
		let meta = fs::metadata(&path)?;
		if meta.is_dir() {
			walk_bucket(bucket_dir, &path, out)?;
		} else if meta.is_file() {
			if util::is_partial_path(&path) {
				continue;
			}
			match endpoint::local_key(bucket_dir, &path) {
				Some(key) => out.push((key, meta.len())),
				None => {
					return Err(io::Error::new(
						io::ErrorKind::InvalidData,
						format!("object name is not valid UTF-8: {}", path.display()),
					))
				}
			}
		}
	}
	Ok(())
}

#[async_trait]
impl ObjectStore for FsObjectStore {
	async fn check_connectivity(&self) -> StoreResult<()> {
		match afs::metadata(&self.root).await {
			Ok(meta) if meta.is_dir() => Ok(()),
			Ok(_) => Err(StoreError::Other(format!(
				"Store root {} is not a directory",
				self.root.display()
			))),
			Err(e) => Err(StoreError::Other(format!(
				"Store root {} is not accessible: {}",
				self.root.display(),
				e
			))),
		}
	}

	async fn list_objects(
		&self,
		bucket: &str,
		prefix: &str,
		continuation: Option<&str>,
	) -> StoreResult<ListPage> {
		let bucket_dir = self.bucket_dir(bucket)?;
		let prefix = prefix.to_string();
		let after = continuation.map(str::to_string);
		let page_size = self.page_size;

		let page = tokio::task::spawn_blocking(move || -> io::Result<ListPage> {
			let mut found = Vec::new();
			walk_bucket(&bucket_dir, &bucket_dir, &mut found)?;
			found.retain(|(key, _)| key.starts_with(&prefix));
			found.sort();

			let mut remaining = found
				.into_iter()
				.filter(|(key, _)| after.as_ref().map_or(true, |a| key > a));

			let mut page = ListPage::default();
			for (key, size) in remaining.by_ref().take(page_size) {
				let digest = util::hash_file(&bucket_dir.join(&key))?;
				page.objects.push(ObjectInfo { key, size, etag: format!("\"{}\"", digest) });
			}
			if remaining.next().is_some() {
				page.next_continuation = page.objects.last().map(|o| o.key.clone());
			}
			Ok(page)
		})
		.await
		.map_err(|e| StoreError::Other(format!("Listing task failed: {}", e)))??;

		debug!("Listed {} object(s) from {}", page.objects.len(), bucket);
		Ok(page)
	}

	async fn get_object(
		&self,
		bucket: &str,
		key: &str,
		writer: &mut (dyn AsyncWrite + Send + Unpin),
	) -> StoreResult<u64> {
		let path = self.object_path(bucket, key)?;
		let mut file =
			afs::File::open(&path).await.map_err(|e| not_found_as_no_such_key(e, bucket, key))?;
		let n = tokio::io::copy(&mut file, writer).await?;
		writer.flush().await?;
		Ok(n)
	}

	async fn put_object(
		&self,
		bucket: &str,
		key: &str,
		reader: &mut (dyn AsyncRead + Send + Unpin),
		content_type: &str,
		acl: Acl,
	) -> StoreResult<()> {
		let path = self.object_path(bucket, key)?;
		let n = Self::write_atomic(&path, reader).await?;
		debug!("put {}/{} ({} bytes, {}, {})", bucket, key, n, content_type, acl);
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
		let source = self.object_path(source_bucket, source_key)?;
		let destination = self.object_path(bucket, key)?;
		let mut file = afs::File::open(&source)
			.await
			.map_err(|e| not_found_as_no_such_key(e, source_bucket, source_key))?;
		let n = Self::write_atomic(&destination, &mut file).await?;
		debug!(
			"copy {}/{} -> {}/{} ({} bytes, {}, {})",
			source_bucket, source_key, bucket, key, n, content_type, acl
		);
		Ok(())
	}

	async fn delete_object(&self, bucket: &str, key: &str) -> StoreResult<()> {
		let path = self.object_path(bucket, key)?;
		match afs::remove_file(&path).await {
			Ok(()) => {}
			Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(()),
			Err(e) => return Err(StoreError::Io(e)),
		}

		// Prune directories left empty, stopping at the bucket
		let bucket_dir = self.bucket_dir(bucket)?;
		let mut dir = path.parent().map(Path::to_path_buf);
		while let Some(current) = dir {
			if current == bucket_dir || afs::remove_dir(&current).await.is_err() {
				break;
			}
			dir = current.parent().map(Path::to_path_buf);
		}
		Ok(())
	}

	async fn head_object(&self, bucket: &str, key: &str) -> StoreResult<Option<ObjectInfo>> {
		let path = self.object_path(bucket, key)?;
		let meta = match afs::metadata(&path).await {
			Ok(meta) if meta.is_file() => meta,
			Ok(_) => return Ok(None),
			Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
			Err(e) => return Err(StoreError::Io(e)),
		};
		let digest = tokio::task::spawn_blocking(move || util::hash_file(&path))
			.await
			.map_err(|e| StoreError::Other(format!("Hashing task failed: {}", e)))??;
		Ok(Some(ObjectInfo { key: key.to_string(), size: meta.len(), etag: format!("\"{}\"", digest) }))
	}
}


// vim: ts=4
