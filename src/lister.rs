//! Entry listing for local directories and remote prefixes
//!
//! Both listers produce an `EntrySet` whose keys come from the same
//! derivation (`endpoint::relative_key`), so the differ can join them.
//! Only regular files with a nonzero size are listed.

use async_trait::async_trait;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::endpoint::{self, Endpoint};
use crate::error::SyncError;
use crate::store::{self, ObjectStore};
use crate::types::{Entry, EntrySet};
use crate::util;
use crate::validation;

/// Produces the entry inventory of one endpoint
#[async_trait]
pub trait Lister: Send + Sync {
	async fn list(&self, endpoint: &Endpoint) -> Result<EntrySet, SyncError>;
}

/// Recursive filesystem traversal with whole-file MD5 digests
pub struct LocalLister {
	allow_missing_root: bool,
}

impl LocalLister {
	/// A missing root is a listing error
	pub fn new() -> Self {
		LocalLister { allow_missing_root: false }
	}

	/// A missing root lists as empty (a destination not created yet)
	pub fn allow_missing_root() -> Self {
		LocalLister { allow_missing_root: true }
	}
}

impl Default for LocalLister {
	fn default() -> Self {
		Self::new()
	}
}

/// Bucket listing through an `ObjectStore`, entity tags as digests
pub struct RemoteLister {
	store: Arc<dyn ObjectStore>,
}

impl RemoteLister {
	pub fn new(store: Arc<dyn ObjectStore>) -> Self {
		RemoteLister { store }
	}
}

/// Pick the lister matching an endpoint's kind
pub fn lister_for(
	endpoint: &Endpoint,
	store: Arc<dyn ObjectStore>,
	allow_missing_root: bool,
) -> Box<dyn Lister> {
	match endpoint {
		Endpoint::Local { .. } if allow_missing_root => Box::new(LocalLister::allow_missing_root()),
		Endpoint::Local { .. } => Box::new(LocalLister::new()),
		Endpoint::Remote { .. } => Box::new(RemoteLister::new(store)),
	}
}

fn listing_error<E>(location: &Path, e: E) -> SyncError
where
	E: std::error::Error + Send + Sync + 'static,
{
	SyncError::Listing { location: location.display().to_string(), source: Box::new(e) }
}

#[async_trait]
impl Lister for LocalLister {
	async fn list(&self, endpoint: &Endpoint) -> Result<EntrySet, SyncError> {
		let root = match endpoint {
			Endpoint::Local { root, .. } => root.clone(),
			Endpoint::Remote { .. } => {
				return Err(SyncError::InvalidConfig {
					message: format!("{} is not a local endpoint", endpoint),
				})
			}
		};

		match fs::metadata(&root) {
			Ok(meta) if meta.is_dir() => {}
			Ok(_) => {
				return Err(listing_error(
					&root,
					io::Error::new(io::ErrorKind::Other, "not a directory"),
				))
			}
			Err(e) if e.kind() == io::ErrorKind::NotFound && self.allow_missing_root => {
				info!("{} does not exist yet, nothing to list", root.display());
				return Ok(EntrySet::new());
			}
			Err(e) => return Err(listing_error(&root, e)),
		}

		let entries = tokio::task::spawn_blocking(move || {
			let mut entries = EntrySet::new();
			walk_local(&root, &root, &mut Vec::new(), &mut entries).map(|_| entries)
		})
		.await
		.map_err(|e| SyncError::Listing {
			location: endpoint.to_string(),
			source: Box::new(io::Error::new(io::ErrorKind::Other, e.to_string())),
		})??;

		debug!("Listed {} local entries under {}", entries.len(), endpoint);
		Ok(entries)
	}
}

/// Resolve a symlink to its target's metadata
fn follow_link(path: &Path) -> Result<fs::Metadata, SyncError> {
	match fs::metadata(path) {
		Ok(meta) => Ok(meta),
		Err(e) if e.kind() == io::ErrorKind::NotFound => {
			let target = fs::read_link(path).unwrap_or_else(|_| PathBuf::from("?"));
			Err(SyncError::BrokenLink {
				path: path.display().to_string(),
				target: target.display().to_string(),
			})
		}
		Err(e) => Err(listing_error(path, e)),
	}
}

/// Walk `dir`, following symlinked directories
///
/// `ancestors` holds the canonical paths of the directories on the current
/// descent; meeting one of them again is a symlink loop.
fn walk_local(
	root: &Path,
	dir: &Path,
	ancestors: &mut Vec<PathBuf>,
	entries: &mut EntrySet,
) -> Result<(), SyncError> {
	let canonical = fs::canonicalize(dir).map_err(|e| listing_error(dir, e))?;
	if ancestors.contains(&canonical) {
		return Err(listing_error(
			dir,
			io::Error::new(
				io::ErrorKind::InvalidInput,
				format!("symlink loop back to {}", canonical.display()),
			),
		));
	}
	ancestors.push(canonical);

	for dir_entry in fs::read_dir(dir).map_err(|e| listing_error(dir, e))? {
		let dir_entry = dir_entry.map_err(|e| listing_error(dir, e))?;
		let path = dir_entry.path();
		let file_type = dir_entry.file_type().map_err(|e| listing_error(&path, e))?;

		let meta = if file_type.is_symlink() {
			follow_link(&path)?
		} else {
			dir_entry.metadata().map_err(|e| listing_error(&path, e))?
		};

		if meta.is_dir() {
			walk_local(root, &path, ancestors, entries)?;
			continue;
		}
		if !meta.is_file() || meta.len() == 0 || util::is_partial_path(&path) {
			continue;
		}

		let key = endpoint::local_key(root, &path).ok_or_else(|| {
			listing_error(
				&path,
				io::Error::new(io::ErrorKind::InvalidData, "file name is not valid UTF-8"),
			)
		})?;
		let digest = util::hash_file(&path).map_err(|e| listing_error(&path, e))?;
		entries.insert(
			key.clone(),
			Entry { key, size: meta.len(), content_digest: digest, is_directory: false },
		);
	}

	ancestors.pop();
	Ok(())
}

#[async_trait]
impl Lister for RemoteLister {
	async fn list(&self, endpoint: &Endpoint) -> Result<EntrySet, SyncError> {
		let (bucket, root) = match endpoint {
			Endpoint::Remote { bucket, root } => (bucket, root),
			Endpoint::Local { .. } => {
				return Err(SyncError::InvalidConfig {
					message: format!("{} is not a remote endpoint", endpoint),
				})
			}
		};
		let prefix = endpoint.list_prefix().unwrap_or_default();

		let objects = store::list_all(self.store.as_ref(), bucket, &prefix).await.map_err(|e| {
			SyncError::Listing { location: endpoint.to_string(), source: Box::new(e) }
		})?;

		let mut entries = EntrySet::new();
		for object in objects {
			if object.key.ends_with('/') || object.size == 0 {
				continue;
			}
			let key = match endpoint::relative_key(root, &object.key) {
				Some(key) => key,
				None => continue,
			};
			if let Err(e) = validation::validate_key(&key) {
				warn!("Skipping remote object {}: {}", object.key, e);
				continue;
			}
			let digest = util::strip_etag_quotes(&object.etag);
			if util::is_multipart_etag(&digest) {
				debug!("{} has a multipart entity tag; it will always compare as changed", object.key);
			}
			entries.insert(
				key.clone(),
				Entry { key, size: object.size, content_digest: digest, is_directory: false },
			);
		}

		debug!("Listed {} remote entries under {}", entries.len(), endpoint);
		Ok(entries)
	}
}


// vim: ts=4
