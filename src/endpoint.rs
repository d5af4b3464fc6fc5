//! Endpoint resolution for source and destination locations
//!
//! A location is either `remote://bucket/prefix` (also accepted as
//! `s3://bucket/prefix`) or a filesystem path.

use std::fmt;
use std::path::{Component, Path, PathBuf};
use url::Url;

use crate::error::SyncError;
use crate::types::Locator;

/// Endpoint kind indicator
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EndpointKind {
	Local,
	Remote,
}

impl fmt::Display for EndpointKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			EndpointKind::Local => write!(f, "local"),
			EndpointKind::Remote => write!(f, "remote"),
		}
	}
}

/// A resolved source or destination
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Endpoint {
	/// Absolute directory path plus its parent directory
	///
	/// `parent` is part of the resolved endpoint record only; keys are
	/// always derived from `root` (see `relative_key`).
	Local { root: PathBuf, parent: PathBuf },
	/// Bucket and `/`-separated prefix without leading or trailing separators
	Remote { bucket: String, root: String },
}

impl Endpoint {
	pub fn kind(&self) -> EndpointKind {
		match self {
			Endpoint::Local { .. } => EndpointKind::Local,
			Endpoint::Remote { .. } => EndpointKind::Remote,
		}
	}

	/// Locator of `key` under this endpoint's root
	pub fn locate(&self, key: &str) -> Locator {
		match self {
			Endpoint::Local { root, .. } => {
				let mut path = root.clone();
				for segment in key.split('/').filter(|s| !s.is_empty()) {
					path.push(segment);
				}
				Locator::Local(path)
			}
			Endpoint::Remote { bucket, root } => {
				Locator::Remote { bucket: bucket.clone(), key: join_key(root, key) }
			}
		}
	}

	/// Listing prefix for a remote root: `root + "/"`, or the whole bucket
	pub fn list_prefix(&self) -> Option<String> {
		match self {
			Endpoint::Local { .. } => None,
			Endpoint::Remote { root, .. } if root.is_empty() => Some(String::new()),
			Endpoint::Remote { root, .. } => Some(format!("{}/", root)),
		}
	}
}

impl fmt::Display for Endpoint {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Endpoint::Local { root, .. } => write!(f, "{}", root.display()),
			Endpoint::Remote { bucket, root } => write!(f, "remote://{}/{}", bucket, root),
		}
	}
}

/// Resolve a raw location string into an Endpoint
pub fn resolve(raw: &str) -> Result<Endpoint, SyncError> {
	let invalid = |message: String| SyncError::InvalidLocation { location: raw.to_string(), message };

	if raw.trim().is_empty() {
		return Err(invalid("location is empty".to_string()));
	}

	let scheme_end = match raw.find("://") {
		Some(pos) => pos,
		None => return resolve_local(Path::new(raw)).map_err(|e| invalid(e.to_string())),
	};

	let url = Url::parse(raw).map_err(|e| invalid(e.to_string()))?;
	match url.scheme() {
		"remote" | "s3" => {
			let bucket = match url.host_str() {
				Some(host) if !host.is_empty() => host.to_string(),
				_ => return Err(invalid("missing bucket name".to_string())),
			};
			// Path taken verbatim so keys are not percent-encoded
			let rest = &raw[scheme_end + 3..];
			let path = match rest.find('/') {
				Some(slash) => &rest[slash..],
				None => "",
			};
			let path = path.split(|c| c == '?' || c == '#').next().unwrap_or("");
			Ok(Endpoint::Remote { bucket, root: path.trim_matches('/').to_string() })
		}
		"file" => {
			let path = url
				.to_file_path()
				.map_err(|_| invalid("file URL has no usable path".to_string()))?;
			resolve_local(&path).map_err(|e| invalid(e.to_string()))
		}
		other => Err(invalid(format!("unsupported scheme '{}'", other))),
	}
}

fn resolve_local(path: &Path) -> std::io::Result<Endpoint> {
	let absolute = if path.is_absolute() {
		path.to_path_buf()
	} else {
		std::env::current_dir()?.join(path)
	};
	let root = normalize(&absolute);
	let parent = root.parent().map(Path::to_path_buf).unwrap_or_else(|| root.clone());
	Ok(Endpoint::Local { root, parent })
}

/// Lexically clean a path: drop `.` segments and fold `..` into the parent
fn normalize(path: &Path) -> PathBuf {
	let mut out = PathBuf::new();
	for component in path.components() {
		match component {
			Component::CurDir => {}
			Component::ParentDir => {
				out.pop();
			}
			other => out.push(other.as_os_str()),
		}
	}
	out
}

/// Join a `/`-separated prefix and key
pub fn join_key(root: &str, key: &str) -> String {
	let root = root.trim_matches('/');
	let key = key.trim_start_matches('/');
	if root.is_empty() {
		key.to_string()
	} else {
		format!("{}/{}", root, key)
	}
}

/// Derive an entry key from a full `/`-separated path under `root`
///
/// The root's segments are removed from the front of `path` and the rest is
/// joined with `/`. Returns None when `path` is not strictly below `root`.
/// Both listers go through this function, so a file at the same position
/// under either root gets the same key.
pub fn relative_key(root: &str, path: &str) -> Option<String> {
	let root_segments = root.split('/').filter(|s| !s.is_empty());
	let mut path_segments = path.split('/').filter(|s| !s.is_empty());

	for expected in root_segments {
		if path_segments.next()? != expected {
			return None;
		}
	}

	let rest: Vec<&str> = path_segments.collect();
	if rest.is_empty() {
		None
	} else {
		Some(rest.join("/"))
	}
}

/// Derive an entry key for a local file under `root`
///
/// Returns None for paths outside the root or with non UTF-8 names.
pub fn local_key(root: &Path, path: &Path) -> Option<String> {
	relative_key(&path_to_slashed(root)?, &path_to_slashed(path)?)
}

fn path_to_slashed(path: &Path) -> Option<String> {
	let mut segments = Vec::new();
	for component in path.components() {
		match component {
			Component::Normal(name) => segments.push(name.to_str()?),
			Component::Prefix(prefix) => segments.push(prefix.as_os_str().to_str()?),
			_ => {}
		}
	}
	Some(segments.join("/"))
}


// vim: ts=4
