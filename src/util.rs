//! Content digest helpers

use std::fs;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

const READ_BUF_SIZE: usize = 64 * 1024;

/// Suffix of in-flight writes; such files are never listed
pub const PARTIAL_SUFFIX: &str = ".bucketsync-part";

/// MD5 of a buffer, lowercase hex
pub fn hash(buf: &[u8]) -> String {
	hex::encode(md5::compute(buf).0)
}

/// MD5 over the whole byte stream of a file, lowercase hex
pub fn hash_file(path: &Path) -> io::Result<String> {
	let mut file = fs::File::open(path)?;
	let mut context = md5::Context::new();
	let mut buf = vec![0u8; READ_BUF_SIZE];
	loop {
		let n = file.read(&mut buf)?;
		if n == 0 {
			break;
		}
		context.consume(&buf[..n]);
	}
	Ok(hex::encode(context.compute().0))
}

/// Entity tag with surrounding quote characters removed
pub fn strip_etag_quotes(etag: &str) -> String {
	etag.replace('"', "")
}

/// Multipart entity tags look like `<hex>-<parts>` and are not a whole-file MD5
pub fn is_multipart_etag(etag: &str) -> bool {
	etag.contains('-')
}

/// Temporary sibling a write goes to before being renamed into place
pub fn partial_path(path: &Path) -> PathBuf {
	let mut name = path.file_name().map(|n| n.to_os_string()).unwrap_or_default();
	name.push(PARTIAL_SUFFIX);
	path.with_file_name(name)
}

pub fn is_partial_path(path: &Path) -> bool {
	path.file_name().map_or(false, |n| n.to_string_lossy().ends_with(PARTIAL_SUFFIX))
}

/// A temporary sibling of `target` that is removed on drop unless committed
///
/// Dropping the write future half-way (cancellation, error) therefore never
/// leaves a partial file behind.
pub struct PartialFile {
	tmp: PathBuf,
	target: PathBuf,
	committed: bool,
}

impl PartialFile {
	pub fn new(target: &Path) -> Self {
		PartialFile { tmp: partial_path(target), target: target.to_path_buf(), committed: false }
	}

	/// Path the content is written to before the commit
	pub fn path(&self) -> &Path {
		&self.tmp
	}

	/// Rename the temporary file into place
	pub async fn commit(mut self) -> io::Result<()> {
		tokio::fs::rename(&self.tmp, &self.target).await?;
		self.committed = true;
		Ok(())
	}
}

impl Drop for PartialFile {
	fn drop(&mut self) {
		if !self.committed {
			let _ = fs::remove_file(&self.tmp);
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::io::Write;

	#[test]
	fn test_hash_known_value() {
		assert_eq!(hash(b""), "d41d8cd98f00b204e9800998ecf8427e");
		assert_eq!(hash(b"hello"), "5d41402abc4b2a76b9719d911017c592");
	}

	#[test]
	fn test_hash_file_matches_buffer_hash() {
		let dir = tempfile::TempDir::new().unwrap();
		let path = dir.path().join("big.bin");
		let data: Vec<u8> = (0..200_000u32).map(|i| (i % 251) as u8).collect();
		fs::File::create(&path).unwrap().write_all(&data).unwrap();
		assert_eq!(hash_file(&path).unwrap(), hash(&data));
	}

	#[test]
	fn test_strip_etag_quotes() {
		assert_eq!(strip_etag_quotes("\"abc\""), "abc");
		assert_eq!(strip_etag_quotes("abc"), "abc");
	}

	#[test]
	fn test_partial_path() {
		let tmp = partial_path(Path::new("/d/a.txt"));
		assert_eq!(tmp, PathBuf::from("/d/a.txt.bucketsync-part"));
		assert!(is_partial_path(&tmp));
		assert!(!is_partial_path(Path::new("/d/a.txt")));
	}

	#[tokio::test]
	async fn test_partial_file_removed_unless_committed() {
		let dir = tempfile::TempDir::new().unwrap();
		let target = dir.path().join("a.txt");

		let partial = PartialFile::new(&target);
		fs::write(partial.path(), b"half").unwrap();
		drop(partial);
		assert!(!partial_path(&target).exists());
		assert!(!target.exists());

		let partial = PartialFile::new(&target);
		fs::write(partial.path(), b"whole").unwrap();
		partial.commit().await.unwrap();
		assert!(!partial_path(&target).exists());
		assert_eq!(fs::read(&target).unwrap(), b"whole");
	}

	#[test]
	fn test_multipart_etag() {
		assert!(is_multipart_etag("9b2cf535f27731c974343645a3985328-3"));
		assert!(!is_multipart_etag("9b2cf535f27731c974343645a3985328"));
	}
}

// vim: ts=4
