//! Canned access control lists applied to written remote objects
//!
//! Follows the usual object-storage canned ACL names. Includes
//! FromStr for CLI and config parsing.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Canned ACL applied to every object written by a copy or upload
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Acl {
	/// Owner gets full control, nobody else has access (default)
	#[default]
	Private,

	/// Owner gets full control, everyone can read
	PublicRead,

	/// Owner gets full control, everyone can read and write
	PublicReadWrite,

	/// Owner gets full control, authenticated users can read
	AuthenticatedRead,

	/// Bucket owner can read
	BucketOwnerRead,

	/// Bucket owner gets full control
	BucketOwnerFullControl,
}

impl FromStr for Acl {
	type Err = String;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.to_lowercase().as_str() {
			"private" => Ok(Self::Private),
			"public-read" => Ok(Self::PublicRead),
			"public-read-write" => Ok(Self::PublicReadWrite),
			"authenticated-read" => Ok(Self::AuthenticatedRead),
			"bucket-owner-read" => Ok(Self::BucketOwnerRead),
			"bucket-owner-full-control" => Ok(Self::BucketOwnerFullControl),
			_ => Err(format!(
				"Unknown ACL: {}. Valid options: private, public-read, public-read-write, \
				 authenticated-read, bucket-owner-read, bucket-owner-full-control",
				s
			)),
		}
	}
}

impl std::fmt::Display for Acl {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		match self {
			Self::Private => write!(f, "private"),
			Self::PublicRead => write!(f, "public-read"),
			Self::PublicReadWrite => write!(f, "public-read-write"),
			Self::AuthenticatedRead => write!(f, "authenticated-read"),
			Self::BucketOwnerRead => write!(f, "bucket-owner-read"),
			Self::BucketOwnerFullControl => write!(f, "bucket-owner-full-control"),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_acl_default_is_private() {
		assert_eq!(Acl::default(), Acl::Private);
	}

	#[test]
	fn test_acl_parse_and_display_agree() {
		for name in ["private", "public-read", "bucket-owner-full-control"].iter() {
			let acl: Acl = name.parse().unwrap();
			assert_eq!(acl.to_string(), *name);
		}
		assert_eq!("PUBLIC-READ".parse::<Acl>().unwrap(), Acl::PublicRead);
	}

	#[test]
	fn test_acl_parse_unknown() {
		let err = "world-writable".parse::<Acl>().unwrap_err();
		assert!(err.contains("Unknown ACL"));
	}
}

// vim: ts=4
