//! Configuration for a mirror run
//!
//! The configuration follows a priority chain:
//! 1. Built-in defaults (Config::default())
//! 2. Config file (TOML, or JSON when the file ends in `.json`)
//! 3. Environment variables (BUCKETSYNC_* prefix)
//! 4. CLI flags (highest priority, applied by the binary)

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::acl::Acl;
use crate::error::SyncError;
use crate::executor::DEFAULT_MAX_WORKERS;
use crate::validation::{self, ValidationError, Validator};

/// Prefix of every environment override
pub const ENV_PREFIX: &str = "BUCKETSYNC_";

/// Default listing page size
pub const DEFAULT_PAGE_SIZE: usize = 1000;

// ============================================================================
// MAIN CONFIGURATION STRUCT
// ============================================================================

/// Everything a mirror run needs to know
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
	// ========================================================================
	// ENDPOINTS
	// ========================================================================
	/// Source location (`remote://bucket/path`, `s3://bucket/path` or a path)
	pub source: String,

	/// Destination location, same syntax as `source`
	pub destination: String,

	// ========================================================================
	// BEHAVIOR
	// ========================================================================
	/// Concurrent transfers per batch
	pub max_threads: usize,

	/// Remove destination entries missing from the source
	pub delete: bool,

	/// Report actions without performing them
	pub dry_run: bool,

	/// Canned ACL for written remote objects
	pub acl: Acl,

	/// Compare the destination digest after every transfer
	pub verify: bool,

	// ========================================================================
	// STORAGE BACKEND
	// ========================================================================
	/// Provider region, handed to the connectivity bootstrap
	pub region: Option<String>,

	/// Credential profile, handed to the connectivity bootstrap
	pub profile: Option<String>,

	/// Root directory of the directory-backed object store
	pub store_root: Option<PathBuf>,

	/// Objects per listing page
	pub page_size: usize,

	// ========================================================================
	// OUTPUT & LOGGING
	// ========================================================================
	/// Default log filter when RUST_LOG is not set
	pub log_level: String,
}

impl Default for Config {
	fn default() -> Self {
		Config {
			source: String::new(),
			destination: String::new(),

			max_threads: DEFAULT_MAX_WORKERS,
			delete: false,
			dry_run: false,
			acl: Acl::Private,
			verify: false,

			region: None,
			profile: None,
			store_root: None,
			page_size: DEFAULT_PAGE_SIZE,

			log_level: "info".to_string(),
		}
	}
}

impl Config {
	/// Load a config file on top of the defaults
	pub fn from_file(path: &Path) -> Result<Config, SyncError> {
		let content = fs::read_to_string(path).map_err(|e| SyncError::InvalidConfig {
			message: format!("Cannot read {}: {}", path.display(), e),
		})?;
		let is_json = path.extension().map_or(false, |ext| ext.eq_ignore_ascii_case("json"));
		let parsed = if is_json {
			serde_json::from_str(&content).map_err(|e| e.to_string())
		} else {
			toml::from_str(&content).map_err(|e| e.to_string())
		};
		let config = parsed.map_err(|e| SyncError::InvalidConfig {
			message: format!("Cannot parse {}: {}", path.display(), e),
		})?;
		debug!("Loaded configuration from {}", path.display());
		Ok(config)
	}

	/// Apply `BUCKETSYNC_*` variables from the process environment
	pub fn apply_env(&mut self) -> Result<(), SyncError> {
		self.apply_vars(std::env::vars())
	}

	/// Apply `BUCKETSYNC_*` overrides from an arbitrary variable list
	pub fn apply_vars<I>(&mut self, vars: I) -> Result<(), SyncError>
	where
		I: IntoIterator<Item = (String, String)>,
	{
		for (name, value) in vars {
			let field = match name.strip_prefix(ENV_PREFIX) {
				Some(field) => field,
				None => continue,
			};
			match field {
				"SOURCE" => self.source = value,
				"DESTINATION" => self.destination = value,
				"MAX_THREADS" => self.max_threads = parse_var(&name, &value)?,
				"DELETE" => self.delete = parse_flag(&name, &value)?,
				"DRY_RUN" | "DRYRUN" => self.dry_run = parse_flag(&name, &value)?,
				"ACL" => self.acl = parse_var(&name, &value)?,
				"VERIFY" => self.verify = parse_flag(&name, &value)?,
				"REGION" => self.region = Some(value),
				"PROFILE" => self.profile = Some(value),
				"STORE_ROOT" => self.store_root = Some(PathBuf::from(value)),
				"PAGE_SIZE" => self.page_size = parse_var(&name, &value)?,
				"LOG_LEVEL" => self.log_level = value,
				_ => debug!("Ignoring unknown variable {}", name),
			}
		}
		Ok(())
	}
}

fn parse_var<T>(name: &str, value: &str) -> Result<T, SyncError>
where
	T: std::str::FromStr,
	T::Err: std::fmt::Display,
{
	value.trim().parse().map_err(|e| SyncError::InvalidConfig {
		message: format!("{}={:?}: {}", name, value, e),
	})
}

fn parse_flag(name: &str, value: &str) -> Result<bool, SyncError> {
	match value.trim().to_ascii_lowercase().as_str() {
		"1" | "true" | "yes" | "on" => Ok(true),
		"0" | "false" | "no" | "off" | "" => Ok(false),
		_ => Err(SyncError::InvalidConfig { message: format!("{}={:?}: not a boolean", name, value) }),
	}
}

impl Validator for Config {
	fn validate(&self) -> Result<(), ValidationError> {
		validation::validate_required("source", &self.source)?;
		validation::validate_required("destination", &self.destination)?;
		validation::validate_max_threads(self.max_threads)?;
		validation::validate_page_size(self.page_size)?;
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn vars(list: &[(&str, &str)]) -> Vec<(String, String)> {
		list.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
	}

	#[test]
	fn test_config_default() {
		let config = Config::default();
		assert_eq!(config.max_threads, 12);
		assert_eq!(config.acl, Acl::Private);
		assert_eq!(config.page_size, 1000);
		assert!(!config.delete);
		assert!(!config.dry_run);
		assert!(!config.verify);
	}

	#[test]
	fn test_default_is_invalid_without_endpoints() {
		let err = Config::default().validate().unwrap_err();
		assert!(err.to_string().contains("source"));
	}

	#[test]
	fn test_zero_threads_rejected() {
		let config = Config {
			source: "a".into(),
			destination: "remote://b/p".into(),
			max_threads: 0,
			..Default::default()
		};
		assert!(config.validate().unwrap_err().to_string().contains("less than 1"));
	}

	#[test]
	fn test_env_overlay() {
		let mut config = Config::default();
		config
			.apply_vars(vars(&[
				("BUCKETSYNC_SOURCE", "./photos"),
				("BUCKETSYNC_MAX_THREADS", "3"),
				("BUCKETSYNC_DELETE", "yes"),
				("BUCKETSYNC_ACL", "public-read"),
				("HOME", "/root"),
			]))
			.unwrap();
		assert_eq!(config.source, "./photos");
		assert_eq!(config.max_threads, 3);
		assert!(config.delete);
		assert_eq!(config.acl, Acl::PublicRead);
	}

	#[test]
	fn test_env_overlay_rejects_garbage() {
		let mut config = Config::default();
		assert!(config.apply_vars(vars(&[("BUCKETSYNC_MAX_THREADS", "many")])).is_err());
		assert!(config.apply_vars(vars(&[("BUCKETSYNC_VERIFY", "maybe")])).is_err());
		assert!(config.apply_vars(vars(&[("BUCKETSYNC_ACL", "world")])).is_err());
	}

	#[test]
	fn test_config_serialization() {
		let config = Config { source: "a".into(), region: Some("eu-west-1".into()), ..Default::default() };
		let json = serde_json::to_string(&config).unwrap();
		assert!(json.contains("\"maxThreads\":12"));
		let deserialized: Config = serde_json::from_str(&json).unwrap();
		assert_eq!(config, deserialized);
	}
}

// vim: ts=4
