//! One-shot mirror run
//!
//! Wires the pipeline together: resolve both locations, list both sides,
//! diff, plan, execute. Everything up to execution is fatal on error; during
//! execution per-item failures are collected and reported at the end.
//!
//! ```rust,ignore
//! use bucketsync::mirror::MirrorBuilder;
//!
//! let report = MirrorBuilder::new()
//!     .source("./photos")
//!     .destination("remote://media/photos")
//!     .store_root("/srv/buckets")
//!     .delete(true)
//!     .run()
//!     .await?;
//! println!("{}", report.summary_line());
//! ```

use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::acl::Acl;
use crate::config::Config;
use crate::diff;
use crate::endpoint::{self, Endpoint, EndpointKind};
use crate::error::SyncError;
use crate::executor::{ExecutionReport, Executor};
use crate::lister;
use crate::planner;
use crate::store::{FsObjectStore, ObjectStore};
use crate::utils::CancelToken;
use crate::validation::Validator;

/// Fluent setup of a mirror run
pub struct MirrorBuilder {
	config: Config,
	store: Option<Arc<dyn ObjectStore>>,
	cancel: CancelToken,
}

impl MirrorBuilder {
	pub fn new() -> Self {
		Self::from_config(Config::default())
	}

	/// Start from an already layered configuration
	pub fn from_config(config: Config) -> Self {
		MirrorBuilder { config, store: None, cancel: CancelToken::new() }
	}

	pub fn source<S: Into<String>>(mut self, source: S) -> Self {
		self.config.source = source.into();
		self
	}

	pub fn destination<S: Into<String>>(mut self, destination: S) -> Self {
		self.config.destination = destination.into();
		self
	}

	pub fn max_threads(mut self, max_threads: usize) -> Self {
		self.config.max_threads = max_threads;
		self
	}

	pub fn delete(mut self, delete: bool) -> Self {
		self.config.delete = delete;
		self
	}

	pub fn dry_run(mut self, dry_run: bool) -> Self {
		self.config.dry_run = dry_run;
		self
	}

	pub fn acl(mut self, acl: Acl) -> Self {
		self.config.acl = acl;
		self
	}

	pub fn verify(mut self, verify: bool) -> Self {
		self.config.verify = verify;
		self
	}

	/// Use a directory-backed store rooted at `root`
	pub fn store_root<P: Into<PathBuf>>(mut self, root: P) -> Self {
		self.config.store_root = Some(root.into());
		self
	}

	/// Use an explicit store; takes precedence over `store_root`
	pub fn store(mut self, store: Arc<dyn ObjectStore>) -> Self {
		self.store = Some(store);
		self
	}

	pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
		self.cancel = cancel;
		self
	}

	pub fn config(&self) -> &Config {
		&self.config
	}

	/// Execute the mirror run
	pub async fn run(self) -> Result<ExecutionReport, SyncError> {
		let MirrorBuilder { config, store, cancel } = self;
		let page_size = config.page_size;
		let store = match store {
			Some(store) => Some(store),
			None => config.store_root.as_ref().map(|root| {
				let fs_store = FsObjectStore::new(root.clone()).with_page_size(page_size);
				Arc::new(fs_store) as Arc<dyn ObjectStore>
			}),
		};
		mirror(&config, store, cancel).await
	}
}

impl Default for MirrorBuilder {
	fn default() -> Self {
		Self::new()
	}
}

/// Mirror `config.source` onto `config.destination` through `store`
pub async fn run(config: &Config, store: Arc<dyn ObjectStore>) -> Result<ExecutionReport, SyncError> {
	mirror(config, Some(store), CancelToken::new()).await
}

async fn mirror(
	config: &Config,
	store: Option<Arc<dyn ObjectStore>>,
	cancel: CancelToken,
) -> Result<ExecutionReport, SyncError> {
	config.validate()?;

	let source = endpoint::resolve(&config.source)?;
	let destination = endpoint::resolve(&config.destination)?;
	info!("Mirroring {} to {}", source, destination);

	// Reject unsupported pairs before touching any backend
	planner::transfer_kind(source.kind(), destination.kind())?;

	let store = match store {
		Some(store) => store,
		None => {
			return Err(SyncError::Connectivity {
				message: "no object store configured (set a store root)".to_string(),
			})
		}
	};
	connect(config, &source, &destination, store.as_ref()).await?;

	if cancel.is_cancelled() {
		return Err(SyncError::Aborted);
	}

	let source_entries =
		lister::lister_for(&source, Arc::clone(&store), false).list(&source).await?;
	info!("Source: {} entries", source_entries.len());
	let destination_entries =
		lister::lister_for(&destination, Arc::clone(&store), true).list(&destination).await?;
	info!("Destination: {} entries", destination_entries.len());

	let result = diff::diff(&source_entries, &destination_entries);
	info!(
		"Diff: {} in sync, {} new, {} changed, {} only at destination",
		result.common.len(),
		result.source_only.len(),
		result.source_mismatch.len(),
		result.destination_only.len()
	);
	if !config.delete && !result.destination_only.is_empty() {
		debug!("{} destination-only entries kept (delete disabled)", result.destination_only.len());
	}

	let plan = planner::plan(&result, &source, &destination, config.delete)?;
	let (copies, downloads, uploads, deletes) = planner::count_by_kind(&plan);
	info!(
		"Plan: {} copy, {} download, {} upload, {} delete",
		copies, downloads, uploads, deletes
	);

	let report = Executor::new(store)
		.max_workers(config.max_threads)
		.dry_run(config.dry_run)
		.acl(config.acl)
		.verify(config.verify)
		.cancel_token(cancel)
		.execute(&plan)
		.await;

	if report.failed() > 0 {
		warn!("Finished with failures: {}", report.summary_line());
	} else if report.dry_run {
		info!("Dry run finished: {}", report.summary_line());
	} else {
		info!("Finished: {}", report.summary_line());
	}
	report.into_result()
}

/// Connectivity pre-check, only when a remote endpoint is involved
async fn connect(
	config: &Config,
	source: &Endpoint,
	destination: &Endpoint,
	store: &dyn ObjectStore,
) -> Result<(), SyncError> {
	if source.kind() != EndpointKind::Remote && destination.kind() != EndpointKind::Remote {
		return Ok(());
	}
	debug!(
		"Checking store connectivity (region: {}, profile: {})",
		config.region.as_deref().unwrap_or("default"),
		config.profile.as_deref().unwrap_or("default")
	);
	store
		.check_connectivity()
		.await
		.map_err(|e| SyncError::Connectivity { message: e.to_string() })
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::store::MemoryStore;

	#[tokio::test]
	async fn test_missing_locations_rejected() {
		let result = MirrorBuilder::new().destination("remote://b/p").run().await;
		assert!(matches!(result, Err(SyncError::InvalidConfig { .. })));
	}

	#[tokio::test]
	async fn test_local_to_local_rejected_before_store() {
		let result = MirrorBuilder::new().source("/tmp/a").destination("/tmp/b").run().await;
		assert!(matches!(result, Err(SyncError::UnsupportedEndpointPair { .. })));
	}

	#[tokio::test]
	async fn test_no_store_is_connectivity_error() {
		let result = MirrorBuilder::new().source("remote://a/x").destination("remote://b/y").run().await;
		assert!(matches!(result, Err(SyncError::Connectivity { .. })));
	}

	#[tokio::test]
	async fn test_offline_store_fails_before_listing() {
		let store = Arc::new(MemoryStore::new());
		store.set_offline(true);
		let result = MirrorBuilder::new()
			.source("remote://a/x")
			.destination("remote://b/y")
			.store(store.clone())
			.run()
			.await;
		assert!(matches!(result, Err(SyncError::Connectivity { .. })));
	}

	#[tokio::test]
	async fn test_remote_copy_between_buckets() {
		let store = Arc::new(MemoryStore::new());
		store.insert("a", "x/one.txt", b"one");
		store.insert("a", "x/sub/two.txt", b"two");
		store.create_bucket("b");

		let report = MirrorBuilder::new()
			.source("remote://a/x")
			.destination("s3://b/y")
			.store(store.clone())
			.run()
			.await
			.unwrap();
		assert_eq!(report.succeeded(), 2);
		assert_eq!(store.keys("b"), vec!["y/one.txt".to_string(), "y/sub/two.txt".to_string()]);
	}
}

// vim: ts=4
