//! Plan execution
//!
//! The plan is split by kind into copy, download, upload and delete batches,
//! run strictly in that order. Each transfer batch gets its own pool of
//! `min(max_workers, batch size)` tasks pulling from a shared queue; every
//! item produces exactly one `ItemOutcome` on the results channel and the
//! batch is done once all outcomes are in. Deletes run one at a time.
//!
//! A failing item is recorded and never stops its siblings. In dry-run mode
//! the same dispatch and counting path runs, only the store calls are
//! skipped.

pub mod report;

pub use self::report::{ExecutionReport, Failure, ItemOutcome, KindSummary};

use futures::future::join_all;
use std::path::Path;
use std::sync::Arc;
use tokio::fs as afs;
use tokio::io::AsyncWriteExt;
use tokio::sync::{mpsc, Mutex};
use tracing::{debug, error, info};

use crate::acl::Acl;
use crate::error::{StoreError, SyncError};
use crate::store::{content_type_for, ObjectStore, StoreResult};
use crate::types::{ActionItem, ActionKind, ActionPlan, Locator};
use crate::util;
use crate::utils::CancelToken;

/// Default worker pool width
pub const DEFAULT_MAX_WORKERS: usize = 12;

type Job = (String, ActionItem);

/// Per-item work, cloned into every worker task
#[derive(Clone)]
struct Worker {
	store: Arc<dyn ObjectStore>,
	dry_run: bool,
	acl: Acl,
	verify: bool,
	cancel: CancelToken,
}

impl Worker {
	async fn run(&self, key: String, item: ActionItem) -> ItemOutcome {
		let result = if self.dry_run {
			Ok(())
		} else if self.cancel.is_cancelled() {
			Err(StoreError::Cancelled)
		} else {
			tokio::select! {
				result = self.perform(&item) => result,
				_ = self.cancel.cancelled() => Err(StoreError::Cancelled),
			}
		};

		match &result {
			Ok(()) => debug!("done: {}", item.message),
			Err(e) => error!("{} failed: {}", item.message, e),
		}
		ItemOutcome { key, kind: item.kind, message: item.message, result }
	}

	async fn perform(&self, item: &ActionItem) -> StoreResult<()> {
		match (item.kind, &item.source, &item.destination) {
			(
				ActionKind::Copy,
				Some(Locator::Remote { bucket: source_bucket, key: source_key }),
				Locator::Remote { bucket, key },
			) => {
				let content_type = content_type_for(key);
				self.store
					.copy_object(source_bucket, source_key, bucket, key, &content_type, self.acl)
					.await?;
				self.verify_remote(bucket, key, item).await
			}
			(ActionKind::Download, Some(Locator::Remote { bucket, key }), Locator::Local(path)) => {
				self.download(bucket, key, path, item).await
			}
			(ActionKind::Upload, Some(Locator::Local(path)), Locator::Remote { bucket, key }) => {
				let mut file = afs::File::open(path).await?;
				let content_type = content_type_for(&path.to_string_lossy());
				self.store.put_object(bucket, key, &mut file, &content_type, self.acl).await?;
				self.verify_remote(bucket, key, item).await
			}
			(ActionKind::Delete, None, Locator::Remote { bucket, key }) => {
				self.store.delete_object(bucket, key).await
			}
			(ActionKind::Delete, None, Locator::Local(path)) => match afs::remove_file(path).await {
				Ok(()) => Ok(()),
				Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
				Err(e) => Err(StoreError::Io(e)),
			},
			_ => Err(StoreError::Other(format!("Malformed action: {}", item.message))),
		}
	}

	/// Fetch into a temporary sibling, verify it, then rename into place
	///
	/// The temporary file is removed if anything fails or the future is
	/// dropped on cancellation; the existing destination stays untouched.
	async fn download(
		&self,
		bucket: &str,
		key: &str,
		path: &Path,
		item: &ActionItem,
	) -> StoreResult<()> {
		if let Some(parent) = path.parent() {
			afs::create_dir_all(parent).await?;
		}
		let partial = util::PartialFile::new(path);
		let mut file = afs::File::create(partial.path()).await?;
		self.store.get_object(bucket, key, &mut file).await?;
		file.flush().await?;
		drop(file);

		self.verify_local(partial.path(), &path.display().to_string(), item).await?;
		partial.commit().await?;
		Ok(())
	}

	async fn verify_remote(&self, bucket: &str, key: &str, item: &ActionItem) -> StoreResult<()> {
		if !self.should_verify(item) {
			return Ok(());
		}
		let location = format!("remote://{}/{}", bucket, key);
		let info = self
			.store
			.head_object(bucket, key)
			.await?
			.ok_or_else(|| StoreError::NoSuchKey { bucket: bucket.to_string(), key: key.to_string() })?;
		check_digest(&location, &item.content_digest, &util::strip_etag_quotes(&info.etag))
	}

	async fn verify_local(&self, file: &Path, location: &str, item: &ActionItem) -> StoreResult<()> {
		if !self.should_verify(item) {
			return Ok(());
		}
		let owned = file.to_path_buf();
		let actual = tokio::task::spawn_blocking(move || util::hash_file(&owned))
			.await
			.map_err(|e| StoreError::Other(format!("Hashing task failed: {}", e)))??;
		check_digest(location, &item.content_digest, &actual)
	}

	fn should_verify(&self, item: &ActionItem) -> bool {
		if !self.verify {
			return false;
		}
		if util::is_multipart_etag(&item.content_digest) {
			debug!("Skipping verification of {}: multipart entity tag", item.message);
			return false;
		}
		true
	}
}

fn check_digest(location: &str, expected: &str, actual: &str) -> StoreResult<()> {
	if expected != actual {
		return Err(StoreError::DigestMismatch {
			location: location.to_string(),
			expected: expected.to_string(),
			actual: actual.to_string(),
		});
	}
	Ok(())
}

/// Carries out an `ActionPlan` against an `ObjectStore`
pub struct Executor {
	worker: Worker,
	max_workers: usize,
}

impl Executor {
	pub fn new(store: Arc<dyn ObjectStore>) -> Self {
		Executor {
			worker: Worker {
				store,
				dry_run: false,
				acl: Acl::default(),
				verify: false,
				cancel: CancelToken::new(),
			},
			max_workers: DEFAULT_MAX_WORKERS,
		}
	}

	/// Upper bound of concurrent transfers per batch (at least 1)
	pub fn max_workers(mut self, max_workers: usize) -> Self {
		self.max_workers = max_workers.max(1);
		self
	}

	/// Report every item without calling the store
	pub fn dry_run(mut self, dry_run: bool) -> Self {
		self.worker.dry_run = dry_run;
		self
	}

	/// ACL applied to every written remote object
	pub fn acl(mut self, acl: Acl) -> Self {
		self.worker.acl = acl;
		self
	}

	/// Re-read the destination digest after each transfer
	pub fn verify(mut self, verify: bool) -> Self {
		self.worker.verify = verify;
		self
	}

	pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
		self.worker.cancel = cancel;
		self
	}

	/// Run the whole plan and report what happened to every item
	pub async fn execute(&self, plan: &ActionPlan) -> ExecutionReport {
		let mut report = ExecutionReport::new(self.worker.dry_run);
		if plan.is_empty() {
			info!("Nothing to do");
			return report;
		}

		let mut copies = Vec::new();
		let mut downloads = Vec::new();
		let mut uploads = Vec::new();
		let mut deletes = Vec::new();
		for (key, item) in plan {
			let job = (key.clone(), item.clone());
			match item.kind {
				ActionKind::Copy => copies.push(job),
				ActionKind::Download => downloads.push(job),
				ActionKind::Upload => uploads.push(job),
				ActionKind::Delete => deletes.push(job),
			}
		}

		self.run_batch(ActionKind::Copy, copies, &mut report).await;
		self.run_batch(ActionKind::Download, downloads, &mut report).await;
		self.run_batch(ActionKind::Upload, uploads, &mut report).await;
		self.run_deletes(deletes, &mut report).await;

		report
	}

	fn announce(&self, item: &ActionItem, report: &mut ExecutionReport) {
		if self.worker.dry_run {
			info!(dry_run = true, "{}", item.message);
		} else {
			info!("{}", item.message);
		}
		report.messages.push(item.message.clone());
	}

	async fn run_batch(&self, kind: ActionKind, jobs: Vec<Job>, report: &mut ExecutionReport) {
		if jobs.is_empty() {
			return;
		}
		let width = self.max_workers.min(jobs.len());
		info!("Starting {} batch: {} item(s), {} worker(s)", kind, jobs.len(), width);

		let (queue_tx, queue_rx) = mpsc::channel::<Job>(width);
		let queue_rx = Arc::new(Mutex::new(queue_rx));
		let (result_tx, mut result_rx) = mpsc::unbounded_channel::<ItemOutcome>();

		let mut handles = Vec::with_capacity(width);
		for id in 0..width {
			let worker = self.worker.clone();
			let queue_rx = Arc::clone(&queue_rx);
			let result_tx = result_tx.clone();
			handles.push(tokio::spawn(async move {
				loop {
					let next = queue_rx.lock().await.recv().await;
					let (key, item) = match next {
						Some(job) => job,
						None => break,
					};
					if result_tx.send(worker.run(key, item).await).is_err() {
						break;
					}
				}
				debug!("{} worker {} finished", kind, id);
			}));
		}
		drop(result_tx);

		let mut dispatched = 0usize;
		for (key, item) in jobs {
			if self.worker.cancel.is_cancelled() {
				report.record(ItemOutcome::failed(key, &item, StoreError::Cancelled));
				continue;
			}
			self.announce(&item, report);
			match queue_tx.send((key, item)).await {
				Ok(()) => dispatched += 1,
				Err(mpsc::error::SendError((key, item))) => {
					let e = StoreError::Other("no worker left to take the item".to_string());
					error!("{} failed: {}", item.message, e);
					report.record(ItemOutcome::failed(key, &item, e));
				}
			}
		}
		drop(queue_tx);

		let mut received = 0usize;
		while received < dispatched {
			match result_rx.recv().await {
				Some(outcome) => {
					received += 1;
					report.record(outcome);
				}
				None => break,
			}
		}

		for joined in join_all(handles).await {
			if let Err(e) = joined {
				error!("{} worker task failed: {}", kind, e);
			}
		}
		if received < dispatched {
			report.record_lost(kind, dispatched - received);
		}

		let summary = report.summary(kind);
		info!("Finished {} batch: {} ok, {} failed", kind, summary.succeeded, summary.failed);
	}

	async fn run_deletes(&self, jobs: Vec<Job>, report: &mut ExecutionReport) {
		if jobs.is_empty() {
			return;
		}
		info!("Starting delete batch: {} item(s)", jobs.len());

		for (key, item) in jobs {
			if self.worker.cancel.is_cancelled() {
				report.record(ItemOutcome::failed(key, &item, StoreError::Cancelled));
				continue;
			}
			self.announce(&item, report);
			let outcome = self.worker.run(key, item).await;
			report.record(outcome);
		}

		let summary = report.summary(ActionKind::Delete);
		info!("Finished delete batch: {} ok, {} failed", summary.succeeded, summary.failed);
	}
}

/// Execute `plan` with `max_workers` workers per batch
///
/// Fails with `SyncError::ExecutionFailed` when any item failed; every other
/// item has still been attempted.
pub async fn execute(
	plan: &ActionPlan,
	store: Arc<dyn ObjectStore>,
	max_workers: usize,
	dry_run: bool,
) -> Result<ExecutionReport, SyncError> {
	Executor::new(store).max_workers(max_workers).dry_run(dry_run).execute(plan).await.into_result()
}


// vim: ts=4
