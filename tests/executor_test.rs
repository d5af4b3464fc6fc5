/// Executor and pipeline tests against the in-memory store
///
/// Uses `MemoryStore` fault injection to check that one failing item never
/// stops its siblings, and pagination limits to check that listings are
/// exhausted.
use std::collections::HashSet;
use std::sync::Arc;

use bucketsync::diff::diff;
use bucketsync::endpoint::resolve;
use bucketsync::executor::{self, Executor, KindSummary};
use bucketsync::lister::{Lister, RemoteLister};
use bucketsync::mirror::MirrorBuilder;
use bucketsync::planner::plan;
use bucketsync::store::MemoryStore;
use bucketsync::{ActionKind, SyncError};

/// Helper to fill a bucket with `count` objects under `prefix`
fn fill(store: &MemoryStore, bucket: &str, prefix: &str, count: usize) {
	for i in 0..count {
		store.insert(bucket, &format!("{}/file-{:03}.bin", prefix, i), format!("data {}", i).as_bytes());
	}
}

async fn copy_plan(store: &Arc<MemoryStore>) -> bucketsync::ActionPlan {
	let source = resolve("remote://src/p").unwrap();
	let destination = resolve("remote://dst/p").unwrap();
	let lister = RemoteLister::new(store.clone());
	let result = diff(&lister.list(&source).await.unwrap(), &lister.list(&destination).await.unwrap());
	plan(&result, &source, &destination, true).unwrap()
}

// ===================================================================
// FAILURE ISOLATION
// ===================================================================

#[tokio::test]
async fn test_failing_item_does_not_stop_siblings() {
	let store = Arc::new(MemoryStore::new());
	fill(&store, "src", "p", 10);
	store.create_bucket("dst");
	store.fail_key("p/file-004.bin");

	let actions = copy_plan(&store).await;
	assert_eq!(actions.len(), 10);

	let report = Executor::new(store.clone()).max_workers(3).execute(&actions).await;
	assert_eq!(report.summary(ActionKind::Copy), KindSummary { succeeded: 9, failed: 1 });
	assert_eq!(report.failures.len(), 1);
	assert_eq!(report.failures[0].key, "file-004.bin");
	assert_eq!(store.keys("dst").len(), 9);

	match report.into_result() {
		Err(SyncError::ExecutionFailed { failed, summary }) => {
			assert_eq!(failed, 1);
			assert_eq!(summary, "copy: 9 ok, 1 failed");
		}
		other => panic!("expected ExecutionFailed, got {:?}", other.map(|r| r.summary_line())),
	}
}

#[tokio::test]
async fn test_failing_delete_does_not_stop_other_deletes() {
	let store = Arc::new(MemoryStore::new());
	store.create_bucket("src");
	fill(&store, "dst", "p", 4);
	store.fail_key("p/file-001.bin");

	let actions = copy_plan(&store).await;
	let report = Executor::new(store.clone()).execute(&actions).await;
	assert_eq!(report.summary(ActionKind::Delete), KindSummary { succeeded: 3, failed: 1 });
	assert_eq!(store.keys("dst"), vec!["p/file-001.bin".to_string()]);
}

#[tokio::test]
async fn test_mirror_reports_execution_failure() {
	let store = Arc::new(MemoryStore::new());
	fill(&store, "src", "p", 3);
	store.create_bucket("dst");
	store.fail_key("q/file-002.bin");

	let result = MirrorBuilder::new()
		.source("remote://src/p")
		.destination("remote://dst/q")
		.store(store.clone())
		.run()
		.await;
	assert!(matches!(result, Err(SyncError::ExecutionFailed { failed: 1, .. })));
	assert_eq!(store.keys("dst").len(), 2);
}

// ===================================================================
// CONCURRENCY & DRY RUN
// ===================================================================

#[tokio::test]
async fn test_worker_count_does_not_change_outcome() {
	for workers in [1usize, 2, 7, 64].iter() {
		let store = Arc::new(MemoryStore::new());
		fill(&store, "src", "p", 20);
		store.create_bucket("dst");

		let actions = copy_plan(&store).await;
		let report = executor::execute(&actions, store.clone(), *workers, false).await.unwrap();
		assert_eq!(report.succeeded(), 20, "workers = {}", workers);

		let copied: HashSet<String> = store.keys("dst").into_iter().collect();
		let expected: HashSet<String> =
			(0..20).map(|i| format!("p/file-{:03}.bin", i)).collect();
		assert_eq!(copied, expected);
	}
}

#[tokio::test]
async fn test_dry_run_makes_no_store_calls() {
	let store = Arc::new(MemoryStore::new());
	fill(&store, "src", "p", 5);
	store.create_bucket("dst");

	let actions = copy_plan(&store).await;
	let calls = store.call_count();
	let dry = executor::execute(&actions, store.clone(), 4, true).await.unwrap();
	assert_eq!(store.call_count(), calls);
	assert!(store.keys("dst").is_empty());

	let live = executor::execute(&actions, store.clone(), 4, false).await.unwrap();
	assert_eq!(dry.messages, live.messages);
	assert_eq!(store.keys("dst").len(), 5);
}

// ===================================================================
// PAGINATION & CHANGE DETECTION
// ===================================================================

#[tokio::test]
async fn test_listing_exhausts_pagination() {
	let store = Arc::new(MemoryStore::new().with_page_size(3));
	fill(&store, "src", "p", 10);

	let entries = RemoteLister::new(store.clone()).list(&resolve("remote://src/p").unwrap()).await.unwrap();
	assert_eq!(entries.len(), 10);
	assert!(entries.contains_key("file-009.bin"));
}

#[tokio::test]
async fn test_multipart_etag_always_retransfers() {
	let store = Arc::new(MemoryStore::new());
	store.insert("src", "p/big.bin", b"big");
	store.insert("dst", "p/big.bin", b"big");
	store.set_etag("src", "p/big.bin", "\"9b2cf535f27731c974343645a3985328-3\"");

	let actions = copy_plan(&store).await;
	assert_eq!(actions.len(), 1);
	assert_eq!(actions["big.bin"].kind, ActionKind::Copy);
}

// vim: ts=4
