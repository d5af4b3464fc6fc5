//! # bucketsync - One-shot mirror between a directory and object storage
//!
//! bucketsync lists a source and a destination, works out which entries are
//! new, changed or gone by comparing content digests, and then copies,
//! uploads, downloads or deletes exactly those entries. Either side can be a
//! local directory or a bucket prefix; local to local is not supported.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use bucketsync::mirror::MirrorBuilder;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let report = MirrorBuilder::new()
//!         .source("./photos")
//!         .destination("remote://media/photos")
//!         .store_root("/srv/buckets")
//!         .run()
//!         .await?;
//!     println!("{}", report.summary_line());
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! `endpoint::resolve` → `lister` → `diff::diff` → `planner::plan` →
//! `executor::Executor`. Each stage only consumes what the previous one
//! produced; storage access goes through the `store::ObjectStore` trait.

pub mod acl;
pub mod config;
pub mod diff;
pub mod endpoint;
pub mod error;
pub mod executor;
pub mod lister;
pub mod logging;
pub mod mirror;
pub mod planner;
pub mod store;
pub mod types;
pub mod util;
pub mod utils;
pub mod validation;

// Re-export commonly used types and functions
pub use acl::Acl;
pub use config::Config;
pub use endpoint::{Endpoint, EndpointKind};
pub use error::{StoreError, SyncError};
pub use executor::{ExecutionReport, Executor};
pub use mirror::MirrorBuilder;
pub use store::{FsObjectStore, MemoryStore, ObjectStore};
pub use types::{ActionItem, ActionKind, ActionPlan, Entry, EntrySet, Locator};

// vim: ts=4
