//! Logging prelude module for convenient access to tracing macros.
//!
//! # Usage
//!
//! ```ignore
//! use crate::logging::*;
//!
//! info!("upload: /data/photos/a.jpg to remote://media/photos/a.jpg");
//! warn!("This is a warning");
//! ```

#[allow(unused_imports)]
pub use tracing::{debug, error, info, warn};

/// Initialize the tracing subscriber with environment filter support.
///
/// `RUST_LOG` wins when set; otherwise `default_level` is used:
///
/// ```bash
/// RUST_LOG=debug bucketsync -s ./photos -d remote://media/photos
/// RUST_LOG=bucketsync::executor=trace bucketsync ...
/// ```
pub fn init_tracing(default_level: &str) {
	let filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
	// A second init (tests, embedding) keeps the first subscriber
	let _ = tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).try_init();
}

// vim: ts=4
