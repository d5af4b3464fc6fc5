//! Utility modules for common functionality

pub mod cancel;

pub use cancel::{setup_signal_handlers, CancelToken};

// vim: ts=4
