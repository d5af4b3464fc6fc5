//! Cooperative cancellation and signal handling

use tokio::sync::watch;
use tracing::{debug, warn};

/// Cloneable cancellation flag observed by every worker
///
/// Once cancelled it stays cancelled.
#[derive(Clone, Debug)]
pub struct CancelToken {
	sender: std::sync::Arc<watch::Sender<bool>>,
	receiver: watch::Receiver<bool>,
}

impl CancelToken {
	pub fn new() -> Self {
		let (sender, receiver) = watch::channel(false);
		CancelToken { sender: std::sync::Arc::new(sender), receiver }
	}

	pub fn cancel(&self) {
		let _ = self.sender.send(true);
	}

	pub fn is_cancelled(&self) -> bool {
		*self.receiver.borrow()
	}

	/// Resolves once `cancel` has been called
	pub async fn cancelled(&self) {
		let mut receiver = self.receiver.clone();
		while !*receiver.borrow() {
			if receiver.changed().await.is_err() {
				// Sender gone without cancelling: never resolves
				std::future::pending::<()>().await;
			}
		}
	}
}

impl Default for CancelToken {
	fn default() -> Self {
		Self::new()
	}
}

/// Cancel `token` on Ctrl-C, or on SIGTERM on unix
///
/// Workers finish or abandon their current item; the run then reports
/// what completed before stopping.
pub fn setup_signal_handlers(token: CancelToken) {
	tokio::spawn(async move {
		#[cfg(unix)]
		{
			use tokio::signal::unix::{signal, SignalKind};

			let mut sigterm = match signal(SignalKind::terminate()) {
				Ok(stream) => stream,
				Err(e) => {
					warn!("Failed to setup SIGTERM handler: {}. Process will not handle SIGTERM gracefully.", e);
					if tokio::signal::ctrl_c().await.is_ok() {
						debug!("Received SIGINT, cancelling...");
						token.cancel();
					}
					return;
				}
			};

			tokio::select! {
				_ = sigterm.recv() => debug!("Received SIGTERM, cancelling..."),
				_ = tokio::signal::ctrl_c() => debug!("Received SIGINT, cancelling..."),
			}
			token.cancel();
		}

		#[cfg(not(unix))]
		{
			match tokio::signal::ctrl_c().await {
				Ok(()) => {
					debug!("Received Ctrl-C, cancelling...");
					token.cancel();
				}
				Err(e) => warn!("Failed to setup Ctrl-C handler: {}", e),
			}
		}
	});
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::time::Duration;

	#[tokio::test]
	async fn test_cancel_is_observed_by_clones() {
		let token = CancelToken::new();
		let clone = token.clone();
		assert!(!clone.is_cancelled());

		let waiter = tokio::spawn(async move { clone.cancelled().await });
		token.cancel();
		tokio::time::timeout(Duration::from_secs(5), waiter).await.unwrap().unwrap();
		assert!(token.is_cancelled());
	}

	#[tokio::test]
	async fn test_cancelled_resolves_immediately_when_already_cancelled() {
		let token = CancelToken::new();
		token.cancel();
		tokio::time::timeout(Duration::from_secs(5), token.cancelled()).await.unwrap();
	}
}

// vim: ts=4
