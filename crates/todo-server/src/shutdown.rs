//! Graceful shutdown
//!
//! Once [`ShutdownCoordinator::shutdown`] is called the server stops
//! accepting connections, asks open connections to finish their current
//! request, and waits at most [`ShutdownCoordinator::timeout`] for them.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Shared shutdown flag for the accept loop and every connection task
#[derive(Clone, Debug)]
pub struct ShutdownCoordinator {
	sender: Arc<watch::Sender<bool>>,
	timeout: Duration,
}

impl ShutdownCoordinator {
	/// Create a coordinator that waits up to `timeout` for open connections
	///
	/// # Examples
	///
	/// ```
	/// use std::time::Duration;
	/// use todo_server::ShutdownCoordinator;
	///
	/// let coordinator = ShutdownCoordinator::new(Duration::from_secs(30));
	/// assert!(!coordinator.is_shutting_down());
	///
	/// coordinator.shutdown();
	/// assert!(coordinator.is_shutting_down());
	/// ```
	pub fn new(timeout: Duration) -> Self {
		let (sender, _) = watch::channel(false);
		Self {
			sender: Arc::new(sender),
			timeout,
		}
	}

	pub fn timeout(&self) -> Duration {
		self.timeout
	}

	/// Trigger shutdown; later calls are no-ops
	pub fn shutdown(&self) {
		if !self.sender.send_replace(true) {
			tracing::info!(timeout_secs = self.timeout.as_secs(), "Shutdown requested");
		}
	}

	pub fn is_shutting_down(&self) -> bool {
		*self.sender.borrow()
	}

	/// Resolves once shutdown has been triggered, including before the call
	pub async fn wait(&self) {
		let mut receiver = self.sender.subscribe();
		// The sender lives as long as `self`, so this cannot fail.
		let _ = receiver.wait_for(|stopping| *stopping).await;
	}
}

/// Resolves on Ctrl-C
///
/// A failure to install the handler is logged and the future never resolves,
/// leaving shutdown to [`ShutdownCoordinator::shutdown`].
pub async fn shutdown_signal() {
	if let Err(err) = tokio::signal::ctrl_c().await {
		tracing::error!(error = %err, "Failed to listen for Ctrl-C");
		std::future::pending::<()>().await;
	}
	tracing::info!("Received Ctrl-C, shutting down gracefully");
}
