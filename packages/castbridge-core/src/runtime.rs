//! Where the controller's background work runs.
//!
//! The only background task is the DLNA position poller. It is handed to a
//! [`TaskSpawner`] together with its cancellation token, so a host that owns
//! its own runtime (a desktop shell, a test harness) decides where it runs
//! while the controller keeps control over when it stops.

use std::future::Future;
use std::pin::Pin;

use tokio_util::sync::CancellationToken;

/// A boxed background task.
pub type BackgroundTask = Pin<Box<dyn Future<Output = ()> + Send + 'static>>;

/// Runs cancellable background tasks.
pub trait TaskSpawner: Send + Sync {
    /// Runs `task` until it completes or `cancel` fires, whichever is first.
    ///
    /// A cancelled task is dropped at its current await point.
    fn spawn_cancellable(&self, cancel: CancellationToken, task: BackgroundTask);
}

/// Spawner backed by a Tokio runtime handle.
#[derive(Clone)]
pub struct TokioSpawner {
    handle: tokio::runtime::Handle,
}

impl TokioSpawner {
    #[must_use]
    pub fn new(handle: tokio::runtime::Handle) -> Self {
        Self { handle }
    }

    /// Uses the runtime the caller is running on.
    ///
    /// # Panics
    ///
    /// Panics outside of a Tokio runtime context.
    #[must_use]
    pub fn current() -> Self {
        Self::new(tokio::runtime::Handle::current())
    }
}

impl TaskSpawner for TokioSpawner {
    fn spawn_cancellable(&self, cancel: CancellationToken, task: BackgroundTask) {
        self.handle.spawn(async move {
            tokio::select! {
                _ = cancel.cancelled() => {}
                _ = task => {}
            }
        });
    }
}
