//! Cancellable periodic task backing the DLNA position poller.
//!
//! A [`PollerHandle`] owns the cancellation token of one running timer task.
//! The controller keeps at most one handle on the active session; replacing
//! or dropping it cancels the timer, so a second live timer cannot exist.
//!
//! The timer fires at a fixed period starting one period after spawn. A tick
//! that is still running when the period elapses delays the next tick rather
//! than bursting. Tick failures are the tick's own business: the task only
//! ends on cancellation or when a tick returns [`ControlFlow::Break`].
//! Cancellation itself is enforced by the [`TaskSpawner`] running the task.

use std::future::Future;
use std::ops::ControlFlow;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::runtime::TaskSpawner;

static NEXT_POLLER_ID: AtomicU64 = AtomicU64::new(1);

/// Handle to a running periodic task. Dropping it stops the task.
#[derive(Debug)]
pub struct PollerHandle {
    id: u64,
    cancel: CancellationToken,
}

impl PollerHandle {
    /// Spawns a task on `spawner` invoking `tick` every `period` until
    /// cancelled.
    ///
    /// `tick` receives the poller's id so it can recognise itself on the
    /// session it polls for.
    pub fn spawn<F, Fut>(spawner: &dyn TaskSpawner, period: Duration, mut tick: F) -> Self
    where
        F: FnMut(u64) -> Fut + Send + 'static,
        Fut: Future<Output = ControlFlow<()>> + Send + 'static,
    {
        let id = NEXT_POLLER_ID.fetch_add(1, Ordering::Relaxed);
        let cancel = CancellationToken::new();
        let token = cancel.clone();

        let task = async move {
            let mut timer = interval(period);
            timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // The first tick of an interval completes immediately.
            timer.tick().await;

            log::debug!("[PositionPoller] #{} started ({:?} period)", id, period);

            loop {
                timer.tick().await;
                if tick(id).await.is_break() {
                    break;
                }
            }

            log::debug!("[PositionPoller] #{} finished", id);
            token.cancel();
        };
        spawner.spawn_cancellable(cancel.clone(), Box::pin(task));

        Self { id, cancel }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    /// Stops the task. Idempotent.
    pub fn stop(&self) {
        if !self.cancel.is_cancelled() {
            log::debug!("[PositionPoller] #{} cancelled", self.id);
        }
        self.cancel.cancel();
    }

    /// Whether the task is still scheduled to tick.
    pub fn is_active(&self) -> bool {
        !self.cancel.is_cancelled()
    }
}

impl Drop for PollerHandle {
    fn drop(&mut self) {
        self.stop();
    }
}
