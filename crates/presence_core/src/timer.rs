use std::{
    sync::atomic::{AtomicU64, Ordering},
    time::Duration,
};

use tracing::trace;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerHandle(pub u64);

pub type TimerCallback = Box<dyn FnOnce() + Send + 'static>;

/// One-shot delayed callbacks. A callback runs at most once and is never re-armed.
pub trait TimerFacility: Send + Sync {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle;
}

/// Spawns a sleeping task per timer; must be used from within a tokio runtime.
#[derive(Debug, Default)]
pub struct TokioTimers {
    next_id: AtomicU64,
}

impl TokioTimers {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimerFacility for TokioTimers {
    fn schedule(&self, delay: Duration, callback: TimerCallback) -> TimerHandle {
        let handle = TimerHandle(self.next_id.fetch_add(1, Ordering::Relaxed) + 1);
        tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            trace!(timer = handle.0, "timer fired");
            callback();
        });
        handle
    }
}
