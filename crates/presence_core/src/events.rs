//! Events delivered to the controller on the dispatch loop, and what each one led to.

use shared::domain::FocusChange;

use crate::timer::TimerHandle;

/// Identifies one connection lifetime; timers scheduled under an older id are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SessionId(pub u64);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ControllerEvent {
    FocusChanged(FocusChange),
    DelayedSendDue { session: SessionId },
    Toggle,
    Shutdown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// Not connected, or the event belonged to an earlier session.
    Inactive,
    Unchanged,
    Sent,
    SendFailed,
    Deferred(TimerHandle),
    AlreadyPending,
}

impl UpdateOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Inactive => "inactive",
            Self::Unchanged => "unchanged",
            Self::Sent => "sent",
            Self::SendFailed => "send_failed",
            Self::Deferred(_) => "deferred",
            Self::AlreadyPending => "already_pending",
        }
    }
}
