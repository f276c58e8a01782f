//! Connection lifecycle, deduplication and throttling of presence updates.
//!
//! The controller is only ever driven from one dispatch loop, so session state is
//! plain owned data mutated through `&mut self`.

use std::{sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use presence_client::{PresenceConnector, PresenceSession};
use shared::domain::{Address, FocusChange, PresencePayload, StatusSummary};
use tokio::sync::mpsc::UnboundedSender;
use tracing::{debug, error, info, warn};

use crate::{
    clock::Clock,
    config::PresenceSettings,
    events::{ControllerEvent, SessionId, UpdateOutcome},
    host::{self, FocusListener, HookHandle, Host},
    plugin::PLUGIN_INFO,
    timer::{TimerFacility, TimerHandle},
};

/// Forwards host focus notifications into the controller's inbox.
struct InboxListener {
    inbox: UnboundedSender<ControllerEvent>,
}

impl FocusListener for InboxListener {
    fn screen_address_changed(&self, change: FocusChange) {
        if self.inbox.send(ControllerEvent::FocusChanged(change)).is_err() {
            debug!(address = %change.address, "controller inbox closed; dropping focus change");
        }
    }
}

struct ActiveSession {
    id: SessionId,
    client: Box<dyn PresenceSession>,
    hook: HookHandle,
    started_at: DateTime<Utc>,
    last_summary: Option<StatusSummary>,
    last_sent_at: Option<DateTime<Utc>>,
    pending_delayed_send: Option<TimerHandle>,
}

impl ActiveSession {
    fn send(
        &mut self,
        settings: &PresenceSettings,
        summary: StatusSummary,
        now: DateTime<Utc>,
    ) -> UpdateOutcome {
        let payload = PresencePayload::for_summary(
            &summary,
            &settings.large_image,
            &settings.large_text,
            self.started_at.timestamp(),
        );

        match self.client.update(&payload) {
            Ok(()) => {
                info!(
                    file = %summary.binary_file_name,
                    function = %summary.function_label,
                    "updated presence"
                );
                self.last_summary = Some(summary);
                self.last_sent_at = Some(now);
                UpdateOutcome::Sent
            }
            Err(err) => {
                error!(
                    session = self.id.0,
                    function = %summary.function_label,
                    error = %err,
                    "error updating presence"
                );
                UpdateOutcome::SendFailed
            }
        }
    }
}

enum ConnectionState {
    Disconnected,
    Connected(ActiveSession),
}

/// Read-only view of the current connection's bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionSnapshot {
    pub id: SessionId,
    pub started_at: DateTime<Utc>,
    pub last_summary: Option<StatusSummary>,
    pub last_sent_at: Option<DateTime<Utc>>,
    pub pending_delayed_send: bool,
}

pub struct PresenceController {
    settings: PresenceSettings,
    connector: Arc<dyn PresenceConnector>,
    host: Arc<dyn Host>,
    timers: Arc<dyn TimerFacility>,
    clock: Arc<dyn Clock>,
    inbox: UnboundedSender<ControllerEvent>,
    state: ConnectionState,
    sessions_started: u64,
}

impl PresenceController {
    pub fn new(
        settings: PresenceSettings,
        connector: Arc<dyn PresenceConnector>,
        host: Arc<dyn Host>,
        timers: Arc<dyn TimerFacility>,
        clock: Arc<dyn Clock>,
        inbox: UnboundedSender<ControllerEvent>,
    ) -> Self {
        Self {
            settings,
            connector,
            host,
            timers,
            clock,
            inbox,
            state: ConnectionState::Disconnected,
            sessions_started: 0,
        }
    }

    pub fn settings(&self) -> &PresenceSettings {
        &self.settings
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected(_))
    }

    pub fn session(&self) -> Option<SessionSnapshot> {
        let ConnectionState::Connected(session) = &self.state else {
            return None;
        };
        Some(SessionSnapshot {
            id: session.id,
            started_at: session.started_at,
            last_summary: session.last_summary.clone(),
            last_sent_at: session.last_sent_at,
            pending_delayed_send: session.pending_delayed_send.is_some(),
        })
    }

    /// Connects, hooks focus changes and publishes the initial presence.
    ///
    /// Returns `false` when already connected or when the presence service is unreachable;
    /// connection failures are logged and leave the controller disconnected.
    pub fn start(&mut self) -> bool {
        if self.is_connected() {
            debug!("presence already running");
            return false;
        }

        let client = match self.connector.connect(&self.settings.client_id) {
            Ok(client) => client,
            Err(err) => {
                error!(plugin = PLUGIN_INFO.name, error = %err, "error starting presence");
                return false;
            }
        };

        self.sessions_started += 1;
        let id = SessionId(self.sessions_started);
        let started_at = self.clock.now();
        let listener = Arc::new(InboxListener {
            inbox: self.inbox.clone(),
        });
        let hook = self.host.hook_focus(listener);

        self.state = ConnectionState::Connected(ActiveSession {
            id,
            client,
            hook,
            started_at,
            last_summary: None,
            last_sent_at: None,
            pending_delayed_send: None,
        });
        info!(plugin = PLUGIN_INFO.name, session = id.0, "presence started");

        let address = self.host.screen_address();
        self.request_update(address, true);
        true
    }

    /// Unhooks and closes the connection. A pending delayed send is left to expire;
    /// it is discarded when it fires.
    pub fn stop(&mut self) -> bool {
        let ConnectionState::Connected(mut session) =
            std::mem::replace(&mut self.state, ConnectionState::Disconnected)
        else {
            debug!("presence not running");
            return false;
        };

        self.host.unhook_focus(session.hook);
        if let Err(err) = session.client.close() {
            warn!(session = session.id.0, error = %err, "error closing presence connection");
        }
        if session.pending_delayed_send.is_some() {
            debug!(session = session.id.0, "delayed send still armed; it will be dropped");
        }
        info!(plugin = PLUGIN_INFO.name, session = session.id.0, "presence stopped");
        true
    }

    pub fn toggle(&mut self) {
        if self.is_connected() {
            self.stop();
        } else {
            self.start();
        }
    }

    pub fn on_focus_changed(&mut self, change: FocusChange) -> UpdateOutcome {
        self.request_update(Some(change.address), false)
    }

    /// Timer callback target. Re-resolves the cursor at fire time rather than using the
    /// summary that caused the timer to be armed.
    pub fn on_delayed_send(&mut self, id: SessionId) -> UpdateOutcome {
        let ConnectionState::Connected(session) = &mut self.state else {
            debug!(session = id.0, "delayed send fired after disconnect");
            return UpdateOutcome::Inactive;
        };
        if session.id != id {
            debug!(
                session = id.0,
                current = session.id.0,
                "delayed send from an earlier session ignored"
            );
            return UpdateOutcome::Inactive;
        }
        session.pending_delayed_send = None;

        let address = self.host.screen_address();
        self.request_update(address, true)
    }

    // `force` skips the throttle and the pending-timer check; an unchanged function label
    // is never resent.
    fn request_update(&mut self, address: Option<Address>, force: bool) -> UpdateOutcome {
        let ConnectionState::Connected(session) = &mut self.state else {
            return UpdateOutcome::Inactive;
        };

        let summary =
            host::resolve_summary(&*self.host, address, &self.settings.no_function_label);
        if session
            .last_summary
            .as_ref()
            .is_some_and(|last| last.same_function(&summary))
        {
            debug!(function = %summary.function_label, "presence unchanged");
            return UpdateOutcome::Unchanged;
        }

        // An armed timer owns the next send; it re-reads the cursor when it fires.
        if !force {
            if let Some(pending) = session.pending_delayed_send {
                debug!(timer = pending.0, "delayed send already pending");
                return UpdateOutcome::AlreadyPending;
            }
        }

        let now = self.clock.now();
        let throttle = self.settings.throttle_interval();
        if force || throttle_elapsed(session.last_sent_at, now, throttle) {
            return session.send(&self.settings, summary, now);
        }

        let inbox = self.inbox.clone();
        let session_id = session.id;
        let handle = self.timers.schedule(
            throttle,
            Box::new(move || {
                let _ = inbox.send(ControllerEvent::DelayedSendDue {
                    session: session_id,
                });
            }),
        );
        session.pending_delayed_send = Some(handle);
        debug!(
            timer = handle.0,
            delay_secs = throttle.as_secs(),
            function = %summary.function_label,
            "presence update throttled"
        );
        UpdateOutcome::Deferred(handle)
    }
}

fn throttle_elapsed(
    last_sent_at: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
    throttle: Duration,
) -> bool {
    let Some(last_sent_at) = last_sent_at else {
        return true;
    };
    (now - last_sent_at)
        .to_std()
        .map(|elapsed| elapsed >= throttle)
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "tests/controller_tests.rs"]
mod tests;
