//! Single-consumer dispatch loop standing in for the host's UI thread.

use std::sync::Arc;

use presence_client::PresenceConnector;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, trace};

use crate::{
    clock::Clock,
    config::PresenceSettings,
    controller::PresenceController,
    events::ControllerEvent,
    host::Host,
    timer::TimerFacility,
};

/// Cloneable entry point for commands that originate outside the dispatch loop.
#[derive(Clone)]
pub struct ServiceHandle {
    sender: UnboundedSender<ControllerEvent>,
}

impl ServiceHandle {
    /// The hotkey action.
    pub fn toggle(&self) -> bool {
        self.sender.send(ControllerEvent::Toggle).is_ok()
    }

    pub fn shutdown(&self) -> bool {
        self.sender.send(ControllerEvent::Shutdown).is_ok()
    }
}

pub struct PresenceService {
    controller: PresenceController,
    inbox: UnboundedReceiver<ControllerEvent>,
    sender: UnboundedSender<ControllerEvent>,
}

impl PresenceService {
    pub fn new(
        settings: PresenceSettings,
        connector: Arc<dyn PresenceConnector>,
        host: Arc<dyn Host>,
        timers: Arc<dyn TimerFacility>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let (sender, inbox) = mpsc::unbounded_channel();
        let controller =
            PresenceController::new(settings, connector, host, timers, clock, sender.clone());
        Self {
            controller,
            inbox,
            sender,
        }
    }

    pub fn handle(&self) -> ServiceHandle {
        ServiceHandle {
            sender: self.sender.clone(),
        }
    }

    pub fn controller(&self) -> &PresenceController {
        &self.controller
    }

    pub fn controller_mut(&mut self) -> &mut PresenceController {
        &mut self.controller
    }

    /// Dispatches the events that are already queued, stopping early at a shutdown.
    /// Returns the number of events dispatched.
    pub fn pump(&mut self) -> usize {
        let mut dispatched = 0;
        while let Ok(event) = self.inbox.try_recv() {
            dispatched += 1;
            if !self.dispatch(event) {
                break;
            }
        }
        dispatched
    }

    pub async fn run(mut self) {
        while let Some(event) = self.inbox.recv().await {
            if !self.dispatch(event) {
                break;
            }
        }
        self.controller.stop();
    }

    fn dispatch(&mut self, event: ControllerEvent) -> bool {
        match event {
            ControllerEvent::FocusChanged(change) => {
                let outcome = self.controller.on_focus_changed(change);
                trace!(
                    address = %change.address,
                    outcome = outcome.as_str(),
                    "focus change handled"
                );
            }
            ControllerEvent::DelayedSendDue { session } => {
                let outcome = self.controller.on_delayed_send(session);
                trace!(session = session.0, outcome = outcome.as_str(), "delayed send handled");
            }
            ControllerEvent::Toggle => self.controller.toggle(),
            ControllerEvent::Shutdown => {
                debug!("presence service shutting down");
                self.controller.stop();
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
#[path = "tests/service_tests.rs"]
mod tests;
