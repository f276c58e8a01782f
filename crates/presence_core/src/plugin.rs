//! Process lifecycle hooks the host calls into.

use tracing::info;

use crate::service::PresenceService;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PluginInfo {
    pub name: &'static str,
    pub hotkey: &'static str,
    pub comment: &'static str,
    pub help: &'static str,
    pub version: &'static str,
}

pub const PLUGIN_INFO: PluginInfo = PluginInfo {
    name: "Discord RPC for IDA",
    hotkey: "Ctrl-Alt-D",
    comment: "Display IDA status in Discord",
    help: "This plugin updates your Discord status with IDA information",
    version: "1.0",
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PluginDisposition {
    KeepResident,
}

pub struct PresencePlugin {
    service: PresenceService,
}

impl PresencePlugin {
    pub fn new(service: PresenceService) -> Self {
        Self { service }
    }

    pub fn init(&mut self) -> PluginDisposition {
        if self.service.controller().settings().autostart {
            self.service.controller_mut().start();
        } else {
            info!(hotkey = PLUGIN_INFO.hotkey, "autostart disabled; waiting for toggle");
        }
        PluginDisposition::KeepResident
    }

    /// Hotkey entry point.
    pub fn run(&mut self) {
        self.service.controller_mut().toggle();
    }

    pub fn term(&mut self) {
        self.service.controller_mut().stop();
    }

    pub fn service(&self) -> &PresenceService {
        &self.service
    }

    pub fn into_service(self) -> PresenceService {
        self.service
    }
}

#[cfg(test)]
#[path = "tests/plugin_tests.rs"]
mod tests;
