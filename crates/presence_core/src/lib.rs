//! Mirrors a reverse-engineering session's focus into a presence service.

pub mod clock;
pub mod config;
pub mod controller;
pub mod events;
pub mod host;
pub mod plugin;
pub mod service;
pub mod timer;

pub use clock::{Clock, SystemClock};
pub use config::{load_settings, load_settings_from, PresenceSettings};
pub use controller::{PresenceController, SessionSnapshot};
pub use events::{ControllerEvent, SessionId, UpdateOutcome};
pub use host::{FocusListener, Host, HookHandle, HostEventSource, HostIntrospection};
pub use plugin::{PluginDisposition, PluginInfo, PresencePlugin, PLUGIN_INFO};
pub use service::{PresenceService, ServiceHandle};
pub use timer::{TimerCallback, TimerFacility, TimerHandle, TokioTimers};

#[cfg(test)]
#[path = "tests/support.rs"]
pub(crate) mod test_support;
