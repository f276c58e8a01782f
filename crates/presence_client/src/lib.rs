use shared::{domain::PresencePayload, error::PresenceError};

mod discord;
mod log_only;

pub use discord::DiscordIpcConnector;
pub use log_only::LogOnlyConnector;

/// An open connection to a local presence service.
pub trait PresenceSession: Send {
    fn update(&mut self, payload: &PresencePayload) -> Result<(), PresenceError>;
    fn close(&mut self) -> Result<(), PresenceError>;
}

/// Opens presence sessions for an application id.
pub trait PresenceConnector: Send + Sync {
    fn connect(&self, client_id: &str) -> Result<Box<dyn PresenceSession>, PresenceError>;
}

#[cfg(test)]
#[path = "tests/lib_tests.rs"]
mod tests;
