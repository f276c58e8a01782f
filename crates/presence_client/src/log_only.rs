use shared::{domain::PresencePayload, error::PresenceError};
use tracing::info;

use crate::{PresenceConnector, PresenceSession};

/// Dry-run backend: every update becomes a log line instead of an IPC call.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogOnlyConnector;

impl PresenceConnector for LogOnlyConnector {
    fn connect(&self, client_id: &str) -> Result<Box<dyn PresenceSession>, PresenceError> {
        info!(client_id, "dry-run presence session opened");
        Ok(Box::new(LogOnlySession {
            client_id: client_id.to_string(),
            updates: 0,
        }))
    }
}

struct LogOnlySession {
    client_id: String,
    updates: u64,
}

impl PresenceSession for LogOnlySession {
    fn update(&mut self, payload: &PresencePayload) -> Result<(), PresenceError> {
        let rendered =
            serde_json::to_string(payload).map_err(|err| PresenceError::update(err.to_string()))?;
        self.updates += 1;
        info!(
            client_id = %self.client_id,
            sequence = self.updates,
            payload = %rendered,
            "dry-run presence update"
        );
        Ok(())
    }

    fn close(&mut self) -> Result<(), PresenceError> {
        info!(
            client_id = %self.client_id,
            updates = self.updates,
            "dry-run presence session closed"
        );
        Ok(())
    }
}
