use discord_rich_presence::{activity, DiscordIpc, DiscordIpcClient};
use shared::{domain::PresencePayload, error::PresenceError};
use tracing::{debug, info};

use crate::{PresenceConnector, PresenceSession};

/// Talks to the desktop Discord client over its local IPC socket.
#[derive(Debug, Default, Clone, Copy)]
pub struct DiscordIpcConnector;

impl PresenceConnector for DiscordIpcConnector {
    fn connect(&self, client_id: &str) -> Result<Box<dyn PresenceSession>, PresenceError> {
        let mut client = DiscordIpcClient::new(client_id)
            .map_err(|err| PresenceError::connect(err.to_string()))?;
        client
            .connect()
            .map_err(|err| PresenceError::connect(err.to_string()))?;
        info!(client_id, "connected to discord ipc");
        Ok(Box::new(DiscordIpcSession { client }))
    }
}

struct DiscordIpcSession {
    client: DiscordIpcClient,
}

impl PresenceSession for DiscordIpcSession {
    fn update(&mut self, payload: &PresencePayload) -> Result<(), PresenceError> {
        let assets = activity::Assets::new()
            .large_image(&payload.large_image)
            .large_text(&payload.large_text);
        let activity = activity::Activity::new()
            .details(&payload.details)
            .state(&payload.state)
            .assets(assets)
            .timestamps(activity::Timestamps::new().start(payload.start));

        self.client
            .set_activity(activity)
            .map_err(|err| PresenceError::update(err.to_string()))?;
        debug!(state = %payload.state, "discord activity set");
        Ok(())
    }

    fn close(&mut self) -> Result<(), PresenceError> {
        self.client
            .close()
            .map_err(|err| PresenceError::close(err.to_string()))
    }
}
