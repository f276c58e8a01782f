use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PresenceErrorKind {
    Connect,
    Update,
    Close,
}

/// Failures raised by a presence backend. Never fatal to the host.
#[derive(Debug, Error)]
pub enum PresenceError {
    #[error("failed to connect to presence service: {0}")]
    Connect(String),
    #[error("failed to update presence: {0}")]
    Update(String),
    #[error("failed to close presence connection: {0}")]
    Close(String),
}

impl PresenceError {
    pub fn connect(message: impl Into<String>) -> Self {
        Self::Connect(message.into())
    }

    pub fn update(message: impl Into<String>) -> Self {
        Self::Update(message.into())
    }

    pub fn close(message: impl Into<String>) -> Self {
        Self::Close(message.into())
    }

    pub fn kind(&self) -> PresenceErrorKind {
        match self {
            Self::Connect(_) => PresenceErrorKind::Connect,
            Self::Update(_) => PresenceErrorKind::Update,
            Self::Close(_) => PresenceErrorKind::Close,
        }
    }
}
