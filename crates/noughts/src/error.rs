//! Error types for the server crate.

use noughts_protocol::{Event, ProtocolError};
use noughts_session::SessionError;
use noughts_transport::TransportError;

use crate::ConfigError;

/// Top-level error that wraps all crate-specific errors.
///
/// The `#[from]` attribute on each variant generates a `From` impl, so
/// `?` converts sub-crate errors automatically.
#[derive(Debug, thiserror::Error)]
pub enum NoughtsError {
    /// A transport-level error (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A protocol-level error (encode, decode).
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A session rule was violated outside of normal intent handling.
    #[error(transparent)]
    Session(#[from] SessionError),

    /// The configuration could not be loaded or is inconsistent.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The router task has stopped and no longer accepts commands.
    #[error("router is no longer running")]
    RouterClosed,
}

/// Why an intent was refused.
///
/// Every variant is reported to the originating connection only, as an
/// `error` event carrying [`code`](Self::code) and the display message.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RouterError {
    /// The connection has not declared a display name yet.
    #[error("set a name before joining a game")]
    NotNamed,

    #[error("invalid name: {0}")]
    InvalidName(String),

    /// The intent needs a current session and there is none.
    #[error("not in a session")]
    NotInSession,

    /// The frame was not a well-formed intent.
    #[error("invalid payload: {0}")]
    InvalidPayload(String),

    #[error(transparent)]
    Session(#[from] SessionError),
}

impl RouterError {
    /// Stable kebab-case code for clients.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotNamed => "not-named",
            Self::InvalidName(_) => "invalid-name",
            Self::NotInSession => "not-in-session",
            Self::InvalidPayload(_) => "invalid-payload",
            Self::Session(e) => e.code(),
        }
    }

    /// The `error` event sent back to the originator.
    pub fn to_event(&self) -> Event {
        Event::Error {
            code: self.code().to_string(),
            message: self.to_string(),
        }
    }
}

impl From<ProtocolError> for RouterError {
    fn from(err: ProtocolError) -> Self {
        match err {
            ProtocolError::InvalidPayload(reason) => Self::InvalidPayload(reason),
            other => Self::InvalidPayload(other.to_string()),
        }
    }
}
