//! Error types for the session layer.

use noughts_board::BoardError;
use noughts_protocol::{PlayerId, SessionId};

/// Errors that can occur during session operations.
///
/// None of these are fatal: each one is reported to the player who caused
/// it and the session is left exactly as it was.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SessionError {
    /// No session is registered under this code.
    #[error("session {0} not found")]
    NotFound(SessionId),

    /// Both seats are taken.
    #[error("session {0} is full")]
    Full(SessionId),

    /// The player already sits in this session.
    #[error("already in session {0}")]
    AlreadyJoined(SessionId),

    /// Moves are not accepted until the second player arrives.
    #[error("the game has not started yet")]
    NotStarted,

    /// The game is over; only a reset reopens it.
    #[error("the game is already finished")]
    AlreadyFinished,

    /// The acting player holds neither seat.
    #[error("player {0} is not playing in this session")]
    NotAPlayer(PlayerId),

    /// It is the other mark's move.
    #[error("it is not your turn")]
    NotYourTurn,

    /// The board rejected the move (out of range or occupied).
    #[error(transparent)]
    Board(#[from] BoardError),
}

impl SessionError {
    /// Stable kebab-case code sent to clients next to the message.
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "session-not-found",
            Self::Full(_) => "session-full",
            Self::AlreadyJoined(_) => "already-in-session",
            Self::NotStarted => "not-started",
            Self::AlreadyFinished => "already-finished",
            Self::NotAPlayer(_) => "not-a-player",
            Self::NotYourTurn => "not-your-turn",
            Self::Board(BoardError::OutOfRange(_)) => "out-of-range",
            Self::Board(BoardError::Occupied(_)) => "cell-occupied",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_board_errors_keep_their_own_codes() {
        let err: SessionError = BoardError::Occupied(4).into();
        assert_eq!(err.code(), "cell-occupied");
        assert_eq!(err.to_string(), "cell 4 is already occupied");

        let err: SessionError = BoardError::OutOfRange(12).into();
        assert_eq!(err.code(), "out-of-range");
    }

    #[test]
    fn test_not_found_message_names_the_code() {
        let err = SessionError::NotFound(SessionId::new("ZZZZ9999"));
        assert_eq!(err.code(), "session-not-found");
        assert!(err.to_string().contains("ZZZZ9999"));
    }
}
