//! Client intents and server events.
//!
//! Every message is an internally tagged JSON object:
//!
//! ```text
//! { "type": "make-move", "position": 4 }
//! { "seq": 7, "timestamp": 1830, "type": "move-made", "state": { ... } }
//! ```
//!
//! Variant names become kebab-case tags and field names become camelCase,
//! so the Rust side keeps its own naming conventions.

use serde::{Deserialize, Serialize};

use crate::{ProtocolError, SessionId, SessionSnapshot};

// ---------------------------------------------------------------------------
// Intent: client → server
// ---------------------------------------------------------------------------

/// A request from a client.
///
/// Anything that fails to parse into one of these variants never reaches
/// the router; the connection handler answers it with an `invalid-payload`
/// error instead.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Intent {
    /// "Call me this." Required before any session action.
    SetName { name: String },

    /// "Open a new session with me in the first seat."
    CreateSession,

    /// "Put me in this session."
    JoinSession { session_id: SessionId },

    /// "Pair me with whoever is waiting, or make me the one who waits."
    RequestRandomMatch,

    /// "Place my mark here." Either `position` (0..9) or `row`+`col`.
    MakeMove {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        position: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        row: Option<usize>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        col: Option<usize>,
    },

    /// "Clear the board and play again."
    ResetSession,

    /// "Take me out of my session" without dropping the connection.
    LeaveSession,

    /// Keep-alive. Answered with [`Event::Pong`].
    Ping {
        #[serde(default)]
        client_time: u64,
    },
}

impl Intent {
    /// Short, stable name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::SetName { .. } => "set-name",
            Self::CreateSession => "create-session",
            Self::JoinSession { .. } => "join-session",
            Self::RequestRandomMatch => "request-random-match",
            Self::MakeMove { .. } => "make-move",
            Self::ResetSession => "reset-session",
            Self::LeaveSession => "leave-session",
            Self::Ping { .. } => "ping",
        }
    }

    /// Convenience constructor for a flat-index move.
    pub fn make_move(position: usize) -> Self {
        Self::MakeMove {
            position: Some(position),
            row: None,
            col: None,
        }
    }
}

/// Where a move is aimed, after the payload has been checked for shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveTarget {
    Index(usize),
    RowCol { row: usize, col: usize },
}

impl MoveTarget {
    /// Resolves the optional fields of [`Intent::MakeMove`].
    ///
    /// Exactly one addressing style must be present.
    ///
    /// # Errors
    /// [`ProtocolError::InvalidPayload`] when both or neither are given.
    pub fn from_fields(
        position: Option<usize>,
        row: Option<usize>,
        col: Option<usize>,
    ) -> Result<Self, ProtocolError> {
        match (position, row, col) {
            (Some(index), None, None) => Ok(Self::Index(index)),
            (None, Some(row), Some(col)) => Ok(Self::RowCol { row, col }),
            (None, None, None) => Err(ProtocolError::InvalidPayload(
                "make-move needs a position or a row and col".into(),
            )),
            _ => Err(ProtocolError::InvalidPayload(
                "make-move takes either a position or a row and col, not both".into(),
            )),
        }
    }
}

// ---------------------------------------------------------------------------
// Event: server → client
// ---------------------------------------------------------------------------

/// A notification from the server.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum Event {
    /// Acknowledges `set-name`. Sent to the sender only.
    NameSet { name: String },

    /// A new session was created with the sender as its only player.
    SessionCreated {
        session_id: SessionId,
        state: SessionSnapshot,
    },

    /// Someone joined; sent to every participant.
    PlayerJoined { state: SessionSnapshot },

    /// The session just became active; sent to every participant.
    SessionStarted { state: SessionSnapshot },

    /// Random matchmaking found nobody; the sender waits in a new session.
    MatchWaiting {
        session_id: SessionId,
        state: SessionSnapshot,
    },

    /// A move was accepted.
    MoveMade { state: SessionSnapshot },

    /// The board was cleared for a new game.
    SessionReset { state: SessionSnapshot },

    /// Acknowledges `leave-session`.
    SessionLeft { session_id: SessionId },

    /// The other participant left or disconnected.
    OpponentLeft,

    /// The session was reaped by the idle sweep.
    SessionExpired { session_id: SessionId },

    /// Answer to [`Intent::Ping`].
    Pong { client_time: u64, server_time: u64 },

    /// A request failed. Sent to the originator only.
    /// `code` is a stable kebab-case identifier such as `not-your-turn`.
    Error { code: String, message: String },
}

impl Event {
    /// Short, stable name for logging.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NameSet { .. } => "name-set",
            Self::SessionCreated { .. } => "session-created",
            Self::PlayerJoined { .. } => "player-joined",
            Self::SessionStarted { .. } => "session-started",
            Self::MatchWaiting { .. } => "match-waiting",
            Self::MoveMade { .. } => "move-made",
            Self::SessionReset { .. } => "session-reset",
            Self::SessionLeft { .. } => "session-left",
            Self::OpponentLeft => "opponent-left",
            Self::SessionExpired { .. } => "session-expired",
            Self::Pong { .. } => "pong",
            Self::Error { .. } => "error",
        }
    }

    /// The snapshot carried by this event, if any.
    pub fn state(&self) -> Option<&SessionSnapshot> {
        match self {
            Self::SessionCreated { state, .. }
            | Self::PlayerJoined { state }
            | Self::SessionStarted { state }
            | Self::MatchWaiting { state, .. }
            | Self::MoveMade { state }
            | Self::SessionReset { state } => Some(state),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// Envelope
// ---------------------------------------------------------------------------

/// Outbound wrapper adding ordering and timing metadata to an event.
///
/// The body is flattened, so the metadata sits next to the `type` tag
/// instead of nesting the event one level down.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Envelope<T> {
    /// Per-connection sequence number, starting at 1.
    pub seq: u64,

    /// Milliseconds since the server started.
    pub timestamp: u64,

    #[serde(flatten)]
    pub body: T,
}

#[cfg(test)]
mod tests {
    use noughts_board::{Board, Mark, Outcome};

    use super::*;
    use crate::{PlayerId, PlayerInfo, SessionStatus};

    fn snapshot() -> SessionSnapshot {
        SessionSnapshot {
            session_id: SessionId::new("ABCD1234"),
            board: Board::new(),
            current_mark: Mark::X,
            status: SessionStatus::Waiting,
            outcome: Outcome::None,
            players: vec![PlayerInfo {
                id: PlayerId(1),
                name: "Alice".into(),
                mark: Mark::X,
            }],
            winning_line: None,
        }
    }

    // =====================================================================
    // Intent parsing
    // =====================================================================

    #[test]
    fn test_intent_set_name_parses() {
        let intent: Intent =
            serde_json::from_str(r#"{"type":"set-name","name":"Alice"}"#).unwrap();
        assert_eq!(intent, Intent::SetName { name: "Alice".into() });
    }

    #[test]
    fn test_intent_unit_variants_parse_from_tag_only() {
        let intent: Intent = serde_json::from_str(r#"{"type":"create-session"}"#).unwrap();
        assert_eq!(intent, Intent::CreateSession);

        let intent: Intent =
            serde_json::from_str(r#"{"type":"request-random-match"}"#).unwrap();
        assert_eq!(intent, Intent::RequestRandomMatch);

        let intent: Intent = serde_json::from_str(r#"{"type":"leave-session"}"#).unwrap();
        assert_eq!(intent, Intent::LeaveSession);
    }

    #[test]
    fn test_intent_join_session_uses_camel_case_field() {
        let intent: Intent =
            serde_json::from_str(r#"{"type":"join-session","sessionId":"ABCD1234"}"#)
                .unwrap();
        assert_eq!(
            intent,
            Intent::JoinSession { session_id: SessionId::new("ABCD1234") }
        );
    }

    #[test]
    fn test_intent_make_move_accepts_position_or_row_col() {
        let intent: Intent =
            serde_json::from_str(r#"{"type":"make-move","position":4}"#).unwrap();
        assert_eq!(intent, Intent::make_move(4));

        let intent: Intent =
            serde_json::from_str(r#"{"type":"make-move","row":1,"col":2}"#).unwrap();
        assert_eq!(
            intent,
            Intent::MakeMove { position: None, row: Some(1), col: Some(2) }
        );
    }

    #[test]
    fn test_intent_make_move_negative_position_is_rejected() {
        let result: Result<Intent, _> =
            serde_json::from_str(r#"{"type":"make-move","position":-1}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_intent_unknown_type_is_rejected() {
        let result: Result<Intent, _> = serde_json::from_str(r#"{"type":"fly-to-moon"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_intent_set_name_missing_field_is_rejected() {
        let result: Result<Intent, _> = serde_json::from_str(r#"{"type":"set-name"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_intent_kind_matches_wire_tag() {
        let intent = Intent::Ping { client_time: 5 };
        let json = serde_json::to_value(&intent).unwrap();
        assert_eq!(json["type"], intent.kind());
        assert_eq!(json["clientTime"], 5);
    }

    // =====================================================================
    // MoveTarget
    // =====================================================================

    #[test]
    fn test_move_target_from_fields() {
        assert_eq!(
            MoveTarget::from_fields(Some(3), None, None).unwrap(),
            MoveTarget::Index(3)
        );
        assert_eq!(
            MoveTarget::from_fields(None, Some(0), Some(2)).unwrap(),
            MoveTarget::RowCol { row: 0, col: 2 }
        );
    }

    #[test]
    fn test_move_target_rejects_missing_or_mixed_fields() {
        assert!(matches!(
            MoveTarget::from_fields(None, None, None),
            Err(ProtocolError::InvalidPayload(_))
        ));
        assert!(matches!(
            MoveTarget::from_fields(Some(1), Some(0), Some(1)),
            Err(ProtocolError::InvalidPayload(_))
        ));
        assert!(matches!(
            MoveTarget::from_fields(None, Some(1), None),
            Err(ProtocolError::InvalidPayload(_))
        ));
    }

    // =====================================================================
    // Event shape
    // =====================================================================

    #[test]
    fn test_event_session_created_json_format() {
        let event = Event::SessionCreated {
            session_id: SessionId::new("ABCD1234"),
            state: snapshot(),
        };
        let json = serde_json::to_value(&event).unwrap();

        assert_eq!(json["type"], "session-created");
        assert_eq!(json["sessionId"], "ABCD1234");
        assert_eq!(json["state"]["status"], "waiting");
    }

    #[test]
    fn test_event_opponent_left_is_tag_only() {
        let json = serde_json::to_value(Event::OpponentLeft).unwrap();
        assert_eq!(json, serde_json::json!({ "type": "opponent-left" }));
    }

    #[test]
    fn test_event_error_json_format() {
        let event = Event::Error {
            code: "not-your-turn".into(),
            message: "it is not your turn".into(),
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "error");
        assert_eq!(json["code"], "not-your-turn");
        assert_eq!(json["message"], "it is not your turn");
    }

    #[test]
    fn test_event_state_accessor() {
        let event = Event::MoveMade { state: snapshot() };
        assert_eq!(event.state().unwrap().session_id.as_str(), "ABCD1234");
        assert!(Event::OpponentLeft.state().is_none());
    }

    // =====================================================================
    // Envelope
    // =====================================================================

    #[test]
    fn test_envelope_flattens_event_beside_metadata() {
        let envelope = Envelope {
            seq: 3,
            timestamp: 120,
            body: Event::NameSet { name: "Alice".into() },
        };
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "seq": 3,
                "timestamp": 120,
                "type": "name-set",
                "name": "Alice",
            })
        );
    }

    #[test]
    fn test_envelope_decodes_back_into_event() {
        let envelope = Envelope {
            seq: 1,
            timestamp: 0,
            body: Event::MoveMade { state: snapshot() },
        };
        let bytes = serde_json::to_vec(&envelope).unwrap();
        let decoded: Envelope<Event> = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, envelope);
    }
}
