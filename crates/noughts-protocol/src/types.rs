//! Identity types and the session snapshot.
//!
//! Everything here travels on the wire. Field names are camelCase in JSON
//! because the browser client reads them directly.

use std::fmt;

use noughts_board::{Board, Mark, Outcome};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Identifies a player for the lifetime of one connection.
///
/// A newtype over `u64` so a player can never be confused with another
/// numeric id. `#[serde(transparent)]` keeps it a plain number in JSON.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// A short, human-typeable session code such as `"K3Q9ZT0A"`.
///
/// Codes are generated by the session registry; the protocol only carries
/// them. Comparison is exact, so clients are expected to send back the
/// code as they received it.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(pub String);

impl SessionId {
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// SessionStatus
// ---------------------------------------------------------------------------

/// The lifecycle state of a session.
///
/// ```text
///            second player joins          winning / filling move
/// Waiting ───────────────────────→ Active ─────────────────────→ Finished
///    ↑                              ↑  │ ↺ legal move                │
///    │          a player leaves     │  └──────── reset ──────────────┘
///    └──────────────────────────────┴─────────────────────────────────┘
/// ```
///
/// - **Waiting**: fewer than two players. Open for joining.
/// - **Active**: two players, moves accepted.
/// - **Finished**: the board produced a winner or a draw. Only reset (or
///   a player leaving) moves it on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Waiting,
    Active,
    Finished,
}

impl SessionStatus {
    /// Returns `true` if the session accepts another player.
    pub fn is_joinable(self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` if moves are accepted.
    pub fn is_active(self) -> bool {
        matches!(self, Self::Active)
    }

    /// Returns `true` if transitioning to `target` is allowed.
    pub fn can_transition_to(self, target: Self) -> bool {
        use SessionStatus::*;
        matches!(
            (self, target),
            (Waiting, Active)
                | (Waiting, Waiting)
                | (Active, Active)
                | (Active, Finished)
                | (Active, Waiting)
                | (Finished, Active)
                | (Finished, Waiting)
        )
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => write!(f, "waiting"),
            Self::Active => write!(f, "active"),
            Self::Finished => write!(f, "finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// Snapshot
// ---------------------------------------------------------------------------

/// A player as shown to clients.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerInfo {
    pub id: PlayerId,
    pub name: String,
    /// Seat-derived mark: the first player is always `X`.
    pub mark: Mark,
}

/// The full, immutable state of one session at one instant.
///
/// Broadcast to every participant after any state change. It is a copy,
/// so holding on to one never keeps the registry's session alive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionSnapshot {
    pub session_id: SessionId,
    pub board: Board,
    /// The mark that moves next (or moved last, once finished).
    pub current_mark: Mark,
    pub status: SessionStatus,
    pub outcome: Outcome,
    pub players: Vec<PlayerInfo>,
    /// Cell indexes of the winning triple, when there is one.
    pub winning_line: Option<[usize; 3]>,
}
