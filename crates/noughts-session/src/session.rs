//! The session entity: one pair of players sharing one board.
//!
//! A session moves through three states:
//!
//! ```text
//!   Waiting ──(second player)──→ Active ──(win / full board)──→ Finished
//!      ↑                          │  ↑                              │
//!      └────(a player leaves)─────┘  └───────────(reset)────────────┘
//! ```
//!
//! Every mutating method either succeeds completely or returns an error
//! with the session untouched.

use std::time::{Duration, Instant};

use noughts_board::{Board, BoardError, Mark, Outcome, evaluate, winning_line};
use noughts_protocol::{PlayerId, PlayerInfo, SessionId, SessionSnapshot, SessionStatus};

use crate::SessionError;

/// A seated player. The seat index fixes the mark: seat 0 is `X`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Player {
    pub id: PlayerId,
    pub name: String,
}

impl Player {
    pub fn new(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// A single game between at most two players.
#[derive(Debug, Clone)]
pub struct Session {
    id: SessionId,
    players: Vec<Player>,
    board: Board,
    turn: Mark,
    status: SessionStatus,
    outcome: Outcome,
    created_at: Instant,
    last_activity: Instant,
}

impl Session {
    /// Number of seats.
    pub const CAPACITY: usize = 2;

    /// Opens a waiting session with `creator` in the `X` seat.
    pub fn new(id: SessionId, creator: Player, now: Instant) -> Self {
        let session = Self {
            id,
            players: vec![creator],
            board: Board::new(),
            turn: Mark::FIRST,
            status: SessionStatus::Waiting,
            outcome: Outcome::None,
            created_at: now,
            last_activity: now,
        };
        session.check_invariants();
        session
    }

    pub fn id(&self) -> &SessionId {
        &self.id
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    /// The mark to move next. Once finished, the mark that moved last.
    pub fn turn(&self) -> Mark {
        self.turn
    }

    pub fn status(&self) -> SessionStatus {
        self.status
    }

    pub fn outcome(&self) -> Outcome {
        self.outcome
    }

    pub fn created_at(&self) -> Instant {
        self.created_at
    }

    pub fn last_activity(&self) -> Instant {
        self.last_activity
    }

    pub fn is_full(&self) -> bool {
        self.players.len() >= Self::CAPACITY
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn has_player(&self, player: PlayerId) -> bool {
        self.players.iter().any(|p| p.id == player)
    }

    /// The mark held by `player`, if seated.
    pub fn mark_of(&self, player: PlayerId) -> Option<Mark> {
        self.players
            .iter()
            .position(|p| p.id == player)
            .and_then(Mark::for_seat)
    }

    /// Ids of every seated player, in seat order.
    pub fn player_ids(&self) -> Vec<PlayerId> {
        self.players.iter().map(|p| p.id).collect()
    }

    /// Returns `true` when nothing has happened for longer than `ttl`.
    pub fn is_idle(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.last_activity) > ttl
    }

    /// Seats `player`. The session becomes active once both seats are taken.
    ///
    /// Returns `false` (and changes nothing) when the session is full or the
    /// player is already seated.
    pub fn add_player(&mut self, player: Player, now: Instant) -> bool {
        if self.is_full() || self.has_player(player.id) {
            return false;
        }

        self.players.push(player);
        if self.is_full() {
            self.transition(SessionStatus::Active);
        }
        self.last_activity = now;
        self.check_invariants();
        true
    }

    /// Plays `player`'s mark at board index `position`.
    ///
    /// # Errors
    /// - [`SessionError::NotStarted`] while waiting for an opponent
    /// - [`SessionError::AlreadyFinished`] once the game is decided
    /// - [`SessionError::NotAPlayer`] if `player` holds no seat
    /// - [`SessionError::NotYourTurn`] if the other mark is to move
    /// - [`SessionError::Board`] for an out-of-range or occupied cell
    pub fn make_move(
        &mut self,
        player: PlayerId,
        position: usize,
        now: Instant,
    ) -> Result<Outcome, SessionError> {
        self.play(player, now, |board, mark| board.apply_move(position, mark))
    }

    /// Row/column variant of [`make_move`](Self::make_move).
    pub fn make_move_at(
        &mut self,
        player: PlayerId,
        row: usize,
        col: usize,
        now: Instant,
    ) -> Result<Outcome, SessionError> {
        self.play(player, now, |board, mark| board.apply_move_at(row, col, mark))
    }

    fn play<F>(
        &mut self,
        player: PlayerId,
        now: Instant,
        place: F,
    ) -> Result<Outcome, SessionError>
    where
        F: FnOnce(&Board, Mark) -> Result<Board, BoardError>,
    {
        match self.status {
            SessionStatus::Waiting => return Err(SessionError::NotStarted),
            SessionStatus::Finished => return Err(SessionError::AlreadyFinished),
            SessionStatus::Active => {}
        }

        let mark = self.mark_of(player).ok_or(SessionError::NotAPlayer(player))?;
        if mark != self.turn {
            return Err(SessionError::NotYourTurn);
        }

        let board = place(&self.board, mark)?;
        let outcome = evaluate(&board);

        self.board = board;
        self.outcome = outcome;
        if outcome.is_decided() {
            self.transition(SessionStatus::Finished);
        } else {
            self.turn = mark.opponent();
        }
        self.last_activity = now;
        self.check_invariants();
        Ok(outcome)
    }

    /// Starts a fresh game with the same players.
    ///
    /// Allowed in any status; the new status follows from the seat count.
    pub fn reset(&mut self, now: Instant) {
        self.board = Board::new();
        self.turn = Mark::FIRST;
        self.outcome = Outcome::None;
        let status = if self.is_full() {
            SessionStatus::Active
        } else {
            SessionStatus::Waiting
        };
        self.transition(status);
        self.last_activity = now;
        self.check_invariants();
    }

    /// Unseats `player`. Returns `false` if they were not seated.
    ///
    /// A remaining player moves to the `X` seat of a fresh waiting game.
    /// Activity time is left alone, so an abandoned session still ages out.
    pub fn remove_player(&mut self, player: PlayerId) -> bool {
        let Some(seat) = self.players.iter().position(|p| p.id == player) else {
            return false;
        };

        self.players.remove(seat);
        self.board = Board::new();
        self.turn = Mark::FIRST;
        self.outcome = Outcome::None;
        self.transition(SessionStatus::Waiting);
        self.check_invariants();
        true
    }

    /// An immutable copy of the current state for broadcasting.
    pub fn snapshot(&self) -> SessionSnapshot {
        let players = self
            .players
            .iter()
            .zip([Mark::X, Mark::O])
            .map(|(p, mark)| PlayerInfo {
                id: p.id,
                name: p.name.clone(),
                mark,
            })
            .collect();

        SessionSnapshot {
            session_id: self.id.clone(),
            board: self.board,
            current_mark: self.turn,
            status: self.status,
            outcome: self.outcome,
            players,
            winning_line: winning_line(&self.board),
        }
    }

    fn transition(&mut self, next: SessionStatus) {
        debug_assert!(
            self.status.can_transition_to(next),
            "illegal session transition {} -> {}",
            self.status,
            next
        );
        self.status = next;
    }

    fn check_invariants(&self) {
        debug_assert!(self.players.len() <= Self::CAPACITY);
        debug_assert_eq!(
            self.status == SessionStatus::Waiting,
            self.players.len() < Self::CAPACITY,
            "waiting iff a seat is free"
        );
        debug_assert_eq!(
            self.status == SessionStatus::Finished,
            self.outcome.is_decided(),
            "finished iff decided"
        );
    }
}
