//! The store: registry and matchmaking queue behind one owner.
//!
//! The router holds exactly one `Store` and passes every request through
//! it. Operations that touch both halves (leaving cancels a ticket,
//! expiry purges tickets) live here so they can't drift apart.

use std::time::Instant;

use noughts_protocol::{MoveTarget, PlayerId, SessionId, SessionSnapshot};

use crate::{MatchOutcome, MatchmakingQueue, Player, SessionConfig, SessionError, SessionRegistry};

/// Result of a successful join.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinOutcome {
    pub snapshot: SessionSnapshot,
    /// `true` when this join filled the last seat.
    pub started: bool,
}

/// What happened when a player left a session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Departure {
    pub session_id: SessionId,
    /// Players still seated, who should hear about it.
    pub remaining: Vec<PlayerId>,
    /// `true` if the session was empty and has been deleted.
    pub deleted: bool,
}

/// Owns every session and every matchmaking ticket.
#[derive(Debug, Default)]
pub struct Store {
    registry: SessionRegistry,
    queue: MatchmakingQueue,
}

impl Store {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            registry: SessionRegistry::new(config),
            queue: MatchmakingQueue::new(),
        }
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn queue(&self) -> &MatchmakingQueue {
        &self.queue
    }

    pub fn config(&self) -> &SessionConfig {
        self.registry.config()
    }

    /// Snapshot of a live session.
    pub fn snapshot(&self, id: &SessionId) -> Option<SessionSnapshot> {
        self.registry.get(id).map(|s| s.snapshot())
    }

    /// Opens a new waiting session with `player` in the `X` seat.
    pub fn create_session(&mut self, player: Player, now: Instant) -> SessionSnapshot {
        self.registry.create(player, now).snapshot()
    }

    /// Checks that `player` could take a seat in `id` right now.
    ///
    /// # Errors
    /// - [`SessionError::NotFound`] if no such session exists
    /// - [`SessionError::AlreadyJoined`] if the player is already seated
    /// - [`SessionError::Full`] if both seats are taken
    pub fn check_joinable(&self, id: &SessionId, player: PlayerId) -> Result<(), SessionError> {
        let session = self
            .registry
            .get(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;
        if session.has_player(player) {
            return Err(SessionError::AlreadyJoined(id.clone()));
        }
        if session.is_full() {
            return Err(SessionError::Full(id.clone()));
        }
        Ok(())
    }

    /// Seats `player` in session `id`.
    ///
    /// # Errors
    /// Same as [`check_joinable`](Self::check_joinable).
    pub fn join_session(
        &mut self,
        id: &SessionId,
        player: Player,
        now: Instant,
    ) -> Result<JoinOutcome, SessionError> {
        self.check_joinable(id, player.id)?;
        let session = self
            .registry
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;

        let player_id = player.id;
        if !session.add_player(player, now) {
            return Err(SessionError::Full(id.clone()));
        }
        let started = session.status().is_active();
        tracing::info!(session_id = %id, player = %player_id, started, "player joined session");

        Ok(JoinOutcome {
            snapshot: session.snapshot(),
            started,
        })
    }

    /// Pairs `player` with a waiting opponent or queues them.
    pub fn request_match(&mut self, player: Player, now: Instant) -> MatchOutcome {
        self.queue.request_match(player, &mut self.registry, now)
    }

    /// Applies a move by `player` in session `id`.
    ///
    /// # Errors
    /// [`SessionError::NotFound`] if the session is gone, otherwise
    /// whatever [`Session::make_move`](crate::Session::make_move) rejects.
    pub fn make_move(
        &mut self,
        id: &SessionId,
        player: PlayerId,
        target: MoveTarget,
        now: Instant,
    ) -> Result<SessionSnapshot, SessionError> {
        let session = self
            .registry
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;

        let outcome = match target {
            MoveTarget::Index(position) => session.make_move(player, position, now)?,
            MoveTarget::RowCol { row, col } => session.make_move_at(player, row, col, now)?,
        };
        tracing::debug!(session_id = %id, %player, ?target, ?outcome, "move applied");
        Ok(session.snapshot())
    }

    /// Starts a fresh game in session `id`.
    ///
    /// # Errors
    /// - [`SessionError::NotFound`] if the session is gone
    /// - [`SessionError::NotAPlayer`] if `player` holds no seat
    pub fn reset(
        &mut self,
        id: &SessionId,
        player: PlayerId,
        now: Instant,
    ) -> Result<SessionSnapshot, SessionError> {
        let session = self
            .registry
            .get_mut(id)
            .ok_or_else(|| SessionError::NotFound(id.clone()))?;
        if !session.has_player(player) {
            return Err(SessionError::NotAPlayer(player));
        }

        session.reset(now);
        tracing::debug!(session_id = %id, %player, "session reset");
        Ok(session.snapshot())
    }

    /// Removes `player` from session `id` and cancels their ticket.
    ///
    /// An emptied session is deleted. Returns `None` when the session no
    /// longer exists or the player was not seated in it.
    pub fn leave(&mut self, id: &SessionId, player: PlayerId) -> Option<Departure> {
        self.queue.cancel(player);

        let session = self.registry.get_mut(id)?;
        if !session.remove_player(player) {
            return None;
        }

        let remaining = session.player_ids();
        let deleted = session.is_empty();
        if deleted {
            self.registry.remove(id);
        }
        tracing::info!(session_id = %id, %player, deleted, "player left session");

        Some(Departure {
            session_id: id.clone(),
            remaining,
            deleted,
        })
    }

    /// Deletes idle sessions and any tickets pointing at them.
    pub fn sweep_expired(&mut self, now: Instant) -> Vec<SessionId> {
        let expired = self.registry.sweep_expired(now);
        if !expired.is_empty() {
            self.queue.forget_sessions(&expired);
        }
        expired
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use noughts_protocol::SessionStatus;

    fn player(id: u64) -> Player {
        Player::new(PlayerId(id), format!("player-{id}"))
    }

    fn store_with_session() -> (Store, SessionId) {
        let mut store = Store::default();
        let snap = store.create_session(player(1), Instant::now());
        (store, snap.session_id)
    }

    // ===== join_session() =====

    #[test]
    fn test_join_session_second_player_starts_game() {
        let (mut store, id) = store_with_session();
        let joined = store.join_session(&id, player(2), Instant::now()).unwrap();
        assert!(joined.started);
        assert_eq!(joined.snapshot.status, SessionStatus::Active);
    }

    #[test]
    fn test_join_session_unknown_code() {
        let mut store = Store::default();
        let id = SessionId::new("MISSING0");
        let err = store.join_session(&id, player(1), Instant::now()).unwrap_err();
        assert_eq!(err, SessionError::NotFound(id));
    }

    #[test]
    fn test_join_session_full() {
        let (mut store, id) = store_with_session();
        store.join_session(&id, player(2), Instant::now()).unwrap();
        let err = store.join_session(&id, player(3), Instant::now()).unwrap_err();
        assert_eq!(err.code(), "session-full");
    }

    #[test]
    fn test_join_session_own_session_is_already_joined() {
        let (mut store, id) = store_with_session();
        let err = store.join_session(&id, player(1), Instant::now()).unwrap_err();
        assert_eq!(err, SessionError::AlreadyJoined(id));
    }

    // ===== make_move() / reset() =====

    #[test]
    fn test_make_move_accepts_both_addressing_styles() {
        let (mut store, id) = store_with_session();
        store.join_session(&id, player(2), Instant::now()).unwrap();

        store
            .make_move(&id, PlayerId(1), MoveTarget::Index(4), Instant::now())
            .unwrap();
        let snap = store
            .make_move(&id, PlayerId(2), MoveTarget::RowCol { row: 0, col: 0 }, Instant::now())
            .unwrap();
        assert_eq!(snap.board.filled(), 2);
    }

    #[test]
    fn test_make_move_on_missing_session() {
        let mut store = Store::default();
        let id = SessionId::new("GONE0000");
        let err = store
            .make_move(&id, PlayerId(1), MoveTarget::Index(0), Instant::now())
            .unwrap_err();
        assert_eq!(err.code(), "session-not-found");
    }

    #[test]
    fn test_reset_by_outsider_is_rejected() {
        let (mut store, id) = store_with_session();
        let err = store.reset(&id, PlayerId(7), Instant::now()).unwrap_err();
        assert_eq!(err, SessionError::NotAPlayer(PlayerId(7)));
    }

    // ===== leave() =====

    #[test]
    fn test_leave_only_player_deletes_session() {
        let (mut store, id) = store_with_session();
        let departure = store.leave(&id, PlayerId(1)).unwrap();
        assert!(departure.deleted);
        assert!(departure.remaining.is_empty());
        assert!(store.registry().is_empty());
    }

    #[test]
    fn test_leave_active_session_keeps_it_for_remaining_player() {
        let (mut store, id) = store_with_session();
        store.join_session(&id, player(2), Instant::now()).unwrap();

        let departure = store.leave(&id, PlayerId(1)).unwrap();
        assert!(!departure.deleted);
        assert_eq!(departure.remaining, vec![PlayerId(2)]);

        let snap = store.snapshot(&id).expect("still retrievable");
        assert_eq!(snap.status, SessionStatus::Waiting);
    }

    #[test]
    fn test_leave_cancels_matchmaking_ticket() {
        let mut store = Store::default();
        let outcome = store.request_match(player(1), Instant::now());
        assert_eq!(store.queue().len(), 1);

        store.leave(outcome.session_id(), PlayerId(1));
        assert!(store.queue().is_empty());
        assert!(store.registry().is_empty());
    }

    #[test]
    fn test_leave_unknown_session_returns_none() {
        let mut store = Store::default();
        assert!(store.leave(&SessionId::new("NOPE0000"), PlayerId(1)).is_none());
    }

    // ===== sweep_expired() =====

    #[test]
    fn test_sweep_expired_purges_tickets() {
        let mut store = Store::new(SessionConfig {
            ttl: Duration::from_secs(5),
            ..SessionConfig::default()
        });
        let start = Instant::now();
        let waiting = store.request_match(player(1), start);

        let expired = store.sweep_expired(start + Duration::from_secs(6));
        assert_eq!(expired, vec![waiting.session_id().clone()]);
        assert!(store.queue().is_empty());
    }
}
