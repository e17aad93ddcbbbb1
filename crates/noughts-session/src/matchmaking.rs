//! First-come-first-served random matchmaking.
//!
//! A player asking for a match either takes the seat opposite the oldest
//! waiting ticket or opens a fresh session and leaves a ticket of their own.
//! The queue only stores session ids; the registry stays the sole owner of
//! sessions, so a ticket can go stale when its session disappears. Stale
//! tickets are dropped lazily the next time they reach the front.

use std::collections::VecDeque;
use std::time::Instant;

use noughts_protocol::{PlayerId, SessionId};

use crate::{Player, SessionRegistry};

/// A player waiting in `session_id` for a random opponent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    pub player: PlayerId,
    pub session_id: SessionId,
}

/// Result of [`MatchmakingQueue::request_match`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Seated opposite an earlier ticket holder; the session is now active.
    Paired(SessionId),
    /// No one was waiting. A new session was opened and ticketed.
    Waiting(SessionId),
}

impl MatchOutcome {
    pub fn session_id(&self) -> &SessionId {
        match self {
            Self::Paired(id) | Self::Waiting(id) => id,
        }
    }
}

/// FIFO of outstanding tickets.
#[derive(Debug, Default)]
pub struct MatchmakingQueue {
    tickets: VecDeque<Ticket>,
}

impl MatchmakingQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pairs `player` with the oldest valid ticket, or enqueues them.
    ///
    /// A ticket is valid while its session exists, holds exactly one
    /// player and is still waiting. Invalid tickets are discarded.
    pub fn request_match(
        &mut self,
        player: Player,
        registry: &mut SessionRegistry,
        now: Instant,
    ) -> MatchOutcome {
        while let Some(ticket) = self.tickets.pop_front() {
            if ticket.player == player.id {
                continue;
            }

            let Some(session) = registry.get_mut(&ticket.session_id) else {
                tracing::debug!(
                    session_id = %ticket.session_id,
                    "dropping ticket for vanished session"
                );
                continue;
            };

            let open = session.players().len() == 1
                && session.status().is_joinable()
                && session.has_player(ticket.player);
            if open && session.add_player(player.clone(), now) {
                tracing::info!(
                    session_id = %ticket.session_id,
                    first = %ticket.player,
                    second = %player.id,
                    "random match paired"
                );
                return MatchOutcome::Paired(ticket.session_id);
            }

            tracing::debug!(session_id = %ticket.session_id, "dropping stale ticket");
        }

        let owner = player.id;
        let session_id = registry.create(player, now).id().clone();
        self.tickets.push_back(Ticket {
            player: owner,
            session_id: session_id.clone(),
        });
        tracing::debug!(
            %session_id,
            player = %owner,
            queued = self.tickets.len(),
            "waiting for random match"
        );
        MatchOutcome::Waiting(session_id)
    }

    /// Removes any ticket owned by `player`. No-op if there is none.
    pub fn cancel(&mut self, player: PlayerId) -> Option<Ticket> {
        let index = self.tickets.iter().position(|t| t.player == player)?;
        self.tickets.remove(index)
    }

    /// Drops every ticket that points at one of `sessions`.
    pub fn forget_sessions(&mut self, sessions: &[SessionId]) {
        self.tickets.retain(|t| !sessions.contains(&t.session_id));
    }

    pub fn contains(&self, player: PlayerId) -> bool {
        self.tickets.iter().any(|t| t.player == player)
    }

    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }
}
