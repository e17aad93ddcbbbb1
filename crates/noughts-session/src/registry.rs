//! The session registry: owns every live session, keyed by code.
//!
//! Not thread-safe by itself. The registry is owned by the router task and
//! only ever touched from there, so a plain `HashMap` is enough.

use std::collections::HashMap;
use std::time::Instant;

use noughts_protocol::SessionId;
use rand::Rng;

use crate::{Player, Session, SessionConfig};

/// Characters used in session codes: digits and upper-case letters.
const CODE_ALPHABET: &[u8] = b"0123456789ABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Owns all sessions.
#[derive(Debug)]
pub struct SessionRegistry {
    sessions: HashMap<SessionId, Session>,
    config: SessionConfig,
}

impl SessionRegistry {
    pub fn new(config: SessionConfig) -> Self {
        Self {
            sessions: HashMap::new(),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Opens a waiting session for `creator` under a fresh, unused code.
    pub fn create(&mut self, creator: Player, now: Instant) -> &Session {
        let id = loop {
            let candidate = generate_code(self.config.effective_code_len());
            if !self.sessions.contains_key(&candidate) {
                break candidate;
            }
            tracing::debug!(code = %candidate, "session code collision, regenerating");
        };

        tracing::info!(session_id = %id, player = %creator.id, "session created");
        let session = Session::new(id.clone(), creator, now);
        self.sessions.entry(id).or_insert(session)
    }

    pub fn get(&self, id: &SessionId) -> Option<&Session> {
        self.sessions.get(id)
    }

    pub fn get_mut(&mut self, id: &SessionId) -> Option<&mut Session> {
        self.sessions.get_mut(id)
    }

    pub fn contains(&self, id: &SessionId) -> bool {
        self.sessions.contains_key(id)
    }

    /// Deletes a session. Returns it if it existed.
    pub fn remove(&mut self, id: &SessionId) -> Option<Session> {
        let removed = self.sessions.remove(id);
        if removed.is_some() {
            tracing::info!(session_id = %id, "session removed");
        }
        removed
    }

    /// Removes every session idle for longer than the TTL, whatever its
    /// status, and returns their ids so callers can notify whoever was
    /// still attached.
    pub fn sweep_expired(&mut self, now: Instant) -> Vec<SessionId> {
        let ttl = self.config.ttl;
        let mut expired = Vec::new();
        self.sessions.retain(|id, session| {
            let idle = session.is_idle(now, ttl);
            if idle {
                expired.push(id.clone());
            }
            !idle
        });

        if !expired.is_empty() {
            tracing::info!(
                count = expired.len(),
                remaining = self.sessions.len(),
                "expired idle sessions"
            );
        }
        expired
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Ids of every live session.
    pub fn ids(&self) -> Vec<SessionId> {
        self.sessions.keys().cloned().collect()
    }
}

impl Default for SessionRegistry {
    fn default() -> Self {
        Self::new(SessionConfig::default())
    }
}

/// Generates a random upper-case base36 code of `len` characters.
fn generate_code(len: usize) -> SessionId {
    let mut rng = rand::rng();
    let code: String = (0..len)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect();
    SessionId(code)
}
