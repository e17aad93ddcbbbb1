//! Connection identity.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide counter behind [`ConnectionId::next`]. Starts at 1 so a
/// zero id never appears in logs.
static NEXT_CONNECTION_ID: AtomicU64 = AtomicU64::new(1);

/// Identifies one accepted connection for the lifetime of the process.
///
/// Ids are never reused. The server also uses the number as the player id
/// of whoever is on the other end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Allocates a fresh id.
    pub fn next() -> Self {
        Self(NEXT_CONNECTION_ID.fetch_add(1, Ordering::Relaxed))
    }

    pub fn into_inner(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}
