//! Game session lifecycle management for Noughts.
//!
//! Everything here is plain synchronous state. The server owns one
//! [`Store`] inside a single task and hands it each request in turn, so no
//! type in this crate needs a lock.
//!
//! # Key types
//!
//! - [`Session`]: one pair's game, with two seats, a board and the turn
//! - [`SessionRegistry`]: owns every session, creates codes, reaps idle ones
//! - [`MatchmakingQueue`]: FIFO of players waiting for a random opponent
//! - [`Store`]: registry and queue together, with the operations that
//!   touch both
//! - [`SessionConfig`]: session TTL, sweep interval, code length

mod config;
mod error;
mod matchmaking;
mod registry;
mod session;
mod store;

pub use config::SessionConfig;
pub use error::SessionError;
pub use matchmaking::{MatchOutcome, MatchmakingQueue, Ticket};
pub use registry::SessionRegistry;
pub use session::{Player, Session};
pub use store::{Departure, JoinOutcome, Store};
