//! # Noughts
//!
//! A matchmaking and session server for two-player noughts and crosses.
//!
//! Clients connect over WebSocket and speak JSON. They name themselves,
//! then either open a private session and share its code, join a session
//! by code, or ask to be paired with the next random opponent. Every state
//! change is pushed to both players as a full [`SessionSnapshot`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use noughts::{NoughtsServer, ServerConfig};
//!
//! # async fn start() -> Result<(), noughts::NoughtsError> {
//! let config = ServerConfig::from_env()?;
//! let server = NoughtsServer::builder().config(config).build().await?;
//! server.run().await
//! # }
//! ```
//!
//! [`SessionSnapshot`]: noughts_protocol::SessionSnapshot

mod config;
mod error;
mod handler;
pub mod router;
mod server;

pub use config::{ConfigError, ServerConfig};
pub use error::{NoughtsError, RouterError};
pub use router::{Router, RouterHandle, RouterStats, spawn_router};
pub use server::{NoughtsServer, NoughtsServerBuilder};

/// Re-exports of the types most users need.
pub mod prelude {
    pub use noughts_board::{Board, Mark, Outcome};
    pub use noughts_protocol::{
        Codec, Envelope, Event, Intent, JsonCodec, PlayerId, SessionId, SessionSnapshot,
        SessionStatus,
    };
    pub use noughts_session::{SessionConfig, Store};

    pub use crate::{NoughtsError, NoughtsServer, ServerConfig};
}
