//! Wire protocol for Noughts.
//!
//! This crate defines what clients and the server say to each other:
//!
//! - **Types** ([`PlayerId`], [`SessionId`], [`SessionSnapshot`],
//!   [`SessionStatus`]): identities and the state record broadcast after
//!   every change.
//! - **Messages** ([`Intent`], [`Event`], [`Envelope`]): client requests
//!   and server notifications, one named variant per kind.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]): how messages become
//!   bytes.
//! - **Errors** ([`ProtocolError`]).
//!
//! ```text
//! Transport (frames) → Protocol (Intent / Event) → Router (session rules)
//! ```

mod codec;
mod error;
mod message;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use message::{Envelope, Event, Intent, MoveTarget};
pub use types::{PlayerId, PlayerInfo, SessionId, SessionSnapshot, SessionStatus};
