//! Networking for Noughts.
//!
//! The server never touches sockets directly. It accepts through a
//! [`Transport`] and talks to each client through a [`Connection`], both of
//! which deal in whole messages as byte buffers. What those bytes mean is
//! the protocol crate's business.
//!
//! # Feature Flags
//!
//! - `websocket` (default): [`WebSocketTransport`] over `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
mod id;
#[cfg(feature = "websocket")]
mod websocket;

use std::net::SocketAddr;

pub use error::TransportError;
pub use id::ConnectionId;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketHandshake, WebSocketTransport};

/// A listener that yields clients still owing their upgrade handshake.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Handshake: Handshake<Connection = Self::Connection>;

    /// Waits for the next client to connect.
    ///
    /// Returns as soon as the socket is open. The handshake is finished
    /// separately with [`Handshake::complete`], so a slow client never holds
    /// up the accept loop. An error concerns one client only; the listener
    /// stays usable.
    async fn accept(&mut self) -> Result<Self::Handshake, TransportError>;

    /// The address the listener is bound to.
    fn local_addr(&self) -> Result<SocketAddr, TransportError>;
}

/// A connected client whose upgrade handshake has not run yet.
pub trait Handshake: Send + 'static {
    type Connection: Connection;

    fn peer_addr(&self) -> SocketAddr;

    /// Runs the handshake, bounded by the transport's upgrade timeout.
    async fn complete(self) -> Result<Self::Connection, TransportError>;
}

/// One client, exchanging whole messages.
///
/// Every method takes `&self` and the halves are independent: one task can
/// sit in [`recv`](Self::recv) while another calls [`send`](Self::send).
pub trait Connection: Send + Sync + 'static {
    /// Sends one message.
    async fn send(&self, data: &[u8]) -> Result<(), TransportError>;

    /// Waits for the next message. `Ok(None)` means the peer closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError>;

    /// Starts a clean close.
    async fn close(&self) -> Result<(), TransportError>;

    fn id(&self) -> ConnectionId;

    fn peer_addr(&self) -> SocketAddr;
}
