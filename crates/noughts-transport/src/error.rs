//! Error types for the transport layer.

use std::net::SocketAddr;

use crate::ConnectionId;

/// Errors raised while listening, upgrading, or moving frames.
///
/// Per-connection failures carry the [`ConnectionId`] so a log line can be
/// tied back to the handler that hit it.
#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    /// The listener could not be bound.
    #[error("cannot listen on {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: std::io::Error,
    },

    /// The TCP accept itself failed.
    #[error("accept failed: {0}")]
    Accept(#[source] std::io::Error),

    /// A client connected but never completed the WebSocket upgrade.
    #[error("upgrade from {peer} failed: {reason}")]
    Upgrade { peer: SocketAddr, reason: String },

    /// Writing a frame failed, usually because the peer is gone.
    #[error("{conn}: send failed: {reason}")]
    Send { conn: ConnectionId, reason: String },

    /// Reading a frame failed.
    #[error("{conn}: receive failed: {reason}")]
    Receive { conn: ConnectionId, reason: String },
}
