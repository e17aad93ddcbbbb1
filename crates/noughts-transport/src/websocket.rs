//! WebSocket transport built on `tokio-tungstenite`.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::stream::{SplitSink, SplitStream};
use futures_util::{SinkExt, StreamExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;
use tokio_tungstenite::WebSocketStream;
use tokio_tungstenite::tungstenite::Message;

use crate::{Connection, ConnectionId, Handshake, Transport, TransportError};

/// How long a client gets to finish the WebSocket upgrade.
const UPGRADE_TIMEOUT: Duration = Duration::from_secs(10);

/// Accepts WebSocket clients on a TCP listener.
pub struct WebSocketTransport {
    listener: TcpListener,
}

impl WebSocketTransport {
    /// Binds to `addr`. Port `0` lets the OS choose; read the result back
    /// with [`Transport::local_addr`].
    pub async fn bind(addr: &str) -> Result<Self, TransportError> {
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| TransportError::Bind {
                addr: addr.to_string(),
                source,
            })?;
        tracing::info!(addr, "WebSocket transport listening");
        Ok(Self { listener })
    }
}

impl Transport for WebSocketTransport {
    type Connection = WebSocketConnection;
    type Handshake = WebSocketHandshake;

    async fn accept(&mut self) -> Result<WebSocketHandshake, TransportError> {
        let (stream, peer) = self.listener.accept().await.map_err(TransportError::Accept)?;
        tracing::trace!(%peer, "tcp connection accepted");
        Ok(WebSocketHandshake { stream, peer })
    }

    fn local_addr(&self) -> Result<SocketAddr, TransportError> {
        self.listener.local_addr().map_err(TransportError::Accept)
    }
}

/// A TCP client that has not sent its upgrade request yet.
pub struct WebSocketHandshake {
    stream: TcpStream,
    peer: SocketAddr,
}

impl Handshake for WebSocketHandshake {
    type Connection = WebSocketConnection;

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }

    async fn complete(self) -> Result<WebSocketConnection, TransportError> {
        let peer = self.peer;
        let upgrade = tokio::time::timeout(
            UPGRADE_TIMEOUT,
            tokio_tungstenite::accept_async(self.stream),
        );
        let ws = match upgrade.await {
            Ok(Ok(ws)) => ws,
            Ok(Err(e)) => {
                return Err(TransportError::Upgrade {
                    peer,
                    reason: e.to_string(),
                });
            }
            Err(_) => {
                return Err(TransportError::Upgrade {
                    peer,
                    reason: format!("no handshake within {UPGRADE_TIMEOUT:?}"),
                });
            }
        };

        let id = ConnectionId::next();
        tracing::debug!(%id, %peer, "accepted WebSocket connection");
        Ok(WebSocketConnection::new(id, peer, ws))
    }
}

/// One WebSocket client.
///
/// The stream is split and each half sits behind its own lock, so a task
/// parked in [`recv`](Connection::recv) never holds up a
/// [`send`](Connection::send) from another task.
pub struct WebSocketConnection {
    id: ConnectionId,
    peer: SocketAddr,
    sink: Mutex<SplitSink<WebSocketStream<TcpStream>, Message>>,
    stream: Mutex<SplitStream<WebSocketStream<TcpStream>>>,
}

impl WebSocketConnection {
    fn new(id: ConnectionId, peer: SocketAddr, ws: WebSocketStream<TcpStream>) -> Self {
        let (sink, stream) = ws.split();
        Self {
            id,
            peer,
            sink: Mutex::new(sink),
            stream: Mutex::new(stream),
        }
    }

    fn send_error(&self, e: impl ToString) -> TransportError {
        TransportError::Send {
            conn: self.id,
            reason: e.to_string(),
        }
    }
}

impl Connection for WebSocketConnection {
    /// UTF-8 payloads (every JSON message) go out as text frames so a
    /// browser sees a string. Anything else goes out as binary.
    async fn send(&self, data: &[u8]) -> Result<(), TransportError> {
        let frame = match std::str::from_utf8(data) {
            Ok(text) => Message::text(text.to_owned()),
            Err(_) => Message::binary(data.to_vec()),
        };
        self.sink
            .lock()
            .await
            .send(frame)
            .await
            .map_err(|e| self.send_error(e))
    }

    async fn recv(&self) -> Result<Option<Vec<u8>>, TransportError> {
        let mut stream = self.stream.lock().await;
        while let Some(frame) = stream.next().await {
            match frame {
                Ok(Message::Text(text)) => return Ok(Some(text.as_bytes().to_vec())),
                Ok(Message::Binary(data)) => return Ok(Some(data.to_vec())),
                Ok(Message::Close(_)) => return Ok(None),
                // tungstenite answers pings itself
                Ok(Message::Ping(_) | Message::Pong(_) | Message::Frame(_)) => {}
                Err(e) => {
                    return Err(TransportError::Receive {
                        conn: self.id,
                        reason: e.to_string(),
                    });
                }
            }
        }
        Ok(None)
    }

    async fn close(&self) -> Result<(), TransportError> {
        self.sink
            .lock()
            .await
            .close()
            .await
            .map_err(|e| self.send_error(e))
    }

    fn id(&self) -> ConnectionId {
        self.id
    }

    fn peer_addr(&self) -> SocketAddr {
        self.peer
    }
}
