//! Per-connection handler: frame decoding, pings, and event delivery.
//!
//! Each accepted connection gets two Tokio tasks:
//!   1. the reader (this task) decodes intents and forwards them to the
//!      router, answering `ping` and malformed frames itself;
//!   2. the writer drains the connection's event channel, wraps each event
//!      in an [`Envelope`] and sends it.
//!
//! Everything outbound goes through the one channel, so sequence numbers
//! are assigned in a single place and never interleave.

use std::sync::Arc;
use std::time::Duration;

use noughts_protocol::{Codec, Envelope, Event, Intent};
use noughts_transport::{Connection, ConnectionId, WebSocketConnection};
use tokio::sync::mpsc;

use crate::router::{EventSender, RouterHandle};
use crate::server::ServerState;
use crate::{NoughtsError, RouterError};

/// How long the writer may keep flushing after the reader has stopped.
const WRITER_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// Drop guard that unregisters the connection when the handler exits.
///
/// Cleanup also runs if the handler panics. `Drop` is synchronous, so the
/// async disconnect is spawned as a fire-and-forget task.
struct DisconnectGuard {
    conn_id: ConnectionId,
    router: RouterHandle,
}

impl Drop for DisconnectGuard {
    fn drop(&mut self) {
        let conn_id = self.conn_id;
        let router = self.router.clone();
        tokio::spawn(async move {
            if let Err(e) = router.disconnect(conn_id).await {
                tracing::debug!(%conn_id, error = %e, "disconnect not delivered");
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), NoughtsError> {
    let conn_id = conn.id();
    let peer = conn.peer_addr();
    tracing::info!(%conn_id, %peer, "connection opened");

    let conn = Arc::new(conn);
    let (events_tx, events_rx) = mpsc::unbounded_channel();

    state.router.connect(conn_id, events_tx.clone()).await?;
    let guard = DisconnectGuard {
        conn_id,
        router: state.router.clone(),
    };

    let writer = tokio::spawn(write_events(
        Arc::clone(&conn),
        events_rx,
        Arc::clone(&state),
    ));

    let result = read_intents(&conn, &state, &events_tx).await;

    // Once both this sender and the router's copy are gone the writer
    // flushes what is left and stops.
    drop(events_tx);
    drop(guard);
    if tokio::time::timeout(WRITER_DRAIN_TIMEOUT, writer).await.is_err() {
        tracing::debug!(%conn_id, "writer still busy at close");
    }
    if let Err(e) = conn.close().await {
        tracing::debug!(%conn_id, error = %e, "close failed");
    }

    tracing::info!(%conn_id, "connection closed");
    result
}

/// Reads frames until the peer goes away, errors, or idles out.
async fn read_intents<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    replies: &EventSender,
) -> Result<(), NoughtsError> {
    let conn_id = conn.id();

    loop {
        let received = match state.idle_timeout {
            Some(limit) => match tokio::time::timeout(limit, conn.recv()).await {
                Ok(received) => received,
                Err(_) => {
                    tracing::info!(%conn_id, "connection idle, closing");
                    break;
                }
            },
            None => conn.recv().await,
        };

        let data = match received {
            Ok(Some(data)) => data,
            Ok(None) => {
                tracing::debug!(%conn_id, "peer closed the connection");
                break;
            }
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "recv error");
                break;
            }
        };

        let intent: Intent = match state.codec.decode(&data) {
            Ok(intent) => intent,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "rejecting malformed frame");
                let _ = replies.send(RouterError::InvalidPayload(e.to_string()).to_event());
                continue;
            }
        };

        match intent {
            Intent::Ping { client_time } => {
                let _ = replies.send(Event::Pong {
                    client_time,
                    server_time: state.elapsed_ms(),
                });
            }
            intent => state.router.intent(conn_id, intent).await?,
        }
    }

    Ok(())
}

/// Drains the event channel onto the socket.
async fn write_events<C: Codec>(
    conn: Arc<WebSocketConnection>,
    mut events: mpsc::UnboundedReceiver<Event>,
    state: Arc<ServerState<C>>,
) {
    let conn_id = conn.id();
    let mut seq: u64 = 1;

    while let Some(event) = events.recv().await {
        let kind = event.kind();
        let envelope = Envelope {
            seq: next_seq(&mut seq),
            timestamp: state.elapsed_ms(),
            body: event,
        };

        let bytes = match state.codec.encode(&envelope) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(%conn_id, kind, error = %e, "failed to encode event");
                continue;
            }
        };

        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(%conn_id, kind, error = %e, "send failed, stopping writer");
            break;
        }
    }
}

/// Increments and returns the next sequence number.
fn next_seq(seq: &mut u64) -> u64 {
    let current = *seq;
    *seq += 1;
    current
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_next_seq_counts_up_from_start() {
        let mut seq = 1;
        assert_eq!(next_seq(&mut seq), 1);
        assert_eq!(next_seq(&mut seq), 2);
        assert_eq!(seq, 3);
    }
}
