//! The connection event router.
//!
//! [`Router`] is the synchronous core: it knows every connection's display
//! name, current session and outbound channel, and turns one [`Intent`]
//! into store operations plus the events that follow from them. Each call
//! finishes all its mutation and all its sends before returning.
//!
//! [`spawn_router`] moves a `Router` into its own Tokio task (an actor).
//! Connection handlers talk to it through a cloneable [`RouterHandle`],
//! so intents from different connections are applied one at a time in
//! arrival order. The idle-session sweep runs as a second branch of the
//! same loop and therefore never interleaves with an intent.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use noughts_protocol::{Event, Intent, MoveTarget, PlayerId, SessionId};
use noughts_session::{Departure, MatchOutcome, Player, SessionError, Store};
use noughts_transport::ConnectionId;
use tokio::sync::{mpsc, oneshot};

use crate::{NoughtsError, RouterError};

/// Channel on which the router delivers events to one connection.
pub type EventSender = mpsc::UnboundedSender<Event>;

/// Shortest sweep period the actor will run with.
const MIN_SWEEP_INTERVAL: Duration = Duration::from_millis(10);

/// A connection is a player: the two ids share the same number.
fn player_id(conn: ConnectionId) -> PlayerId {
    PlayerId(conn.into_inner())
}

fn connection_id(player: PlayerId) -> ConnectionId {
    ConnectionId::new(player.0)
}

/// Per-connection routing data.
#[derive(Debug)]
struct ConnectionEntry {
    name: Option<String>,
    session: Option<SessionId>,
    sender: EventSender,
}

/// Counts for diagnostics and tests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RouterStats {
    pub connections: usize,
    pub sessions: usize,
    pub queued: usize,
}

/// Maps intents to session operations and fans out the resulting events.
pub struct Router {
    store: Store,
    connections: HashMap<ConnectionId, ConnectionEntry>,
    max_name_len: usize,
}

impl Router {
    pub fn new(store: Store, max_name_len: usize) -> Self {
        Self {
            store,
            connections: HashMap::new(),
            max_name_len,
        }
    }

    pub fn store(&self) -> &Store {
        &self.store
    }

    pub fn stats(&self) -> RouterStats {
        RouterStats {
            connections: self.connections.len(),
            sessions: self.store.registry().len(),
            queued: self.store.queue().len(),
        }
    }

    /// The session `conn` currently belongs to, as far as the router knows.
    pub fn session_of(&self, conn: ConnectionId) -> Option<&SessionId> {
        self.connections.get(&conn).and_then(|e| e.session.as_ref())
    }

    /// Registers a new connection with no name and no session.
    pub fn connect(&mut self, conn: ConnectionId, sender: EventSender) {
        self.connections.insert(
            conn,
            ConnectionEntry {
                name: None,
                session: None,
                sender,
            },
        );
        tracing::debug!(%conn, connections = self.connections.len(), "connection registered");
    }

    /// Applies one intent from `conn`.
    ///
    /// A refused intent produces a single `error` event for `conn` and no
    /// other output.
    pub fn handle(&mut self, conn: ConnectionId, intent: Intent, now: Instant) {
        if !self.connections.contains_key(&conn) {
            tracing::warn!(%conn, kind = intent.kind(), "intent from unknown connection, ignoring");
            return;
        }

        let kind = intent.kind();
        if let Err(err) = self.dispatch(conn, intent, now) {
            tracing::debug!(%conn, kind, code = err.code(), error = %err, "intent refused");
            self.send(conn, err.to_event());
        }
    }

    /// Forgets `conn`, leaving its session and cancelling its ticket.
    pub fn disconnect(&mut self, conn: ConnectionId) {
        self.leave_current(conn);
        if self.connections.remove(&conn).is_some() {
            tracing::debug!(%conn, connections = self.connections.len(), "connection removed");
        }
    }

    /// Reaps idle sessions and detaches whoever was still in them.
    pub fn sweep(&mut self, now: Instant) -> Vec<SessionId> {
        let expired = self.store.sweep_expired(now);
        if expired.is_empty() {
            return expired;
        }

        for entry in self.connections.values_mut() {
            if let Some(session_id) = entry.session.take_if(|id| expired.contains(id)) {
                let _ = entry.sender.send(Event::SessionExpired { session_id });
            }
        }
        expired
    }

    fn dispatch(
        &mut self,
        conn: ConnectionId,
        intent: Intent,
        now: Instant,
    ) -> Result<(), RouterError> {
        match intent {
            Intent::SetName { name } => self.set_name(conn, &name),
            Intent::CreateSession => self.create_session(conn, now),
            Intent::JoinSession { session_id } => self.join_session(conn, session_id, now),
            Intent::RequestRandomMatch => self.request_random_match(conn, now),
            Intent::MakeMove { position, row, col } => {
                let target = MoveTarget::from_fields(position, row, col)?;
                self.make_move(conn, target, now)
            }
            Intent::ResetSession => self.reset_session(conn, now),
            Intent::LeaveSession => self.leave_session(conn),
            Intent::Ping { .. } => {
                // Answered by the connection handler.
                Ok(())
            }
        }
    }

    fn set_name(&mut self, conn: ConnectionId, name: &str) -> Result<(), RouterError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(RouterError::InvalidName("name must not be empty".into()));
        }
        if name.chars().count() > self.max_name_len {
            return Err(RouterError::InvalidName(format!(
                "name must be at most {} characters",
                self.max_name_len
            )));
        }

        if let Some(entry) = self.connections.get_mut(&conn) {
            entry.name = Some(name.to_string());
        }
        tracing::info!(%conn, name, "name set");
        self.send(conn, Event::NameSet { name: name.to_string() });
        Ok(())
    }

    fn create_session(&mut self, conn: ConnectionId, now: Instant) -> Result<(), RouterError> {
        let player = self.named_player(conn)?;
        self.leave_current(conn);

        let state = self.store.create_session(player, now);
        let session_id = state.session_id.clone();
        self.set_session(conn, Some(session_id.clone()));
        self.send(conn, Event::SessionCreated { session_id, state });
        Ok(())
    }

    fn join_session(
        &mut self,
        conn: ConnectionId,
        session_id: SessionId,
        now: Instant,
    ) -> Result<(), RouterError> {
        let player = self.named_player(conn)?;
        self.store.check_joinable(&session_id, player.id)?;
        self.leave_current(conn);

        let joined = self.store.join_session(&session_id, player, now)?;
        self.set_session(conn, Some(session_id.clone()));

        self.broadcast(&session_id, &Event::PlayerJoined {
            state: joined.snapshot.clone(),
        });
        if joined.started {
            self.broadcast(&session_id, &Event::SessionStarted {
                state: joined.snapshot,
            });
        }
        Ok(())
    }

    fn request_random_match(
        &mut self,
        conn: ConnectionId,
        now: Instant,
    ) -> Result<(), RouterError> {
        let player = self.named_player(conn)?;
        self.leave_current(conn);

        let outcome = self.store.request_match(player, now);
        let session_id = outcome.session_id().clone();
        self.set_session(conn, Some(session_id.clone()));

        let state = self
            .store
            .snapshot(&session_id)
            .ok_or_else(|| SessionError::NotFound(session_id.clone()))?;
        match outcome {
            MatchOutcome::Waiting(_) => {
                self.send(conn, Event::MatchWaiting { session_id, state });
            }
            MatchOutcome::Paired(_) => {
                self.broadcast(&session_id, &Event::SessionStarted { state });
            }
        }
        Ok(())
    }

    fn make_move(
        &mut self,
        conn: ConnectionId,
        target: MoveTarget,
        now: Instant,
    ) -> Result<(), RouterError> {
        let session_id = self.current_session(conn)?;
        let state = self
            .store
            .make_move(&session_id, player_id(conn), target, now)?;
        self.broadcast(&session_id, &Event::MoveMade { state });
        Ok(())
    }

    fn reset_session(&mut self, conn: ConnectionId, now: Instant) -> Result<(), RouterError> {
        let session_id = self.current_session(conn)?;
        let state = self.store.reset(&session_id, player_id(conn), now)?;
        self.broadcast(&session_id, &Event::SessionReset { state });
        Ok(())
    }

    fn leave_session(&mut self, conn: ConnectionId) -> Result<(), RouterError> {
        let session_id = self.current_session(conn)?;
        self.leave_current(conn);
        self.send(conn, Event::SessionLeft { session_id });
        Ok(())
    }

    /// Builds the seated form of `conn`, which must have a name.
    fn named_player(&self, conn: ConnectionId) -> Result<Player, RouterError> {
        let name = self
            .connections
            .get(&conn)
            .and_then(|e| e.name.clone())
            .ok_or(RouterError::NotNamed)?;
        Ok(Player::new(player_id(conn), name))
    }

    /// The live session `conn` is in.
    ///
    /// A session id that no longer resolves (reaped or emptied) is cleared
    /// and reported as [`SessionError::NotFound`].
    fn current_session(&mut self, conn: ConnectionId) -> Result<SessionId, RouterError> {
        let session_id = self
            .session_of(conn)
            .cloned()
            .ok_or(RouterError::NotInSession)?;
        if self.store.registry().contains(&session_id) {
            return Ok(session_id);
        }

        self.set_session(conn, None);
        Err(SessionError::NotFound(session_id).into())
    }

    fn set_session(&mut self, conn: ConnectionId, session: Option<SessionId>) {
        if let Some(entry) = self.connections.get_mut(&conn) {
            entry.session = session;
        }
    }

    /// Takes `conn` out of its current session, if any, and tells whoever
    /// stays behind.
    fn leave_current(&mut self, conn: ConnectionId) {
        let current = self
            .connections
            .get_mut(&conn)
            .and_then(|e| e.session.take());
        let Some(session_id) = current else {
            return;
        };

        if let Some(departure) = self.store.leave(&session_id, player_id(conn)) {
            self.notify_departure(&departure);
        }
    }

    fn notify_departure(&self, departure: &Departure) {
        for &player in &departure.remaining {
            self.send(connection_id(player), Event::OpponentLeft);
        }
    }

    /// Sends to one connection. A closed channel means the connection is
    /// already going away, so the event is dropped.
    fn send(&self, conn: ConnectionId, event: Event) {
        if let Some(entry) = self.connections.get(&conn) {
            let _ = entry.sender.send(event);
        }
    }

    /// Sends to every player seated in `session_id`.
    fn broadcast(&self, session_id: &SessionId, event: &Event) {
        let Some(session) = self.store.registry().get(session_id) else {
            return;
        };
        for player in session.players() {
            self.send(connection_id(player.id), event.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// Actor
// ---------------------------------------------------------------------------

/// Commands accepted by the router task.
#[derive(Debug)]
pub enum RouterCommand {
    Connect {
        conn: ConnectionId,
        sender: EventSender,
    },
    Intent {
        conn: ConnectionId,
        intent: Intent,
    },
    Disconnect {
        conn: ConnectionId,
    },
    Stats {
        reply: oneshot::Sender<RouterStats>,
    },
}

/// Cheap, cloneable handle to the router task.
#[derive(Debug, Clone)]
pub struct RouterHandle {
    sender: mpsc::Sender<RouterCommand>,
}

impl RouterHandle {
    pub async fn connect(
        &self,
        conn: ConnectionId,
        sender: EventSender,
    ) -> Result<(), NoughtsError> {
        self.submit(RouterCommand::Connect { conn, sender }).await
    }

    /// Queues an intent. Results come back on the connection's channel.
    pub async fn intent(&self, conn: ConnectionId, intent: Intent) -> Result<(), NoughtsError> {
        self.submit(RouterCommand::Intent { conn, intent }).await
    }

    pub async fn disconnect(&self, conn: ConnectionId) -> Result<(), NoughtsError> {
        self.submit(RouterCommand::Disconnect { conn }).await
    }

    pub async fn stats(&self) -> Result<RouterStats, NoughtsError> {
        let (reply, response) = oneshot::channel();
        self.submit(RouterCommand::Stats { reply }).await?;
        response.await.map_err(|_| NoughtsError::RouterClosed)
    }

    async fn submit(&self, command: RouterCommand) -> Result<(), NoughtsError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| NoughtsError::RouterClosed)
    }
}

struct RouterActor {
    router: Router,
    receiver: mpsc::Receiver<RouterCommand>,
    sweep_interval: Duration,
}

impl RouterActor {
    async fn run(mut self) {
        tracing::info!(sweep_interval = ?self.sweep_interval, "router started");

        let mut sweep = tokio::time::interval(self.sweep_interval);
        sweep.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        // The first tick completes immediately; nothing can be idle yet.
        sweep.tick().await;

        loop {
            tokio::select! {
                command = self.receiver.recv() => match command {
                    Some(command) => self.apply(command),
                    None => break,
                },
                _ = sweep.tick() => {
                    let expired = self.router.sweep(now());
                    if !expired.is_empty() {
                        tracing::debug!(count = expired.len(), "sweep finished");
                    }
                }
            }
        }

        tracing::info!("router stopped");
    }

    fn apply(&mut self, command: RouterCommand) {
        match command {
            RouterCommand::Connect { conn, sender } => self.router.connect(conn, sender),
            RouterCommand::Intent { conn, intent } => self.router.handle(conn, intent, now()),
            RouterCommand::Disconnect { conn } => self.router.disconnect(conn),
            RouterCommand::Stats { reply } => {
                let _ = reply.send(self.router.stats());
            }
        }
    }
}

/// Current time from Tokio's clock, so paused-time tests can move it.
fn now() -> Instant {
    tokio::time::Instant::now().into_std()
}

/// Moves `router` into a new task and returns a handle to it.
///
/// `channel_size` bounds the command queue; handlers wait when it is full.
/// The task stops once every handle has been dropped.
pub fn spawn_router(router: Router, sweep_interval: Duration, channel_size: usize) -> RouterHandle {
    let (sender, receiver) = mpsc::channel(channel_size.max(1));
    let actor = RouterActor {
        router,
        receiver,
        sweep_interval: sweep_interval.max(MIN_SWEEP_INTERVAL),
    };
    tokio::spawn(actor.run());
    RouterHandle { sender }
}
