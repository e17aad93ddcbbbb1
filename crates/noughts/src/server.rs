//! `NoughtsServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → router → session store.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};

use noughts_protocol::{Codec, JsonCodec};
use noughts_session::{SessionConfig, Store};
use noughts_transport::{Handshake, Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::router::{spawn_router, Router, RouterHandle};
use crate::{NoughtsError, ServerConfig};

/// Shared state handed to every connection task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) router: RouterHandle,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Option<Duration>,
    started: Instant,
}

impl<C: Codec> ServerState<C> {
    /// Milliseconds since the server started, used as the event clock.
    pub(crate) fn elapsed_ms(&self) -> u64 {
        u64::try_from(self.started.elapsed().as_millis()).unwrap_or(u64::MAX)
    }
}

/// Builder for configuring and starting a Noughts server.
///
/// # Example
///
/// ```rust,no_run
/// use noughts::NoughtsServer;
///
/// # async fn start() -> Result<(), noughts::NoughtsError> {
/// let server = NoughtsServer::builder()
///     .bind("0.0.0.0:8080")
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct NoughtsServerBuilder {
    config: ServerConfig,
}

impl NoughtsServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the whole configuration, e.g. one from
    /// [`ServerConfig::from_env`].
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the session expiry configuration.
    pub fn session_config(mut self, config: SessionConfig) -> Self {
        self.config.session = config;
        self
    }

    /// Closes connections that send nothing for `timeout`.
    pub fn idle_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    pub fn max_name_len(mut self, len: usize) -> Self {
        self.config.max_name_len = len;
        self
    }

    /// Validates the configuration, binds the listener and starts the
    /// router task.
    ///
    /// Uses `JsonCodec` and `WebSocketTransport`.
    pub async fn build(self) -> Result<NoughtsServer<JsonCodec>, NoughtsError> {
        let config = self.config;
        config.validate()?;

        let transport = WebSocketTransport::bind(&config.bind_addr).await?;

        let store = Store::new(config.session.clone());
        let router = spawn_router(
            Router::new(store, config.max_name_len),
            config.session.sweep_interval,
            config.command_buffer,
        );

        let state = Arc::new(ServerState {
            router,
            codec: JsonCodec,
            idle_timeout: config.idle_timeout,
            started: Instant::now(),
        });

        Ok(NoughtsServer { transport, state })
    }
}

/// A bound Noughts server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct NoughtsServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl NoughtsServer<JsonCodec> {
    /// Creates a new builder.
    pub fn builder() -> NoughtsServerBuilder {
        NoughtsServerBuilder::new()
    }
}

impl<C: Codec> NoughtsServer<C> {
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> Result<std::net::SocketAddr, NoughtsError> {
        Ok(self.transport.local_addr()?)
    }

    /// A handle to the router task, for inspecting live counts.
    pub fn router(&self) -> RouterHandle {
        self.state.router.clone()
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// The loop only takes TCP connections. Each one gets its own task,
    /// which runs the WebSocket handshake and then the handler, so a client
    /// that stalls mid-upgrade delays nobody else. Failures are logged and
    /// the loop carries on.
    pub async fn run(mut self) -> Result<(), NoughtsError> {
        tracing::info!("Noughts server running");

        loop {
            match self.transport.accept().await {
                Ok(handshake) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        let peer = handshake.peer_addr();
                        let conn = match handshake.complete().await {
                            Ok(conn) => conn,
                            Err(e) => {
                                tracing::debug!(%peer, error = %e, "handshake failed");
                                return;
                            }
                        };
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        }
    }

    /// Like [`run`](Self::run), but returns once `shutdown` completes.
    pub async fn run_until<F>(self, shutdown: F) -> Result<(), NoughtsError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.run() => result,
            () = shutdown => {
                tracing::info!("shutdown requested, no longer accepting connections");
                Ok(())
            }
        }
    }
}
