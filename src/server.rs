//! Listener, connection admission and lifecycle.

use std::{
    sync::{
        atomic::{AtomicU64, AtomicUsize, Ordering},
        Arc,
    },
    time::Duration,
};

use tokio::{
    io::{AsyncRead, AsyncWrite, AsyncWriteExt},
    net::TcpListener,
    sync::{watch, Mutex},
    task::{JoinHandle, JoinSet},
};
use tracing::{debug, error, info, warn};

use crate::{
    commands::CommandDispatcher,
    config::{ConfigError, ServerConfig},
    connection::handle_connection,
    key_value_store::Database,
    resp::RespValue,
    state::{ClientId, ServerState, SharedState},
};

const MAX_CLIENTS_REACHED: &str = "ERR max number of clients reached";

/// Pause after a failed accept so a persistent error such as running out of
/// file descriptors does not spin the loop.
const ACCEPT_ERROR_BACKOFF: Duration = Duration::from_millis(100);

/// Decrements the active connection count when a handler finishes.
struct ConnectionSlot {
    active: Arc<AtomicUsize>,
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.active.fetch_sub(1, Ordering::SeqCst);
    }
}

/// An embeddable server. Cloning yields another handle to the same server.
#[derive(Clone)]
pub struct Server {
    state: SharedState,
    dispatcher: Arc<CommandDispatcher>,
    max_connections: Arc<AtomicUsize>,
    active_connections: Arc<AtomicUsize>,
    next_client_id: Arc<AtomicU64>,
    shutdown: Arc<watch::Sender<bool>>,
}

impl Server {
    pub fn new(config: ServerConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let (shutdown, _) = watch::channel(false);

        Ok(Self {
            state: Arc::new(Mutex::new(ServerState::new(config.database_count))),
            dispatcher: Arc::new(CommandDispatcher::new()),
            max_connections: Arc::new(AtomicUsize::new(config.max_connections)),
            active_connections: Arc::new(AtomicUsize::new(0)),
            next_client_id: Arc::new(AtomicU64::new(1)),
            shutdown: Arc::new(shutdown),
        })
    }

    /// Changes the number of databases and the connection limit.
    ///
    /// Databases beyond the new count are dropped with their contents.
    /// Connections already open are kept even if they exceed the new limit.
    pub async fn configure(
        &self,
        database_count: usize,
        max_connections: usize,
    ) -> Result<(), ConfigError> {
        ServerConfig::new()
            .with_database_count(database_count)
            .with_max_connections(max_connections)
            .validate()?;

        self.state.lock().await.store.resize(database_count);
        self.max_connections.store(max_connections, Ordering::SeqCst);

        Ok(())
    }

    /// Shared state, for fixtures that need to inspect or seed data without
    /// going over the wire.
    pub fn state(&self) -> SharedState {
        self.state.clone()
    }

    /// Runs `f` on database `index` under the state lock. Returns `None` when
    /// the database does not exist.
    pub async fn with_database<F, T>(&self, index: usize, f: F) -> Option<T>
    where
        F: FnOnce(&mut Database) -> T,
    {
        let mut state = self.state.lock().await;
        state.store.database(index).map(f)
    }

    pub fn active_connections(&self) -> usize {
        self.active_connections.load(Ordering::SeqCst)
    }

    /// Spawns the accept loop on `listener`.
    pub fn start(&self, listener: TcpListener) -> JoinHandle<()> {
        let server = self.clone();
        tokio::spawn(async move { server.run(listener).await })
    }

    /// Accepts connections until [`Server::stop`] is called, then waits for
    /// every open connection to finish.
    pub async fn run(&self, listener: TcpListener) {
        if let Ok(address) = listener.local_addr() {
            info!("Server listening on {}", address);
        }

        let mut shutdown = self.shutdown.subscribe();
        let mut connections = JoinSet::new();

        loop {
            if *shutdown.borrow_and_update() {
                break;
            }

            tokio::select! {
                result = listener.accept() => {
                    match result {
                        Ok((stream, address)) => {
                            debug!("Accepted connection from {}", address);
                            let server = self.clone();
                            connections.spawn(async move {
                                server.accept(stream).await;
                                debug!("Client disconnected: {}", address);
                            });
                        }
                        Err(e) => {
                            error!("Accept error: {}", e);
                            tokio::time::sleep(ACCEPT_ERROR_BACKOFF).await;
                        }
                    }
                }
                Some(finished) = connections.join_next(), if !connections.is_empty() => {
                    if let Err(e) = finished {
                        warn!("Connection task failed: {}", e);
                    }
                }
                _ = shutdown.changed() => {
                    break;
                }
            }
        }

        info!("Server shutting down");
        drop(listener);

        while let Some(finished) = connections.join_next().await {
            if let Err(e) = finished {
                warn!("Connection task failed: {}", e);
            }
        }
    }

    /// Serves one client on `stream` until it disconnects.
    ///
    /// When the connection limit is reached the client is sent an error and
    /// the stream is closed.
    pub async fn accept<S>(&self, mut stream: S)
    where
        S: AsyncRead + AsyncWrite + Unpin,
    {
        let Some(slot) = self.acquire_slot() else {
            warn!("Connection limit reached, rejecting client");
            let reply = RespValue::Error(MAX_CLIENTS_REACHED.to_string()).encode();
            if let Err(e) = stream.write_all(&reply).await {
                debug!("Failed to notify rejected client: {}", e);
            }
            let _ = stream.shutdown().await;
            return;
        };

        let client_id = ClientId(self.next_client_id.fetch_add(1, Ordering::SeqCst));
        debug!(client = client_id.0, "client connected");

        if let Err(e) = handle_connection(
            stream,
            client_id,
            self.state.clone(),
            self.dispatcher.clone(),
            self.shutdown.subscribe(),
        )
        .await
        {
            debug!(client = client_id.0, "connection error: {}", e);
        }

        drop(slot);
    }

    /// Stops accepting connections and closes idle ones.
    pub fn stop(&self) {
        self.shutdown.send_replace(true);
    }

    fn acquire_slot(&self) -> Option<ConnectionSlot> {
        let limit = self.max_connections.load(Ordering::SeqCst);
        self.active_connections
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |active| {
                (active < limit).then_some(active + 1)
            })
            .ok()
            .map(|_| ConnectionSlot {
                active: self.active_connections.clone(),
            })
    }
}
