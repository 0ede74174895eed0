//! Server builder and accept loop.

use std::sync::Arc;

use cuckoo_protocol::JsonCodec;
use cuckoo_room::{RoomConfig, RoomRegistry};
use cuckoo_transport::{Transport, WebSocketTransport};
use tokio::sync::Mutex;

use crate::ServerError;
use crate::handler::handle_connection;

/// Shared server state passed to every connection handler task.
///
/// The registry is the only cross-connection mutable structure; it sits
/// behind a `Mutex` and is locked only for point operations, never
/// across room broadcasts.
pub(crate) struct ServerState {
    pub(crate) registry: Mutex<RoomRegistry>,
    pub(crate) codec: JsonCodec,
}

/// Builder for configuring and starting a Cuckoo server.
pub struct CuckooServerBuilder {
    bind_addr: String,
    room_config: RoomConfig,
}

impl CuckooServerBuilder {
    /// Creates a builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            room_config: RoomConfig::default(),
        }
    }

    /// Sets the address to bind the server to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the configuration applied to every room.
    pub fn room_config(mut self, config: RoomConfig) -> Self {
        self.room_config = config;
        self
    }

    /// Binds the transport and builds the server.
    pub async fn build(self) -> Result<CuckooServer, ServerError> {
        let transport = WebSocketTransport::bind(&self.bind_addr).await?;

        let state = Arc::new(ServerState {
            registry: Mutex::new(RoomRegistry::new(self.room_config)),
            codec: JsonCodec,
        });

        Ok(CuckooServer { transport, state })
    }
}

impl Default for CuckooServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A running Cuckoo game server. Call [`CuckooServer::run`] to start
/// accepting connections.
pub struct CuckooServer {
    transport: WebSocketTransport,
    state: Arc<ServerState>,
}

impl CuckooServer {
    /// Creates a new builder.
    pub fn builder() -> CuckooServerBuilder {
        CuckooServerBuilder::new()
    }

    /// The local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// Runs the accept loop: one handler task per connection, until the
    /// process is terminated.
    pub async fn run(mut self) -> Result<(), ServerError> {
        tracing::info!("Cuckoo server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::error!(error = %e, "accept failed");
                }
            }
        }
    }
}
