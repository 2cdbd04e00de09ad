//! `KidPaintServer` builder and accept loop.
//!
//! This is the entry point for running a studio. It ties together all the
//! layers: transport → protocol → studio actor, plus the discovery
//! responder.

use std::net::SocketAddr;

use kidpaint_studio::{StudioConfig, StudioHandle, spawn_studio};
use kidpaint_transport::{TcpTransport, Transport};

use crate::discovery::{DISCOVERY_PORT, DiscoveryResponder, discovery_reply};
use crate::handler::handle_connection;
use crate::KidPaintError;

/// Default TCP port for studio connections.
pub const DEFAULT_PORT: u16 = 12345;

/// Builder for configuring and starting a studio server.
///
/// # Example
///
/// ```rust,ignore
/// use kidpaint::prelude::*;
///
/// let server = KidPaintServer::builder()
///     .bind("0.0.0.0:12345")
///     .config(StudioConfig { mode: GameMode::DrawAndGuess, ..Default::default() })
///     .build()
///     .await?;
/// server.run().await
/// ```
pub struct KidPaintServerBuilder {
    bind_addr: String,
    discovery_addr: Option<String>,
    config: StudioConfig,
    channel_size: usize,
}

impl KidPaintServerBuilder {
    /// Creates a new builder with default settings.
    pub fn new() -> Self {
        Self {
            bind_addr: format!("0.0.0.0:{DEFAULT_PORT}"),
            discovery_addr: Some(format!("0.0.0.0:{DISCOVERY_PORT}")),
            config: StudioConfig::default(),
            channel_size: 1024,
        }
    }

    /// Sets the TCP address to bind to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.bind_addr = addr.to_string();
        self
    }

    /// Sets the UDP address for discovery probes.
    pub fn discovery_bind(mut self, addr: &str) -> Self {
        self.discovery_addr = Some(addr.to_string());
        self
    }

    /// Turns off the discovery responder.
    pub fn no_discovery(mut self) -> Self {
        self.discovery_addr = None;
        self
    }

    /// Sets the studio configuration.
    pub fn config(mut self, config: StudioConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets the capacity of the studio's command queue.
    pub fn channel_size(mut self, size: usize) -> Self {
        self.channel_size = size;
        self
    }

    /// Validates the config, binds TCP then UDP, and spawns the studio.
    ///
    /// # Errors
    /// An invalid config or a failed bind. Nothing is left running on
    /// error.
    pub async fn build(self) -> Result<KidPaintServer, KidPaintError> {
        self.config.validate()?;

        let transport = TcpTransport::bind(self.bind_addr.as_str()).await?;
        let tcp_port = transport.local_addr()?.port();

        let discovery = match &self.discovery_addr {
            Some(addr) => {
                let reply =
                    discovery_reply(&self.config.name, tcp_port, self.config.mode);
                Some(DiscoveryResponder::bind(addr, reply).await?)
            }
            None => None,
        };

        let studio = spawn_studio(self.config, self.channel_size)?;

        Ok(KidPaintServer {
            transport,
            discovery,
            studio,
        })
    }
}

impl Default for KidPaintServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound studio server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct KidPaintServer {
    transport: TcpTransport,
    discovery: Option<DiscoveryResponder>,
    studio: StudioHandle,
}

impl KidPaintServer {
    /// Creates a new builder.
    pub fn builder() -> KidPaintServerBuilder {
        KidPaintServerBuilder::new()
    }

    /// Returns the TCP address the server is bound to.
    pub fn local_addr(&self) -> Result<SocketAddr, KidPaintError> {
        Ok(self.transport.local_addr()?)
    }

    /// Returns the discovery socket's address, if discovery is on.
    pub fn discovery_addr(&self) -> Option<SocketAddr> {
        self.discovery.as_ref().map(DiscoveryResponder::local_addr)
    }

    /// A handle to the studio actor, e.g. for status queries.
    pub fn studio(&self) -> StudioHandle {
        self.studio.clone()
    }

    /// Runs the server accept loop.
    ///
    /// Starts the discovery responder, then accepts connections and
    /// spawns a handler task for each. Runs until the process is
    /// terminated.
    pub async fn run(mut self) -> Result<(), KidPaintError> {
        tracing::info!(addr = %self.local_addr()?, "KidPaint server running");

        if let Some(discovery) = self.discovery.take() {
            tokio::spawn(discovery.run());
        }

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let studio = self.studio.clone();
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, studio).await {
                            tracing::debug!(
                                error = %e,
                                "connection ended with error"
                            );
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
