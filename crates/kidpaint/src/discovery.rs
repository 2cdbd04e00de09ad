//! LAN discovery: answers UDP probes with the studio's advert.
//!
//! Clients broadcast [`DISCOVERY_REQUEST`] to [`DISCOVERY_PORT`]; every
//! studio on the network answers the sender with
//! `KIDPAINT_STUDIO:<name>:<tcp port>:<mode label>`. The responder only
//! knows this fixed advert and never touches studio state.

use std::net::SocketAddr;

use kidpaint_studio::GameMode;
use kidpaint_transport::TransportError;
use tokio::net::UdpSocket;
use tracing::{debug, info, warn};

/// Well-known UDP port for discovery probes.
pub const DISCOVERY_PORT: u16 = 12346;

/// The exact probe payload clients send.
pub const DISCOVERY_REQUEST: &str = "KIDPAINT_DISCOVERY_REQUEST";

const REPLY_PREFIX: &str = "KIDPAINT_STUDIO";

/// Largest probe we bother reading. Longer datagrams are truncated and
/// therefore never match.
const MAX_DATAGRAM: usize = 1024;

/// Builds the advert a studio sends in reply to a probe.
pub fn discovery_reply(name: &str, tcp_port: u16, mode: GameMode) -> String {
    format!("{REPLY_PREFIX}:{name}:{tcp_port}:{}", mode.label())
}

/// Answers discovery probes on a UDP socket.
pub struct DiscoveryResponder {
    socket: UdpSocket,
    local_addr: SocketAddr,
    reply: String,
}

impl DiscoveryResponder {
    /// Binds the discovery socket.
    ///
    /// # Errors
    /// [`TransportError::BindFailed`] if the port is taken, or
    /// [`TransportError::Address`] if the bound address can't be read.
    pub async fn bind(addr: &str, reply: String) -> Result<Self, TransportError> {
        let socket = UdpSocket::bind(addr)
            .await
            .map_err(|source| TransportError::BindFailed {
                addr: addr.to_string(),
                source,
            })?;
        let local_addr = socket.local_addr().map_err(TransportError::Address)?;
        info!(%local_addr, %reply, "discovery responder bound");
        Ok(Self {
            socket,
            local_addr,
            reply,
        })
    }

    pub fn local_addr(&self) -> SocketAddr {
        self.local_addr
    }

    /// Serves probes forever. Socket errors are logged and skipped.
    pub async fn run(self) {
        let mut buf = [0u8; MAX_DATAGRAM];
        loop {
            let (len, peer) = match self.socket.recv_from(&mut buf).await {
                Ok(received) => received,
                Err(e) => {
                    warn!(error = %e, "discovery receive failed");
                    continue;
                }
            };

            if &buf[..len] != DISCOVERY_REQUEST.as_bytes() {
                debug!(%peer, bytes = len, "ignoring non-discovery datagram");
                continue;
            }

            match self.socket.send_to(self.reply.as_bytes(), peer).await {
                Ok(_) => debug!(%peer, "answered discovery probe"),
                Err(e) => warn!(%peer, error = %e, "discovery reply failed"),
            }
        }
    }
}
