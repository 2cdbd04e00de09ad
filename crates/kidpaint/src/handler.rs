//! Per-connection handler: name handshake, outbound writer and the read
//! loop that feeds the studio.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Read the first message, which must be `Name`
//!   2. Spawn the writer task that drains this session's outbound queue
//!   3. Join the studio (a rejected name gets one SYSTEM line, then close)
//!   4. Loop: decode client messages → forward them to the studio

use kidpaint_protocol::{
    ClientMessage, Codec, FrameReader, ProtocolError, ServerMessage, SessionId,
};
use kidpaint_studio::{StudioError, StudioHandle};
use kidpaint_transport::Connection;
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tokio::sync::mpsc;

use crate::KidPaintError;

/// Drop guard that removes the session from the studio when the handler
/// exits, however it exits.
///
/// `Drop` is synchronous, so the leave is sent without waiting.
struct SessionGuard {
    id: SessionId,
    studio: StudioHandle,
}

impl Drop for SessionGuard {
    fn drop(&mut self) {
        self.studio.leave_detached(self.id);
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Connection>(
    conn: C,
    studio: StudioHandle,
) -> Result<(), KidPaintError> {
    let conn_id = conn.id();
    let addr = conn.peer_addr();
    let id = SessionId(conn_id.into_inner());
    tracing::debug!(%conn_id, %addr, "handling new connection");

    let (reader, writer) = conn.into_split();
    let mut frames = FrameReader::new(reader);

    // --- Step 1: Handshake ---
    let name = match frames.next_message::<ClientMessage>().await? {
        Some(ClientMessage::Name { name }) => name,
        Some(other) => {
            return Err(ProtocolError::InvalidMessage(format!(
                "first message must be Name, got tag {}",
                other.tag()
            ))
            .into());
        }
        None => {
            tracing::debug!(%conn_id, "closed before handshake");
            return Ok(());
        }
    };

    // --- Step 2: Writer ---
    let (tx, rx) = mpsc::unbounded_channel();
    let writer_task = tokio::spawn(write_loop(writer, rx, id));

    // --- Step 3: Join ---
    if let Err(e) = studio.join(id, name.clone(), tx.clone()).await {
        tracing::info!(session_id = %id, %name, error = %e, "join rejected");
        let _ = tx.send(ServerMessage::system(&e));
        // Last sender gone: the writer flushes the notice and closes.
        drop(tx);
        let _ = writer_task.await;
        return Err(e.into());
    }
    // From here on the studio holds the only sender.
    drop(tx);
    let _guard = SessionGuard {
        id,
        studio: studio.clone(),
    };
    tracing::info!(session_id = %id, %name, %addr, "session started");

    // --- Step 4: Message loop ---
    loop {
        match frames.next_message::<ClientMessage>().await {
            Ok(Some(msg)) => {
                if studio.send_message(id, msg).await.is_err() {
                    return Err(StudioError::Unavailable.into());
                }
            }
            Ok(None) => {
                tracing::info!(session_id = %id, %name, "connection closed");
                return Ok(());
            }
            Err(e) => {
                tracing::debug!(session_id = %id, %name, error = %e, "read failed, dropping session");
                return Err(e.into());
            }
        }
    }
}

/// Encodes and writes everything queued for one session.
///
/// Ends when the queue's last sender is dropped (the session left the
/// studio) or the peer stops accepting writes.
async fn write_loop<W: AsyncWrite + Unpin>(
    mut writer: W,
    mut rx: mpsc::UnboundedReceiver<ServerMessage>,
    id: SessionId,
) {
    let mut buf = Vec::new();
    while let Some(msg) = rx.recv().await {
        buf.clear();
        encode_or_skip(&msg, &mut buf, id);
        // Coalesce whatever else is already queued into one write.
        while let Ok(more) = rx.try_recv() {
            encode_or_skip(&more, &mut buf, id);
        }

        if let Err(e) = writer.write_all(&buf).await {
            tracing::debug!(session_id = %id, error = %e, "write failed");
            return;
        }
    }
    let _ = writer.shutdown().await;
}

fn encode_or_skip(msg: &ServerMessage, buf: &mut Vec<u8>, id: SessionId) {
    let start = buf.len();
    if let Err(e) = msg.encode_into(buf) {
        buf.truncate(start);
        tracing::warn!(session_id = %id, tag = msg.tag(), error = %e, "dropping unencodable message");
    }
}
