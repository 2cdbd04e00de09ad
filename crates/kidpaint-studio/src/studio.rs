//! Studio actor: one Tokio task that owns all shared state.
//!
//! Connection handlers never touch the canvas, the registry or the game
//! rules directly. They send [`StudioCommand`]s through a
//! [`StudioHandle`], and the actor applies them one at a time. The round
//! timer is polled in the same `select!` loop, so a tick can never
//! interleave with a half-applied client message.

use std::collections::HashMap;

use kidpaint_protocol::{ClientMessage, Recipient, ServerMessage, SessionId};
use kidpaint_tick::{TickConfig, TickInfo, TickScheduler};
use tokio::sync::{mpsc, oneshot};

use crate::director::{GameDirector, Outbox, TimerCommand};
use crate::{GameMode, GamePhase, StudioConfig, StudioError};

/// Channel sender for delivering outbound messages to one session.
///
/// Unbounded so a slow peer only grows its own queue instead of
/// stalling the actor.
pub type SessionSender = mpsc::UnboundedSender<ServerMessage>;

/// Commands sent to the studio actor through its channel.
pub(crate) enum StudioCommand {
    /// Register a session that completed the name handshake.
    Join {
        id: SessionId,
        name: String,
        sender: SessionSender,
        reply: oneshot::Sender<Result<(), StudioError>>,
    },

    /// Remove a session (disconnect).
    Leave { id: SessionId },

    /// Deliver a decoded client message.
    Message { id: SessionId, msg: ClientMessage },

    /// Request a status snapshot.
    GetInfo { reply: oneshot::Sender<StudioInfo> },

    /// Stop the actor.
    Shutdown,
}

/// A snapshot of studio status.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StudioInfo {
    pub name: String,
    pub mode: GameMode,
    pub phase: GamePhase,
    /// Display names in join order.
    pub players: Vec<String>,
    /// Current drawer, while a Draw & Guess round runs.
    pub drawer: Option<String>,
    /// Seconds left in the current round.
    pub remaining: Option<u32>,
}

/// Handle to a running studio actor.
///
/// Cheap to clone: it's just an `mpsc::Sender` wrapper. Every
/// connection handler holds one.
#[derive(Clone)]
pub struct StudioHandle {
    sender: mpsc::Sender<StudioCommand>,
}

impl StudioHandle {
    /// Registers a session and its outbound queue.
    ///
    /// On success the join broadcasts have already been queued, including
    /// the joiner's FullSketch and Mode.
    ///
    /// # Errors
    /// [`StudioError::Session`] if the name is rejected,
    /// [`StudioError::Unavailable`] if the actor is gone.
    pub async fn join(
        &self,
        id: SessionId,
        name: String,
        sender: SessionSender,
    ) -> Result<(), StudioError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(StudioCommand::Join {
                id,
                name,
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| StudioError::Unavailable)?;
        reply_rx.await.map_err(|_| StudioError::Unavailable)?
    }

    /// Removes a session (fire-and-forget).
    pub async fn leave(&self, id: SessionId) -> Result<(), StudioError> {
        self.sender
            .send(StudioCommand::Leave { id })
            .await
            .map_err(|_| StudioError::Unavailable)
    }

    /// Forwards a client message (fire-and-forget).
    pub async fn send_message(
        &self,
        id: SessionId,
        msg: ClientMessage,
    ) -> Result<(), StudioError> {
        self.sender
            .send(StudioCommand::Message { id, msg })
            .await
            .map_err(|_| StudioError::Unavailable)
    }

    /// Requests the current studio status.
    pub async fn info(&self) -> Result<StudioInfo, StudioError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(StudioCommand::GetInfo { reply: reply_tx })
            .await
            .map_err(|_| StudioError::Unavailable)?;
        reply_rx.await.map_err(|_| StudioError::Unavailable)
    }

    /// Tells the studio to stop.
    pub async fn shutdown(&self) -> Result<(), StudioError> {
        self.sender
            .send(StudioCommand::Shutdown)
            .await
            .map_err(|_| StudioError::Unavailable)
    }

    /// Sends a leave without waiting for channel capacity.
    ///
    /// For drop guards, which can't await. Falls back to a spawned send
    /// when the channel is full.
    pub fn leave_detached(&self, id: SessionId) {
        match self.sender.try_send(StudioCommand::Leave { id }) {
            Ok(()) => {}
            Err(mpsc::error::TrySendError::Full(cmd)) => {
                let sender = self.sender.clone();
                tokio::spawn(async move {
                    let _ = sender.send(cmd).await;
                });
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                tracing::debug!(session_id = %id, "studio gone, leave dropped");
            }
        }
    }
}

/// The internal actor state. Runs inside a Tokio task.
struct StudioActor {
    name: String,
    director: GameDirector,
    timer: TickScheduler,
    /// Per-session outbound queues, keyed by registered id.
    senders: HashMap<SessionId, SessionSender>,
    receiver: mpsc::Receiver<StudioCommand>,
}

impl StudioActor {
    /// Runs the actor loop until shutdown or until every handle is dropped.
    async fn run(mut self) {
        tracing::info!(
            studio = %self.name,
            mode = %self.director.mode(),
            "studio actor started"
        );

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => {
                    let Some(cmd) = cmd else { break };
                    if !self.handle_command(cmd) {
                        break;
                    }
                }
                info = self.timer.wait_for_tick() => {
                    let out = self.director.advance(elapsed_secs(&info));
                    self.dispatch(out);
                }
            }
            self.apply_timer_command();
        }

        self.timer.stop();
        tracing::info!(studio = %self.name, "studio actor stopped");
    }

    /// Applies one command. Returns `false` on shutdown.
    fn handle_command(&mut self, cmd: StudioCommand) -> bool {
        match cmd {
            StudioCommand::Join {
                id,
                name,
                sender,
                reply,
            } => {
                let result = self.handle_join(id, &name, sender);
                let _ = reply.send(result);
            }
            StudioCommand::Leave { id } => {
                let out = self.director.leave(id);
                self.senders.remove(&id);
                self.dispatch(out);
            }
            StudioCommand::Message { id, msg } => {
                let out = self.director.handle_message(id, msg);
                self.dispatch(out);
            }
            StudioCommand::GetInfo { reply } => {
                let _ = reply.send(self.info());
            }
            StudioCommand::Shutdown => {
                tracing::info!(studio = %self.name, "studio shutting down");
                return false;
            }
        }
        true
    }

    fn handle_join(
        &mut self,
        id: SessionId,
        name: &str,
        sender: SessionSender,
    ) -> Result<(), StudioError> {
        let out = self.director.join(id, name)?;
        // The sender must be in place before dispatch so the joiner gets
        // its own FullSketch and Mode.
        self.senders.insert(id, sender);
        self.dispatch(out);
        Ok(())
    }

    fn apply_timer_command(&mut self) {
        match self.director.take_timer_command() {
            Some(TimerCommand::Restart) => self.timer.start(),
            Some(TimerCommand::Stop) => self.timer.stop(),
            None => {}
        }
    }

    /// Delivers outbound messages to the right sessions.
    fn dispatch(&self, out: Outbox) {
        for (recipient, msg) in out {
            match recipient {
                Recipient::All => {
                    for id in self.director.registry().ids() {
                        self.send_to(id, msg.clone());
                    }
                }
                Recipient::Session(id) => self.send_to(id, msg),
                Recipient::AllExcept(excluded) => {
                    for id in self.director.registry().ids() {
                        if id != excluded {
                            self.send_to(id, msg.clone());
                        }
                    }
                }
            }
        }
    }

    /// Queues a message for one session. Silently drops if the writer
    /// is gone (session disconnecting).
    fn send_to(&self, id: SessionId, msg: ServerMessage) {
        if let Some(sender) = self.senders.get(&id) {
            let _ = sender.send(msg);
        }
    }

    fn info(&self) -> StudioInfo {
        let round = self.director.round();
        StudioInfo {
            name: self.name.clone(),
            mode: self.director.mode(),
            phase: self.director.phase(),
            players: self
                .director
                .registry()
                .iter()
                .map(|s| s.name.clone())
                .collect(),
            drawer: round.map(|r| r.drawer_name.clone()),
            remaining: round.map(|r| r.remaining),
        }
    }
}

/// Round seconds covered by one fired tick, counting periods skipped
/// while the actor was busy.
fn elapsed_secs(info: &TickInfo) -> u32 {
    u32::try_from(info.ticks_skipped.saturating_add(1)).unwrap_or(u32::MAX)
}

/// Spawns a studio actor task and returns a handle to it.
///
/// `channel_size` bounds the command queue; when it fills up, connection
/// handlers wait.
///
/// # Errors
/// [`StudioError::InvalidConfig`] if the config doesn't validate.
pub fn spawn_studio(
    config: StudioConfig,
    channel_size: usize,
) -> Result<StudioHandle, StudioError> {
    let director = GameDirector::new(&config)?;
    let (tx, rx) = mpsc::channel(channel_size.max(1));

    let actor = StudioActor {
        name: config.name,
        director,
        timer: TickScheduler::new(TickConfig::default()),
        senders: HashMap::new(),
        receiver: rx,
    };

    tokio::spawn(actor.run());

    Ok(StudioHandle { sender: tx })
}
