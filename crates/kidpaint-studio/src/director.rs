//! Game rules: who may paint, turn rotation, guessing and scoring.
//!
//! [`GameDirector`] is plain synchronous state. Every method takes an
//! event (join, leave, client message, timer tick) and returns the
//! messages it produced as `(Recipient, ServerMessage)` pairs. The
//! studio actor owns the director, feeds it events one at a time and
//! delivers the output, so the rules never touch a socket or a lock.
//!
//! The director can't drive the round timer itself. Instead it records a
//! [`TimerCommand`] which the actor collects with
//! [`GameDirector::take_timer_command`] after each event.

use std::collections::VecDeque;

use kidpaint_protocol::{ClientMessage, Point, Recipient, ServerMessage, SessionId};
use kidpaint_session::{SessionError, SessionRegistry};
use rand::Rng;
use tracing::{debug, info};

use crate::canvas::CanvasState;
use crate::config::{GameMode, GamePhase, StudioConfig};
use crate::StudioError;

/// Points awarded to whoever guesses the word.
pub const GUESSER_POINTS: u32 = 10;

/// Points awarded to the drawer when their word is guessed.
pub const DRAWER_POINTS: u32 = 5;

/// Sessions needed before a Draw & Guess game can start.
pub const MIN_PLAYERS: usize = 2;

/// Drawer name shown while everyone may paint.
const EVERYONE: &str = "Everyone";

/// Messages produced by one event, in delivery order.
pub type Outbox = Vec<(Recipient, ServerMessage)>;

/// What the owner of the round timer should do after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerCommand {
    /// Start counting from a full period again.
    Restart,
    /// Stop ticking.
    Stop,
}

/// The state of the Draw & Guess round in progress.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoundState {
    pub drawer: SessionId,
    pub drawer_name: String,
    pub word: String,
    /// Seconds left in the round.
    pub remaining: u32,
}

/// Owns the canvas and the session registry and applies the rules of
/// the studio's [`GameMode`] to them.
#[derive(Debug)]
pub struct GameDirector {
    mode: GameMode,
    phase: GamePhase,
    registry: SessionRegistry,
    canvas: CanvasState,
    words: Vec<String>,
    round_secs: u32,
    /// Drawers still waiting for a turn in this game, front first.
    drawer_queue: VecDeque<SessionId>,
    round: Option<RoundState>,
    timer: Option<TimerCommand>,
}

impl GameDirector {
    /// Creates a director in the lobby with a blank canvas.
    ///
    /// # Errors
    /// [`StudioError::InvalidConfig`] if the config doesn't validate.
    pub fn new(config: &StudioConfig) -> Result<Self, StudioError> {
        config.validate()?;
        let words = config
            .words
            .iter()
            .map(|w| w.trim())
            .filter(|w| !w.is_empty())
            .map(String::from)
            .collect();

        Ok(Self {
            mode: config.mode,
            phase: GamePhase::Lobby,
            registry: SessionRegistry::new(),
            canvas: CanvasState::new(config.canvas_size)?,
            words,
            round_secs: config.round_secs,
            drawer_queue: VecDeque::new(),
            round: None,
            timer: None,
        })
    }

    pub fn mode(&self) -> GameMode {
        self.mode
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn registry(&self) -> &SessionRegistry {
        &self.registry
    }

    pub fn canvas(&self) -> &CanvasState {
        &self.canvas
    }

    /// The round in progress, if any.
    pub fn round(&self) -> Option<&RoundState> {
        self.round.as_ref()
    }

    /// Drawers who haven't had their turn yet in this game.
    pub fn drawer_queue(&self) -> impl Iterator<Item = SessionId> + '_ {
        self.drawer_queue.iter().copied()
    }

    /// Takes the pending timer instruction, if the last event produced one.
    pub fn take_timer_command(&mut self) -> Option<TimerCommand> {
        self.timer.take()
    }

    // -----------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------

    /// Registers a session that completed the name handshake.
    ///
    /// # Errors
    /// Whatever [`SessionRegistry::register`] rejects: a blank, overlong
    /// or already-used name. Nothing is broadcast on error.
    pub fn join(
        &mut self,
        id: SessionId,
        name: &str,
    ) -> Result<Outbox, SessionError> {
        self.registry.register(id, name)?;
        info!(session_id = %id, %name, players = self.registry.len(), "joined studio");

        let mut out = vec![
            (Recipient::All, self.lobby_update()),
            (Recipient::Session(id), ServerMessage::FullSketch(self.canvas.snapshot())),
            (
                Recipient::Session(id),
                ServerMessage::Mode {
                    draw_and_guess: self.mode.is_draw_and_guess(),
                },
            ),
            (Recipient::All, ServerMessage::system(format!("{name} joined."))),
        ];

        // Bring late joiners up to date with the running game.
        if self.phase.is_started() {
            match (&self.mode, &self.round) {
                (GameMode::DrawTogether, _) => {
                    out.push((Recipient::Session(id), everyone_state()));
                    out.push((Recipient::Session(id), your_turn(true, "")));
                }
                (GameMode::DrawAndGuess, Some(round)) => {
                    out.push((
                        Recipient::Session(id),
                        game_state(&round.drawer_name, round.remaining),
                    ));
                    out.push((Recipient::Session(id), your_turn(false, "")));
                }
                (GameMode::DrawAndGuess, None) => {}
            }
        }

        Ok(out)
    }

    /// Removes a session. Unknown ids produce no output.
    pub fn leave(&mut self, id: SessionId) -> Outbox {
        let Some(session) = self.registry.remove(id) else {
            return Vec::new();
        };
        info!(session_id = %id, name = %session.name, players = self.registry.len(), "left studio");

        let mut out = vec![
            (Recipient::All, self.lobby_update()),
            (
                Recipient::All,
                ServerMessage::system(format!("{} left.", session.name)),
            ),
        ];

        // Draw Together never leaves its started phase once it begins.
        if !self.mode.is_draw_and_guess() {
            return out;
        }

        if self.registry.is_empty() {
            if self.phase.is_started() {
                info!("studio is empty, back to lobby");
            }
            self.phase = GamePhase::Lobby;
            self.round = None;
            self.drawer_queue.clear();
            self.timer = Some(TimerCommand::Stop);
            return out;
        }

        if self.phase.is_started() {
            self.drawer_queue.retain(|&queued| queued != id);
            if self.round.as_ref().is_some_and(|r| r.drawer == id) {
                out.push((
                    Recipient::All,
                    ServerMessage::system(format!(
                        "{} left during their turn. Skipping...",
                        session.name
                    )),
                ));
                self.start_new_round(&mut out);
            }
        }

        out
    }

    // -----------------------------------------------------------------
    // Client messages
    // -----------------------------------------------------------------

    /// Applies one message from a registered session.
    ///
    /// Messages from unregistered ids, unauthorized paint and clear
    /// requests and repeated `Name` handshakes are dropped without a
    /// reply.
    pub fn handle_message(&mut self, id: SessionId, msg: ClientMessage) -> Outbox {
        let Some(name) = self.registry.name_of(id).map(String::from) else {
            debug!(session_id = %id, tag = msg.tag(), "message from unregistered session, ignoring");
            return Vec::new();
        };

        match msg {
            ClientMessage::Name { .. } => {
                debug!(session_id = %id, "repeated name handshake, ignoring");
                Vec::new()
            }
            ClientMessage::PixelBatch { color, points } => {
                self.handle_pixels(id, color, &points)
            }
            ClientMessage::Chat { text } => self.handle_chat(id, &name, text),
            ClientMessage::Clear => self.handle_clear(id),
            ClientMessage::Whisper { target, message } => {
                self.handle_whisper(id, &name, &target, &message)
            }
            ClientMessage::ClientReady => {
                // Registered above, so this can't miss.
                let _ = self.registry.set_ready(id);
                vec![(Recipient::All, self.lobby_update())]
            }
            ClientMessage::HostStart => self.handle_host_start(),
        }
    }

    /// Whether `id` may paint or clear right now.
    pub fn can_draw(&self, id: SessionId) -> bool {
        match self.mode {
            GameMode::DrawTogether => true,
            GameMode::DrawAndGuess => {
                self.phase.is_started()
                    && self.round.as_ref().is_some_and(|r| r.drawer == id)
            }
        }
    }

    fn handle_pixels(&mut self, id: SessionId, color: i32, points: &[Point]) -> Outbox {
        let authorized = self.can_draw(id);
        let applied = self.canvas.apply_batch(authorized, color, points);
        if applied.is_empty() {
            debug!(session_id = %id, authorized, sent = points.len(), "pixel batch dropped");
            return Vec::new();
        }
        vec![(
            Recipient::All,
            ServerMessage::PixelBatch {
                color,
                points: applied,
            },
        )]
    }

    fn handle_clear(&mut self, id: SessionId) -> Outbox {
        if !self.can_draw(id) {
            debug!(session_id = %id, "unauthorized clear dropped");
            return Vec::new();
        }
        self.canvas.clear();
        vec![(Recipient::All, ServerMessage::Clear)]
    }

    fn handle_chat(&mut self, id: SessionId, name: &str, text: String) -> Outbox {
        let correct_guess = self.phase.is_started()
            && self.round.as_ref().is_some_and(|r| {
                r.drawer != id && r.word.to_lowercase() == text.to_lowercase()
            });

        if !correct_guess {
            return vec![(Recipient::All, ServerMessage::chat(name, &text))];
        }

        let mut out = vec![(
            Recipient::All,
            ServerMessage::system(format!("{name} GUESSED THE WORD!")),
        )];
        let _ = self.registry.add_score(id, GUESSER_POINTS);
        if let Some(round) = &self.round {
            let _ = self.registry.add_score(round.drawer, DRAWER_POINTS);
            info!(guesser = %name, drawer = %round.drawer_name, word = %round.word, "word guessed");
        }
        out.push((
            Recipient::All,
            ServerMessage::Leaderboard {
                entries: self.registry.leaderboard(),
            },
        ));
        self.start_new_round(&mut out);
        out
    }

    fn handle_whisper(
        &self,
        id: SessionId,
        name: &str,
        target: &str,
        message: &str,
    ) -> Outbox {
        match self.registry.find_by_name(target) {
            Some(to) => vec![
                (
                    Recipient::Session(to.id),
                    ServerMessage::chat_line(format!("(Whisper from {name}): {message}")),
                ),
                (
                    Recipient::Session(id),
                    ServerMessage::chat_line(format!("(Whisper to {target}): {message}")),
                ),
            ],
            None => vec![(
                Recipient::Session(id),
                ServerMessage::system(format!("User '{target}' not found.")),
            )],
        }
    }

    fn handle_host_start(&mut self) -> Outbox {
        if !self.phase.accepts_start() {
            debug!(phase = %self.phase, "game already running, start ignored");
            return Vec::new();
        }

        match self.mode {
            GameMode::DrawTogether => {
                self.phase = GamePhase::RoundActive;
                info!(players = self.registry.len(), "draw together started");
                vec![
                    (Recipient::All, everyone_state()),
                    (
                        Recipient::All,
                        ServerMessage::system("Game Started! Draw Together Mode."),
                    ),
                    (Recipient::All, your_turn(true, "")),
                ]
            }
            GameMode::DrawAndGuess => {
                if self.registry.len() < MIN_PLAYERS {
                    debug!(players = self.registry.len(), "not enough players to start");
                    return vec![(
                        Recipient::All,
                        ServerMessage::system(format!(
                            "At least {MIN_PLAYERS} players required for Draw & Guess mode."
                        )),
                    )];
                }

                self.drawer_queue = self.registry.ids().into();
                self.phase = GamePhase::RoundActive;
                info!(players = self.drawer_queue.len(), "draw & guess started");

                let mut out = Vec::new();
                self.start_new_round(&mut out);
                out
            }
        }
    }

    // -----------------------------------------------------------------
    // Rounds
    // -----------------------------------------------------------------

    /// One second of round time has passed.
    pub fn tick(&mut self) -> Outbox {
        self.advance(1)
    }

    /// `secs` seconds of round time have passed at once, e.g. after the
    /// timer fired late. Zero counts as one.
    ///
    /// Ticks outside a running round are stale (the timer raced a state
    /// change) and only re-issue a stop.
    pub fn advance(&mut self, secs: u32) -> Outbox {
        let round = match self.round.as_mut() {
            Some(round) if self.phase.is_started() => round,
            _ => {
                debug!("tick with no round running");
                self.timer = Some(TimerCommand::Stop);
                return Vec::new();
            }
        };

        round.remaining = round.remaining.saturating_sub(secs.max(1));
        let mut out = vec![(
            Recipient::All,
            game_state(&round.drawer_name, round.remaining),
        )];

        if round.remaining == 0 {
            info!(drawer = %round.drawer_name, word = %round.word, "round timed out");
            out.push((
                Recipient::All,
                ServerMessage::system(format!("Time's Up! The word was {}", round.word)),
            ));
            self.start_new_round(&mut out);
        }
        out
    }

    /// Ends the current round and starts the next, or ends the game when
    /// nobody is left in the queue.
    fn start_new_round(&mut self, out: &mut Outbox) {
        self.timer = Some(TimerCommand::Stop);
        self.canvas.clear();
        out.push((Recipient::All, ServerMessage::Clear));

        let Some(drawer) = self.drawer_queue.pop_front() else {
            self.end_game(out);
            return;
        };
        let drawer_name = self.registry.name_of(drawer).unwrap_or_default().to_string();
        let word = self.pick_word();
        info!(drawer = %drawer_name, queued = self.drawer_queue.len(), "new round");

        out.push((
            Recipient::All,
            ServerMessage::system(format!("New Round! Drawer is {drawer_name}")),
        ));
        out.push((Recipient::Session(drawer), your_turn(true, &word)));
        out.push((Recipient::AllExcept(drawer), your_turn(false, "")));
        out.push((Recipient::All, game_state(&drawer_name, self.round_secs)));

        self.round = Some(RoundState {
            drawer,
            drawer_name,
            word,
            remaining: self.round_secs,
        });
        self.timer = Some(TimerCommand::Restart);
    }

    fn end_game(&mut self, out: &mut Outbox) {
        info!(players = self.registry.len(), "game over");
        self.phase = GamePhase::GameOver;
        self.round = None;
        self.registry.reset_ready();

        out.push((
            Recipient::All,
            ServerMessage::system("GAME OVER! Returning to Lobby..."),
        ));
        out.push((Recipient::All, self.lobby_update()));
        out.push((Recipient::All, ServerMessage::GameOver));
    }

    fn pick_word(&self) -> String {
        let index = rand::rng().random_range(0..self.words.len());
        self.words[index].clone()
    }

    fn lobby_update(&self) -> ServerMessage {
        ServerMessage::LobbyUpdate {
            entries: self.registry.lobby_entries(),
        }
    }
}

fn game_state(drawer: &str, remaining: u32) -> ServerMessage {
    ServerMessage::GameState {
        drawer: drawer.to_string(),
        time: i32::try_from(remaining).unwrap_or(i32::MAX),
    }
}

/// The HUD message for Draw Together: everyone draws, no clock.
fn everyone_state() -> ServerMessage {
    ServerMessage::GameState {
        drawer: EVERYONE.to_string(),
        time: -1,
    }
}

fn your_turn(is_turn: bool, word: &str) -> ServerMessage {
    ServerMessage::YourTurn {
        is_turn,
        word: word.to_string(),
    }
}

// =========================================================================
// Tests
// =========================================================================

#[cfg(test)]
mod tests {
    //! Naming convention: `test_{event}_{scenario}_{expected}`.

    use super::*;

    const ALICE: SessionId = SessionId(1);
    const BOB: SessionId = SessionId(2);
    const CAROL: SessionId = SessionId(3);
    const DAVE: SessionId = SessionId(4);

    fn director(mode: GameMode) -> GameDirector {
        GameDirector::new(&StudioConfig {
            canvas_size: 4,
            mode,
            words: vec!["APPLE".into()],
            ..StudioConfig::default()
        })
        .unwrap()
    }

    fn with_players(mode: GameMode, names: &[&str]) -> GameDirector {
        let mut d = director(mode);
        for (i, name) in names.iter().enumerate() {
            d.join(SessionId(i as u64 + 1), name).unwrap();
        }
        d
    }

    /// Alice, Bob and Carol in a started Draw & Guess game.
    fn started_game() -> GameDirector {
        let mut d = with_players(GameMode::DrawAndGuess, &["Alice", "Bob", "Carol"]);
        d.handle_message(ALICE, ClientMessage::HostStart);
        d
    }

    fn chat(text: &str) -> ClientMessage {
        ClientMessage::Chat { text: text.into() }
    }

    fn pixels(points: &[(i32, i32)]) -> ClientMessage {
        ClientMessage::PixelBatch {
            color: 7,
            points: points.iter().map(|&(x, y)| Point::new(x, y)).collect(),
        }
    }

    fn chat_lines(out: &Outbox) -> Vec<&str> {
        out.iter()
            .filter_map(|(_, m)| match m {
                ServerMessage::Chat { text } => Some(text.as_str()),
                _ => None,
            })
            .collect()
    }

    fn drawer_name(d: &GameDirector) -> &str {
        &d.round().expect("round running").drawer_name
    }

    fn score(d: &GameDirector, id: SessionId) -> u32 {
        d.registry().get(id).unwrap().score
    }

    // =====================================================================
    // join / leave
    // =====================================================================

    #[test]
    fn test_join_sends_lobby_sketch_mode_then_announcement() {
        let mut d = director(GameMode::DrawTogether);
        let out = d.join(ALICE, "Alice").unwrap();

        assert_eq!(out.len(), 4);
        assert!(matches!(out[0], (Recipient::All, ServerMessage::LobbyUpdate { .. })));
        assert!(matches!(
            &out[1],
            (Recipient::Session(ALICE), ServerMessage::FullSketch(s)) if s.size == 4
        ));
        assert_eq!(
            out[2],
            (Recipient::Session(ALICE), ServerMessage::Mode { draw_and_guess: false })
        );
        assert_eq!(out[3].1, ServerMessage::system("Alice joined."));
    }

    #[test]
    fn test_join_duplicate_name_is_rejected_without_output() {
        let mut d = with_players(GameMode::DrawTogether, &["Alice"]);
        let err = d.join(BOB, "Alice").unwrap_err();
        assert!(matches!(err, SessionError::NameTaken(_)));
        assert_eq!(d.registry().len(), 1);
    }

    #[test]
    fn test_join_during_draw_together_game_gets_turn() {
        let mut d = with_players(GameMode::DrawTogether, &["Alice"]);
        d.handle_message(ALICE, ClientMessage::HostStart);

        let out = d.join(BOB, "Bob").unwrap();

        assert!(out.contains(&(Recipient::Session(BOB), everyone_state())));
        assert!(out.contains(&(Recipient::Session(BOB), your_turn(true, ""))));
    }

    #[test]
    fn test_join_during_round_gets_state_but_not_queued() {
        let mut d = started_game();
        let out = d.join(DAVE, "Dave").unwrap();

        assert!(out.contains(&(Recipient::Session(DAVE), game_state("Alice", 60))));
        assert!(out.contains(&(Recipient::Session(DAVE), your_turn(false, ""))));
        assert!(!d.drawer_queue().any(|id| id == DAVE));
    }

    #[test]
    fn test_leave_broadcasts_lobby_and_departure() {
        let mut d = with_players(GameMode::DrawTogether, &["Alice", "Bob"]);
        let out = d.leave(BOB);

        assert_eq!(
            out[0],
            (
                Recipient::All,
                ServerMessage::LobbyUpdate {
                    entries: d.registry().lobby_entries()
                }
            )
        );
        assert_eq!(chat_lines(&out), vec!["SYSTEM: Bob left."]);
        assert_eq!(d.registry().len(), 1);
    }

    #[test]
    fn test_leave_unknown_session_is_silent() {
        let mut d = director(GameMode::DrawTogether);
        assert!(d.leave(ALICE).is_empty());
    }

    #[test]
    fn test_leave_queued_player_is_removed_from_queue() {
        let mut d = started_game();
        d.leave(CAROL);
        assert_eq!(d.drawer_queue().collect::<Vec<_>>(), vec![BOB]);
        assert_eq!(drawer_name(&d), "Alice");
    }

    #[test]
    fn test_leave_current_drawer_skips_to_next_round() {
        let mut d = started_game();
        d.take_timer_command();

        let out = d.leave(ALICE);

        let lines = chat_lines(&out);
        assert!(lines.contains(&"SYSTEM: Alice left during their turn. Skipping..."));
        assert!(lines.contains(&"SYSTEM: New Round! Drawer is Bob"));
        assert_eq!(d.round().unwrap().drawer, BOB);
        assert_eq!(d.take_timer_command(), Some(TimerCommand::Restart));
    }

    #[test]
    fn test_leave_last_player_returns_to_lobby_and_stops_timer() {
        let mut d = with_players(GameMode::DrawAndGuess, &["Alice", "Bob"]);
        d.handle_message(ALICE, ClientMessage::HostStart);
        d.leave(BOB);
        d.leave(ALICE);

        assert_eq!(d.phase(), GamePhase::Lobby);
        assert!(d.round().is_none());
        assert_eq!(d.take_timer_command(), Some(TimerCommand::Stop));
    }

    #[test]
    fn test_leave_last_player_in_draw_together_keeps_game_started() {
        let mut d = with_players(GameMode::DrawTogether, &["Alice"]);
        d.handle_message(ALICE, ClientMessage::HostStart);
        d.leave(ALICE);
        assert_eq!(d.phase(), GamePhase::RoundActive);
        assert_eq!(d.take_timer_command(), None);

        // The next visitor joins a running canvas and can't restart it.
        let out = d.join(BOB, "Bob").unwrap();
        assert_eq!(out.len(), 6);
        assert_eq!(out[4], (Recipient::Session(BOB), everyone_state()));
        assert_eq!(out[5], (Recipient::Session(BOB), your_turn(true, "")));
        assert!(d.handle_message(BOB, ClientMessage::HostStart).is_empty());
    }

    #[test]
    fn test_repeated_name_is_ignored() {
        let mut d = with_players(GameMode::DrawTogether, &["Alice"]);
        let out = d.handle_message(ALICE, ClientMessage::Name { name: "Zed".into() });
        assert!(out.is_empty());
        assert_eq!(d.registry().name_of(ALICE), Some("Alice"));
    }

    #[test]
    fn test_message_from_unregistered_session_is_ignored() {
        let mut d = director(GameMode::DrawTogether);
        assert!(d.handle_message(ALICE, chat("hi")).is_empty());
    }

    // =====================================================================
    // Painting
    // =====================================================================

    #[test]
    fn test_draw_together_everyone_may_paint_in_lobby() {
        let mut d = with_players(GameMode::DrawTogether, &["Alice", "Bob"]);
        let out = d.handle_message(BOB, pixels(&[(1, 1), (9, 9)]));

        assert_eq!(
            out,
            vec![(
                Recipient::All,
                ServerMessage::PixelBatch { color: 7, points: vec![Point::new(1, 1)] }
            )]
        );
        assert_eq!(d.canvas().get(1, 1), Some(7));
    }

    #[test]
    fn test_batch_with_no_valid_points_is_not_broadcast() {
        let mut d = with_players(GameMode::DrawTogether, &["Alice"]);
        assert!(d.handle_message(ALICE, pixels(&[(-1, 0), (4, 4)])).is_empty());
    }

    #[test]
    fn test_draw_and_guess_non_drawer_batch_leaves_canvas_unchanged() {
        let mut d = started_game();
        let before = d.canvas().snapshot();

        let out = d.handle_message(BOB, pixels(&[(0, 0), (1, 1)]));

        assert!(out.is_empty());
        assert_eq!(d.canvas().snapshot(), before);
    }

    #[test]
    fn test_draw_and_guess_nobody_paints_in_lobby() {
        let mut d = with_players(GameMode::DrawAndGuess, &["Alice", "Bob"]);
        assert!(d.handle_message(ALICE, pixels(&[(0, 0)])).is_empty());
        assert!(d.canvas().is_blank());
    }

    #[test]
    fn test_draw_and_guess_drawer_may_paint_and_clear() {
        let mut d = started_game();
        assert_eq!(d.handle_message(ALICE, pixels(&[(2, 3)])).len(), 1);
        assert_eq!(d.canvas().get(2, 3), Some(7));

        let out = d.handle_message(ALICE, ClientMessage::Clear);
        assert_eq!(out, vec![(Recipient::All, ServerMessage::Clear)]);
        assert!(d.canvas().is_blank());
    }

    #[test]
    fn test_draw_and_guess_non_drawer_clear_is_dropped() {
        let mut d = started_game();
        d.handle_message(ALICE, pixels(&[(2, 3)]));
        assert!(d.handle_message(CAROL, ClientMessage::Clear).is_empty());
        assert_eq!(d.canvas().get(2, 3), Some(7));
    }

    // =====================================================================
    // Chat / whisper / ready
    // =====================================================================

    #[test]
    fn test_chat_is_broadcast_with_sender_name() {
        let mut d = with_players(GameMode::DrawTogether, &["Alice", "Bob"]);
        let out = d.handle_message(BOB, chat("hello"));
        assert_eq!(out, vec![(Recipient::All, ServerMessage::chat("Bob", "hello"))]);
    }

    #[test]
    fn test_whisper_reaches_target_and_echoes_to_sender() {
        let mut d = with_players(GameMode::DrawTogether, &["Alice", "Bob", "Carol"]);
        let out = d.handle_message(
            ALICE,
            ClientMessage::Whisper { target: "Bob".into(), message: "psst".into() },
        );

        assert_eq!(
            out,
            vec![
                (
                    Recipient::Session(BOB),
                    ServerMessage::Chat { text: "(Whisper from Alice): psst".into() }
                ),
                (
                    Recipient::Session(ALICE),
                    ServerMessage::Chat { text: "(Whisper to Bob): psst".into() }
                ),
            ]
        );
    }

    #[test]
    fn test_whisper_to_missing_user_only_tells_sender() {
        let mut d = with_players(GameMode::DrawAndGuess, &["Alice", "Bob", "Carol"]);
        let out = d.handle_message(
            ALICE,
            ClientMessage::Whisper { target: "Dave".into(), message: "hi".into() },
        );

        assert_eq!(
            out,
            vec![(
                Recipient::Session(ALICE),
                ServerMessage::system("User 'Dave' not found.")
            )]
        );
    }

    #[test]
    fn test_chat_and_whisper_near_wire_limit_still_encode() {
        use kidpaint_protocol::{Codec, MAX_STRING_BYTES};

        let mut d = with_players(GameMode::DrawTogether, &["Alice", "Bob"]);
        let long = "z".repeat(MAX_STRING_BYTES);
        let mut out = d.handle_message(ALICE, chat(&long));
        out.extend(d.handle_message(
            ALICE,
            ClientMessage::Whisper { target: "Bob".into(), message: long },
        ));

        assert_eq!(out.len(), 3);
        for (_, msg) in &out {
            assert!(msg.encode().is_ok());
        }
        assert!(chat_lines(&out)[0].starts_with("Alice: zzz"));
        assert!(chat_lines(&out)[1].starts_with("(Whisper from Alice): zzz"));
    }

    #[test]
    fn test_client_ready_marks_ready_and_broadcasts_lobby() {
        let mut d = with_players(GameMode::DrawAndGuess, &["Alice", "Bob"]);
        let out = d.handle_message(BOB, ClientMessage::ClientReady);

        assert!(d.registry().get(BOB).unwrap().ready);
        assert!(matches!(
            &out[..],
            [(Recipient::All, ServerMessage::LobbyUpdate { entries })] if entries[1].ready
        ));
    }

    // =====================================================================
    // HostStart
    // =====================================================================

    #[test]
    fn test_host_start_draw_together_gives_everyone_a_turn() {
        let mut d = with_players(GameMode::DrawTogether, &["Alice"]);
        let out = d.handle_message(ALICE, ClientMessage::HostStart);

        assert_eq!(
            out,
            vec![
                (Recipient::All, everyone_state()),
                (Recipient::All, ServerMessage::system("Game Started! Draw Together Mode.")),
                (Recipient::All, your_turn(true, "")),
            ]
        );
        assert_eq!(d.phase(), GamePhase::RoundActive);
        assert!(d.take_timer_command().is_none());
    }

    #[test]
    fn test_host_start_twice_is_ignored() {
        let mut d = started_game();
        assert!(d.handle_message(BOB, ClientMessage::HostStart).is_empty());
        assert_eq!(drawer_name(&d), "Alice");
    }

    #[test]
    fn test_host_start_with_one_player_is_rejected() {
        let mut d = with_players(GameMode::DrawAndGuess, &["Alice"]);
        let out = d.handle_message(ALICE, ClientMessage::HostStart);

        assert_eq!(
            chat_lines(&out),
            vec!["SYSTEM: At least 2 players required for Draw & Guess mode."]
        );
        assert_eq!(d.phase(), GamePhase::Lobby);
        assert!(d.round().is_none());
        assert!(d.take_timer_command().is_none());
    }

    #[test]
    fn test_host_start_queues_players_in_join_order() {
        let mut d = director(GameMode::DrawAndGuess);
        d.join(SessionId(30), "Carol").unwrap();
        d.join(SessionId(10), "Alice").unwrap();
        d.join(SessionId(20), "Bob").unwrap();

        let out = d.handle_message(SessionId(10), ClientMessage::HostStart);

        assert_eq!(d.round().unwrap().drawer, SessionId(30));
        assert_eq!(
            d.drawer_queue().collect::<Vec<_>>(),
            vec![SessionId(10), SessionId(20)]
        );
        assert_eq!(out[0], (Recipient::All, ServerMessage::Clear));
        assert!(out.contains(&(Recipient::Session(SessionId(30)), your_turn(true, "APPLE"))));
        assert!(out.contains(&(Recipient::AllExcept(SessionId(30)), your_turn(false, ""))));
        assert!(out.contains(&(Recipient::All, game_state("Carol", 60))));
        assert_eq!(d.take_timer_command(), Some(TimerCommand::Restart));
    }

    // =====================================================================
    // Guessing and scoring
    // =====================================================================

    #[test]
    fn test_alice_bob_carol_round() {
        let mut d = started_game();
        assert_eq!(drawer_name(&d), "Alice");
        assert_eq!(d.round().unwrap().word, "APPLE");

        let out = d.handle_message(BOB, chat("wrongword"));
        assert_eq!(out, vec![(Recipient::All, ServerMessage::chat("Bob", "wrongword"))]);
        assert_eq!(drawer_name(&d), "Alice");

        let out = d.handle_message(CAROL, chat("aPpLe"));
        let lines = chat_lines(&out);
        assert_eq!(lines[0], "SYSTEM: Carol GUESSED THE WORD!");
        assert!(!lines.iter().any(|l| l.contains("aPpLe")));
        assert_eq!(score(&d, CAROL), GUESSER_POINTS);
        assert_eq!(score(&d, ALICE), DRAWER_POINTS);
        assert_eq!(score(&d, BOB), 0);
        assert!(out.contains(&(
            Recipient::All,
            ServerMessage::Leaderboard {
                entries: vec!["Alice: 5".into(), "Bob: 0".into(), "Carol: 10".into()]
            }
        )));
        assert_eq!(drawer_name(&d), "Bob");
        assert_eq!(d.round().unwrap().remaining, 60);
    }

    #[test]
    fn test_drawer_typing_the_word_is_plain_chat() {
        let mut d = started_game();
        let out = d.handle_message(ALICE, chat("apple"));
        assert_eq!(out, vec![(Recipient::All, ServerMessage::chat("Alice", "apple"))]);
        assert_eq!(score(&d, ALICE), 0);
    }

    #[test]
    fn test_each_player_draws_once_then_game_over() {
        let mut d = started_game();
        let mut drawers = vec![drawer_name(&d).to_string()];
        d.handle_message(BOB, chat("apple"));
        drawers.push(drawer_name(&d).to_string());
        d.handle_message(ALICE, chat("apple"));
        drawers.push(drawer_name(&d).to_string());

        assert_eq!(drawers, vec!["Alice", "Bob", "Carol"]);

        d.handle_message(ALICE, ClientMessage::ClientReady);
        let out = d.handle_message(BOB, chat("APPLE"));

        assert_eq!(d.phase(), GamePhase::GameOver);
        assert!(d.round().is_none());
        assert!(d.registry().iter().all(|s| !s.ready));
        assert!(chat_lines(&out).contains(&"SYSTEM: GAME OVER! Returning to Lobby..."));
        assert_eq!(out.last(), Some(&(Recipient::All, ServerMessage::GameOver)));
        assert_eq!(d.take_timer_command(), Some(TimerCommand::Stop));
    }

    #[test]
    fn test_host_start_after_game_over_starts_new_game() {
        let mut d = with_players(GameMode::DrawAndGuess, &["Alice", "Bob"]);
        d.handle_message(ALICE, ClientMessage::HostStart);
        d.handle_message(BOB, chat("apple"));
        d.handle_message(ALICE, chat("apple"));
        assert_eq!(d.phase(), GamePhase::GameOver);

        d.handle_message(BOB, ClientMessage::HostStart);
        assert_eq!(d.phase(), GamePhase::RoundActive);
        assert_eq!(drawer_name(&d), "Alice");
    }

    // =====================================================================
    // Timer
    // =====================================================================

    #[test]
    fn test_tick_counts_down_and_broadcasts_state() {
        let mut d = started_game();
        let out = d.tick();
        assert_eq!(out, vec![(Recipient::All, game_state("Alice", 59))]);
        assert_eq!(d.round().unwrap().remaining, 59);
    }

    #[test]
    fn test_timer_expiry_reveals_word_and_rotates() {
        let mut d = started_game();
        d.take_timer_command();
        let mut last = Vec::new();
        for _ in 0..60 {
            last = d.tick();
        }

        let lines = chat_lines(&last);
        assert!(lines.contains(&"SYSTEM: Time's Up! The word was APPLE"));
        assert!(lines.contains(&"SYSTEM: New Round! Drawer is Bob"));
        assert_eq!(d.round().unwrap().remaining, 60);
        assert_eq!(d.take_timer_command(), Some(TimerCommand::Restart));
        assert_eq!(score(&d, ALICE), 0);
    }

    #[test]
    fn test_advance_counts_several_seconds_at_once() {
        let mut d = started_game();
        let out = d.advance(5);
        assert_eq!(out, vec![(Recipient::All, game_state("Alice", 55))]);
    }

    #[test]
    fn test_advance_past_remaining_times_out_round() {
        let mut d = started_game();
        d.advance(58);
        let out = d.advance(10);
        let lines = chat_lines(&out);
        assert!(lines.contains(&"SYSTEM: Time's Up! The word was APPLE"));
        assert_eq!(drawer_name(&d), "Bob");
        assert_eq!(d.round().unwrap().remaining, 60);
    }

    #[test]
    fn test_advance_zero_counts_as_one_second() {
        let mut d = started_game();
        d.advance(0);
        assert_eq!(d.round().unwrap().remaining, 59);
    }

    #[test]
    fn test_tick_without_round_stops_timer() {
        let mut d = with_players(GameMode::DrawAndGuess, &["Alice"]);
        assert!(d.tick().is_empty());
        assert_eq!(d.take_timer_command(), Some(TimerCommand::Stop));
    }

    #[test]
    fn test_new_round_clears_canvas() {
        let mut d = started_game();
        d.handle_message(ALICE, pixels(&[(0, 0)]));
        d.handle_message(BOB, chat("apple"));
        assert!(d.canvas().is_blank());
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        let config = StudioConfig {
            words: vec!["  ".into()],
            ..StudioConfig::default()
        };
        assert!(matches!(
            GameDirector::new(&config),
            Err(StudioError::InvalidConfig(_))
        ));
    }
}
