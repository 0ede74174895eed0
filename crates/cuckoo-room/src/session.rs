//! Room session actor: an isolated Tokio task that owns one game.
//!
//! Each room runs in its own task, communicating with the outside world
//! through an mpsc channel: no shared mutable state, just message
//! passing. The actor's `select!` loop interleaves player commands with
//! the resolution sequencer's timed steps, so the delayed reveal/outcome
//! broadcasts never race with inbound actions: while a sequence is in
//! flight, actions are rejected outright.

use std::collections::HashMap;

use cuckoo_engine::{EngineError, PlayerId, RoundEngine, RoundPhase, TurnAction};
use cuckoo_protocol::{RoomCode, RoomPhase, RosterEntry, SeatView, ServerEvent};
use cuckoo_sequence::{ResolutionSequencer, SequenceStep};
use tokio::sync::{mpsc, oneshot};

use crate::{RoomConfig, RoomError};

/// Channel sender for delivering server events to one player's connection.
pub type PlayerSender = mpsc::UnboundedSender<ServerEvent>;

/// Commands sent to a room session through its channel.
pub(crate) enum RoomCommand {
    /// Add a player to the lobby.
    Join {
        player: PlayerId,
        name: String,
        sender: PlayerSender,
        reply: oneshot::Sender<Result<(), RoomError>>,
    },

    /// Remove a player. Replies with the number of players remaining so
    /// the registry can tear down emptied rooms.
    Leave {
        player: PlayerId,
        reply: oneshot::Sender<Result<usize, RoomError>>,
    },

    /// Start the game. Rejections go back through the player's own
    /// event channel, not a reply.
    StartGame { player: PlayerId, starting_lives: u8 },

    /// Apply a turn action. Same fire-and-forget error path.
    Action { player: PlayerId, action: TurnAction },

    /// Shut the room down.
    Shutdown,
}

/// Handle to a running room session. Cheap to clone: it's just an
/// `mpsc::Sender` wrapper. The registry holds one per room.
#[derive(Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    /// The room's code.
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Adds a player to the room's lobby.
    pub async fn join(
        &self,
        player: PlayerId,
        name: impl Into<String>,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Join {
                player,
                name: name.into(),
                sender,
                reply: reply_tx,
            })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?
    }

    /// Removes a player; returns how many remain.
    pub async fn leave(&self, player: PlayerId) -> Result<usize, RoomError> {
        let (reply_tx, reply_rx) = oneshot::channel();
        self.sender
            .send(RoomCommand::Leave { player, reply: reply_tx })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?;
        reply_rx
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))?
    }

    /// Requests a game start (host only; validated by the session).
    pub async fn start_game(
        &self,
        player: PlayerId,
        starting_lives: u8,
    ) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::StartGame { player, starting_lives })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Submits a turn action (fire-and-forget).
    pub async fn action(&self, player: PlayerId, action: TurnAction) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Action { player, action })
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }

    /// Tells the room to shut down.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| RoomError::Unavailable(self.code.clone()))
    }
}

/// Command channel size for room sessions.
const CHANNEL_SIZE: usize = 64;

/// Spawns a new room session task and returns a handle to it.
pub(crate) fn spawn_room(code: RoomCode, host: PlayerId, config: RoomConfig) -> RoomHandle {
    let (tx, rx) = mpsc::channel(CHANNEL_SIZE);

    let sequencer = ResolutionSequencer::new(config.sequence.clone());
    let actor = RoomSession {
        code: code.clone(),
        host,
        phase: RoomPhase::Lobby,
        roster: Vec::new(),
        senders: HashMap::new(),
        engine: None,
        sequencer,
        config,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}

/// The internal room state. Runs inside a Tokio task.
struct RoomSession {
    code: RoomCode,
    host: PlayerId,
    phase: RoomPhase,
    roster: Vec<RosterEntry>,
    /// Per-player outbound channels.
    senders: HashMap<PlayerId, PlayerSender>,
    /// One engine per started game; replaced, never reused.
    engine: Option<RoundEngine>,
    sequencer: ResolutionSequencer,
    config: RoomConfig,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomSession {
    /// Runs the session loop until shutdown or the last handle drops.
    async fn run(mut self) {
        tracing::info!(room = %self.code, "room session started");

        loop {
            tokio::select! {
                cmd = self.receiver.recv() => match cmd {
                    Some(RoomCommand::Shutdown) | None => break,
                    Some(cmd) => self.handle_command(cmd),
                },
                step = self.sequencer.wait_for_step() => {
                    self.handle_step(step);
                }
            }
        }

        tracing::info!(room = %self.code, "room session stopped");
    }

    fn handle_command(&mut self, cmd: RoomCommand) {
        match cmd {
            RoomCommand::Join { player, name, sender, reply } => {
                let result = self.handle_join(player, name, sender);
                let _ = reply.send(result);
            }
            RoomCommand::Leave { player, reply } => {
                let result = self.handle_leave(player);
                let _ = reply.send(result);
            }
            RoomCommand::StartGame { player, starting_lives } => {
                self.handle_start_game(player, starting_lives);
            }
            RoomCommand::Action { player, action } => {
                self.handle_action(player, action);
            }
            RoomCommand::Shutdown => unreachable!("handled in run()"),
        }
    }

    fn handle_join(
        &mut self,
        player: PlayerId,
        name: String,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        if self.phase == RoomPhase::InProgress {
            return Err(RoomError::GameInProgress(self.code.clone()));
        }
        if self.roster.iter().any(|entry| entry.id == player) {
            return Err(RoomError::AlreadyJoined(player, self.code.clone()));
        }
        if self.roster.len() >= self.config.max_players {
            return Err(RoomError::RoomFull(self.code.clone()));
        }

        self.roster.push(RosterEntry { id: player, name });
        self.senders.insert(player, sender);
        tracing::info!(
            room = %self.code,
            %player,
            players = self.roster.len(),
            "player joined"
        );

        self.broadcast(self.lobby_update());
        Ok(())
    }

    fn handle_leave(&mut self, player: PlayerId) -> Result<usize, RoomError> {
        let Some(position) = self.roster.iter().position(|entry| entry.id == player) else {
            return Err(RoomError::NotInRoom(player, self.code.clone()));
        };
        self.roster.remove(position);
        self.senders.remove(&player);

        // Host seat passes to the longest-seated remaining player.
        if self.host == player {
            if let Some(entry) = self.roster.first() {
                self.host = entry.id;
            }
        }

        tracing::info!(
            room = %self.code,
            %player,
            players = self.roster.len(),
            "player left"
        );

        // Mid-game the engine keeps the seat (there is no reconnect);
        // broadcasts to the gone player just stop. In the lobby the
        // roster visibly shrinks.
        if self.phase == RoomPhase::Lobby {
            self.broadcast(self.lobby_update());
        }

        Ok(self.roster.len())
    }

    fn handle_start_game(&mut self, player: PlayerId, starting_lives: u8) {
        if player != self.host {
            self.send_to(player, ServerEvent::ActionError {
                message: "only the host can start the game".into(),
            });
            return;
        }
        if self.phase == RoomPhase::InProgress {
            self.send_to(player, ServerEvent::ActionError {
                message: "the game has already started".into(),
            });
            return;
        }
        if self.roster.len() < self.config.min_players {
            self.send_to(player, ServerEvent::ActionError {
                message: format!(
                    "need at least {} players to start",
                    self.config.min_players
                ),
            });
            return;
        }

        let lives = if starting_lives == 0 {
            self.config.default_starting_lives
        } else {
            starting_lives
        };

        let roster: Vec<(PlayerId, String)> = self
            .roster
            .iter()
            .map(|entry| (entry.id, entry.name.clone()))
            .collect();

        let mut engine = RoundEngine::new(lives);
        if let Err(e) = engine.set_players(&roster).and_then(|()| engine.start_round()) {
            self.fault(e);
            return;
        }

        self.engine = Some(engine);
        self.phase = RoomPhase::InProgress;
        tracing::info!(
            room = %self.code,
            players = self.roster.len(),
            lives,
            "game started"
        );

        self.broadcast_game_state();
    }

    fn handle_action(&mut self, player: PlayerId, action: TurnAction) {
        // While the resolution sequence runs, the engine state is ahead
        // of anything clients have seen; accepting an action here would
        // corrupt turn order.
        if self.sequencer.is_active() {
            self.send_to(player, ServerEvent::ActionError {
                message: "the round is being resolved".into(),
            });
            return;
        }

        let Some(engine) = self.engine.as_mut() else {
            self.send_to(player, ServerEvent::ActionError {
                message: "no game in progress".into(),
            });
            return;
        };

        match engine.apply_action(player, action) {
            Ok(applied) => {
                tracing::debug!(
                    room = %self.code,
                    %player,
                    effect = ?applied.effect,
                    "action applied"
                );
                // Let everyone see the final hands before the reveal; for
                // a non-final turn this is the ordinary state broadcast.
                self.broadcast_game_state();
                if applied.round_complete {
                    self.sequencer.begin();
                }
            }
            Err(e) if e.is_fatal() => self.fault(e),
            Err(e) => {
                self.send_to(player, ServerEvent::ActionError { message: e.to_string() });
            }
        }
    }

    /// Drives one step of the timed resolution sequence.
    fn handle_step(&mut self, step: SequenceStep) {
        match step {
            SequenceStep::Outcome => {
                let Some(engine) = self.engine.as_mut() else {
                    self.sequencer.finish();
                    return;
                };
                match engine.determine_outcome() {
                    Ok(outcome) => {
                        self.broadcast(ServerEvent::RoundOutcome {
                            kind: outcome.kind,
                            log: outcome.log,
                            losers: outcome.losers,
                        });
                        self.sequencer.schedule_continuation();
                    }
                    Err(e) => self.fault(e),
                }
            }

            SequenceStep::Continuation => {
                let Some(engine) = self.engine.as_mut() else {
                    self.sequencer.finish();
                    return;
                };
                engine.clean_up();
                if engine.phase() == RoundPhase::GameOver {
                    let winner_name =
                        engine.determine_winner().map(|p| p.name().to_string()).ok();
                    tracing::info!(room = %self.code, winner = ?winner_name, "game over");
                    self.broadcast(ServerEvent::GameOver { winner_name });
                    self.sequencer.schedule_lobby_return();
                } else {
                    match engine.start_round() {
                        Ok(()) => {
                            self.broadcast_game_state();
                            self.sequencer.finish();
                        }
                        Err(e) => self.fault(e),
                    }
                }
            }

            SequenceStep::LobbyReturn => {
                // A finished game returns the room to a re-joinable lobby.
                self.engine = None;
                self.phase = RoomPhase::Lobby;
                self.broadcast(self.lobby_update());
            }
        }
    }

    /// Unrecoverable engine fault: give up on the game, tell everyone,
    /// and put the room back in the lobby rather than crashing.
    fn fault(&mut self, error: EngineError) {
        tracing::error!(room = %self.code, %error, "fatal room fault — resetting to lobby");
        self.broadcast(ServerEvent::RoomFault { message: error.to_string() });
        self.engine = None;
        self.phase = RoomPhase::Lobby;
        self.sequencer.finish();
        self.broadcast(self.lobby_update());
    }

    fn lobby_update(&self) -> ServerEvent {
        ServerEvent::LobbyUpdate {
            room_code: self.code.clone(),
            host: self.host,
            roster: self.roster.clone(),
            phase: self.phase,
        }
    }

    fn broadcast_game_state(&self) {
        let Some(engine) = self.engine.as_ref() else {
            return;
        };
        let players: Vec<SeatView> = engine
            .players()
            .iter()
            .map(|p| SeatView {
                id: p.id(),
                name: p.name().to_string(),
                lives: p.lives(),
                is_out: p.is_out(),
                card: p.card(),
            })
            .collect();

        self.broadcast(ServerEvent::GameStateUpdate {
            room_code: self.code.clone(),
            host: self.host,
            phase: self.phase,
            players,
            dealer_index: engine.dealer_index(),
            current_turn_index: engine.current_turn_index(),
            last_turn_index: engine.last_turn_index(),
        });
    }

    /// Sends an event to everyone still connected. Dropped receivers are
    /// skipped silently; a room with no listeners left still finishes
    /// its sequence harmlessly.
    fn broadcast(&self, event: ServerEvent) {
        for sender in self.senders.values() {
            let _ = sender.send(event.clone());
        }
    }

    fn send_to(&self, player: PlayerId, event: ServerEvent) {
        if let Some(sender) = self.senders.get(&player) {
            let _ = sender.send(event);
        }
    }
}
