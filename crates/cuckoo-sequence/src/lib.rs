//! Timed step scheduler for round resolution.
//!
//! When a round's final turn completes, the room walks through a fixed,
//! delayed broadcast sequence: reveal the hands, announce the outcome,
//! then either deal the next round or declare the game over. The delays
//! are presentation pacing, giving players time to read each step.
//!
//! [`ResolutionSequencer`] owns the timing for that sequence, one instance
//! per room, single-flight. It is designed to sit inside a room actor's
//! `tokio::select!` loop:
//!
//! ```ignore
//! loop {
//!     tokio::select! {
//!         cmd = self.receiver.recv() => { /* handle commands */ }
//!         step = self.sequencer.wait_for_step() => {
//!             self.handle_step(step);
//!         }
//!     }
//! }
//! ```
//!
//! While idle, [`ResolutionSequencer::wait_for_step`] pends forever, so
//! the select loop simply never takes that branch. The sequencer only
//! tracks deadlines; the game mutations and broadcasts belong to the
//! actor, which schedules each following step as it handles the current
//! one. `wait_for_step` is cancel-safe: a deadline survives the future
//! being dropped when another select branch wins.

use std::time::Duration;

use tokio::time::{self, Instant};
use tracing::{debug, warn};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Delays between resolution steps.
#[derive(Debug, Clone)]
pub struct SequenceConfig {
    /// From the final turn (hands revealed) to the outcome announcement.
    pub reveal_delay: Duration,
    /// From the outcome announcement to the next round or game over.
    pub outcome_delay: Duration,
    /// From the game-over announcement to the return to the lobby.
    pub lobby_delay: Duration,
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            reveal_delay: Duration::from_secs(2),
            outcome_delay: Duration::from_secs(2),
            lobby_delay: Duration::from_secs(2),
        }
    }
}

impl SequenceConfig {
    /// The same delay for every step. Handy for tests and demos.
    pub fn uniform(delay: Duration) -> Self {
        Self {
            reveal_delay: delay,
            outcome_delay: delay,
            lobby_delay: delay,
        }
    }
}

// ---------------------------------------------------------------------------
// Steps
// ---------------------------------------------------------------------------

/// The due step handed back by [`ResolutionSequencer::wait_for_step`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequenceStep {
    /// Compute and announce the round outcome.
    Outcome,
    /// Continue: deal the next round, or declare the game over.
    Continuation,
    /// Return a finished game's room to the lobby.
    LobbyReturn,
}

// ---------------------------------------------------------------------------
// Sequencer
// ---------------------------------------------------------------------------

/// Drives the timing of one room's resolution sequence.
///
/// At most one sequence runs at a time; [`ResolutionSequencer::begin`]
/// while a sequence is active is ignored (the room must not start a new
/// round resolution before the previous one finishes).
pub struct ResolutionSequencer {
    config: SequenceConfig,
    pending: Option<(SequenceStep, Instant)>,
}

impl ResolutionSequencer {
    pub fn new(config: SequenceConfig) -> Self {
        Self { config, pending: None }
    }

    /// Whether a sequence is currently in flight. Rooms use this to
    /// reject player actions until the sequence completes.
    pub fn is_active(&self) -> bool {
        self.pending.is_some()
    }

    /// Starts a sequence: the [`SequenceStep::Outcome`] step becomes due
    /// after the reveal delay.
    pub fn begin(&mut self) {
        if self.pending.is_some() {
            warn!("resolution sequence already in flight — begin ignored");
            return;
        }
        self.schedule(SequenceStep::Outcome, self.config.reveal_delay);
    }

    /// After handling `Outcome`: the continuation step becomes due after
    /// the outcome delay.
    pub fn schedule_continuation(&mut self) {
        self.schedule(SequenceStep::Continuation, self.config.outcome_delay);
    }

    /// After a game-over continuation: the lobby return becomes due after
    /// the lobby delay.
    pub fn schedule_lobby_return(&mut self) {
        self.schedule(SequenceStep::LobbyReturn, self.config.lobby_delay);
    }

    /// Ends the sequence without scheduling anything further.
    pub fn finish(&mut self) {
        self.pending = None;
    }

    /// Waits until the scheduled step is due and returns it. Pends
    /// forever while no step is scheduled.
    ///
    /// The caller must handle the step and either schedule the next one
    /// or call [`ResolutionSequencer::finish`]; until it does, nothing
    /// further is due.
    pub async fn wait_for_step(&mut self) -> SequenceStep {
        let Some((step, at)) = self.pending else {
            // Idle: this future never completes, letting a select! loop
            // run its other branches.
            std::future::pending::<()>().await;
            unreachable!()
        };

        time::sleep_until(at).await;
        self.pending = None;
        debug!(?step, "resolution step due");
        step
    }

    fn schedule(&mut self, step: SequenceStep, delay: Duration) {
        self.pending = Some((step, Instant::now() + delay));
        debug!(?step, ?delay, "resolution step scheduled");
    }
}

impl Default for ResolutionSequencer {
    fn default() -> Self {
        Self::new(SequenceConfig::default())
    }
}
