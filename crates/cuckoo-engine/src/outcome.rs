//! Round outcome descriptors.

use serde::{Deserialize, Serialize};

use crate::player::PlayerId;

/// Which of the mutually-exclusive outcome branches fired.
///
/// Precedence is quad > trip > default; exactly one kind is produced per
/// round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum OutcomeKind {
    /// Four of a rank: every holder is eliminated outright.
    QuadElimination,
    /// Three of a rank: the holder(s) at the lowest life count lose a life.
    TripOutcome,
    /// The unpaired player with the lowest rank loses a life.
    LowestCard,
    /// Every rank was paired; nobody loses a life.
    Draw,
}

/// The result of resolving one round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    pub kind: OutcomeKind,
    /// Players who lost a life (or were eliminated) this round.
    pub losers: Vec<PlayerId>,
    /// Human-readable round summary, suitable for a game log.
    pub log: String,
}
