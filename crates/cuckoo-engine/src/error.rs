//! Error types for the rules engine.

use crate::player::PlayerId;
use crate::round::RoundPhase;

/// Errors that can occur while driving the round engine.
///
/// The first group are validation errors: the request was wrong, nothing
/// was mutated, and the message belongs back at the submitting player.
/// The last two are structural invariant breaches: programming errors
/// that make the room unrecoverable, not user mistakes.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// The seating is fixed once a game starts.
    #[error("players can only be set once per game")]
    PlayersAlreadySet,

    /// A game needs at least two seats.
    #[error("need at least 2 players, got {0}")]
    NotEnoughPlayers(usize),

    /// A round can only start from the awaiting-round-start phase.
    #[error("cannot start a round in the {0} phase")]
    CannotStartRound(RoundPhase),

    /// An action arrived while no turn was in progress.
    #[error("no turn in progress (phase is {0})")]
    RoundNotInProgress(RoundPhase),

    /// An action arrived from a player who is not at the current seat.
    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerId),

    /// The deck-draw action is reserved for the final seat in rotation.
    #[error("only the last player may draw from the deck")]
    DeckNotAvailable,

    /// Outcome requested outside the resolving phase.
    #[error("no outcome to determine in the {0} phase")]
    NotResolving(RoundPhase),

    /// Winner requested while more than one player remains.
    #[error("game is still in progress")]
    GameStillRunning,

    /// Everyone was eliminated at once; there is no winner to name.
    #[error("no surviving player")]
    NoSurvivingPlayer,

    /// The deck ran out mid-deal. The reshuffle guard makes this
    /// unreachable; hitting it means the round state is corrupt.
    #[error("deck exhausted mid-round")]
    DeckExhausted,

    /// An active player reached resolution without a card.
    #[error("active player {0} has no card at resolution")]
    MissingCard(PlayerId),
}

impl EngineError {
    /// `true` for structural invariant breaches that poison the room,
    /// as opposed to per-action validation failures.
    pub fn is_fatal(&self) -> bool {
        matches!(self, EngineError::DeckExhausted | EngineError::MissingCard(_))
    }
}
