//! Per-seat player state.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::card::Card;

/// A unique, opaque identifier for a player.
///
/// Assigned per connection by the server layer; the engine only ever
/// compares and reports these.
///
/// `#[serde(transparent)]` keeps the wire form a plain number.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub u64);

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "P-{}", self.0)
    }
}

/// One seat at the table: identity, current hand, and remaining lives.
///
/// In this game a player only ever holds one card. Life bookkeeping is
/// owned by the round engine; `Player` never decides when `is_out`
/// flips, which keeps the `is_out ⇔ lives == 0` invariant in one place.
#[derive(Debug, Clone)]
pub struct Player {
    id: PlayerId,
    name: String,
    lives: u8,
    card: Option<Card>,
    is_out: bool,
}

impl Player {
    pub(crate) fn new(id: PlayerId, name: impl Into<String>, lives: u8) -> Self {
        Self {
            id,
            name: name.into(),
            lives,
            card: None,
            is_out: false,
        }
    }

    pub fn id(&self) -> PlayerId {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn lives(&self) -> u8 {
        self.lives
    }

    /// The player's current hand, if a card has been dealt this round.
    pub fn card(&self) -> Option<Card> {
        self.card
    }

    pub fn is_out(&self) -> bool {
        self.is_out
    }

    /// Puts a card in this player's hand, dropping any card already there.
    pub(crate) fn receive_card(&mut self, card: Card) {
        self.card = Some(card);
    }

    /// Takes the card out of the hand, leaving it empty.
    pub(crate) fn take_card(&mut self) -> Option<Card> {
        self.card.take()
    }

    /// Round cleanup: the hand is emptied, the card is gone for good.
    pub(crate) fn clear_card(&mut self) {
        self.card = None;
    }

    pub(crate) fn set_lives(&mut self, lives: u8) {
        self.lives = lives;
    }

    pub(crate) fn mark_out(&mut self) {
        self.lives = 0;
        self.is_out = true;
    }
}
