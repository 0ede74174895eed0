//! The draw pile: an ordered sequence of the 52 canonical cards.

use rand::seq::SliceRandom;

use crate::card::{Card, Rank, Suit};

/// A deck of cards. Fresh decks are ordered; call [`Deck::shuffle`] before
/// dealing.
///
/// The deck never tracks dealt cards; once drawn, a card belongs to a
/// player until round cleanup drops it. Callers are responsible for
/// resetting before the deck runs dry (the round engine reserves one spare
/// card per round so the final seat can always draw).
#[derive(Debug, Clone)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Creates a full, ordered 52-card deck.
    pub fn new() -> Self {
        let mut deck = Self { cards: Vec::with_capacity(52) };
        deck.reset();
        deck
    }

    /// Rebuilds the full 52-card set, discarding any prior draw state.
    pub fn reset(&mut self) {
        self.cards.clear();
        for suit in Suit::ALL {
            for rank in Rank::ALL {
                self.cards.push(Card::new(suit, rank));
            }
        }
    }

    /// Shuffles the remaining cards into a uniform random permutation.
    pub fn shuffle(&mut self) {
        self.cards.shuffle(&mut rand::rng());
    }

    /// Removes and returns the top card, or `None` if the deck is empty.
    ///
    /// An empty draw is an invariant breach upstream; the reshuffle guard
    /// in the round engine must prevent it.
    pub fn draw(&mut self) -> Option<Card> {
        self.cards.pop()
    }

    /// Number of undrawn cards.
    pub fn remaining(&self) -> usize {
        self.cards.len()
    }
}

impl Default for Deck {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn test_fresh_deck_has_52_unique_cards() {
        let mut deck = Deck::new();
        let mut seen = HashSet::new();
        while let Some(card) = deck.draw() {
            assert!(seen.insert((card.suit, card.rank)), "duplicate {card}");
        }
        assert_eq!(seen.len(), 52);
    }

    #[test]
    fn test_shuffled_deck_still_has_52_unique_cards() {
        let mut deck = Deck::new();
        deck.shuffle();
        let mut seen = HashSet::new();
        while let Some(card) = deck.draw() {
            assert!(seen.insert((card.suit, card.rank)), "duplicate {card}");
        }
        assert_eq!(seen.len(), 52);
    }

    #[test]
    fn test_draw_never_repeats_before_reset() {
        // Draw the whole deck twice with a reset in between; within each
        // pass every card must be distinct.
        let mut deck = Deck::new();
        deck.shuffle();
        for _ in 0..2 {
            let mut seen = HashSet::new();
            for _ in 0..52 {
                let card = deck.draw().unwrap();
                assert!(seen.insert((card.suit, card.rank)));
            }
            assert_eq!(deck.remaining(), 0);
            assert!(deck.draw().is_none());
            deck.reset();
            deck.shuffle();
        }
    }

    #[test]
    fn test_remaining_counts_down() {
        let mut deck = Deck::new();
        assert_eq!(deck.remaining(), 52);
        deck.draw();
        deck.draw();
        assert_eq!(deck.remaining(), 50);
        deck.reset();
        assert_eq!(deck.remaining(), 52);
    }
}
