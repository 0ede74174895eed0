//! The round/turn state machine and outcome rules.
//!
//! One `RoundEngine` drives one game: a fixed seating of players, a deck,
//! and a dealer pointer that rotates between rounds. Within a round the
//! engine enforces strict turn order; at the end of a round it applies the
//! outcome rules (quad > trip > lowest-card) and the session layer decides
//! what to broadcast.

use std::collections::HashMap;
use std::fmt;

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::card::Rank;
use crate::deck::Deck;
use crate::error::EngineError;
use crate::outcome::{OutcomeKind, RoundOutcome};
use crate::player::{Player, PlayerId};

/// The round lifecycle.
///
/// ```text
/// AwaitingRoundStart → AwaitingTurn → Resolving → AwaitingRoundStart
///                                         │
///                                         └──→ GameOver  (≤1 player left)
/// ```
///
/// Dealing happens inside [`RoundEngine::start_round`]; there is no
/// observable "dealing" state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundPhase {
    /// Between rounds: hands are empty, waiting for the next deal.
    AwaitingRoundStart,
    /// A round is underway; the seat at `current_turn` may act.
    AwaitingTurn,
    /// Every seat has acted; the outcome can be determined.
    Resolving,
    /// At most one player remains; the game is over.
    GameOver,
}

impl fmt::Display for RoundPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RoundPhase::AwaitingRoundStart => write!(f, "AwaitingRoundStart"),
            RoundPhase::AwaitingTurn => write!(f, "AwaitingTurn"),
            RoundPhase::Resolving => write!(f, "Resolving"),
            RoundPhase::GameOver => write!(f, "GameOver"),
        }
    }
}

/// What a player can do on their turn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TurnAction {
    /// Exchange cards with the next active seat (refused by a King).
    Swap,
    /// Keep the dealt card.
    Skip,
    /// Final seat only: replace the hand with a fresh deck draw.
    Deck,
}

/// What actually happened when an action was applied.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ActionEffect {
    /// Cards were exchanged with the named neighbor.
    Swapped { with: PlayerId },
    /// The neighbor held a King; no cards moved.
    SwapBlocked { by: PlayerId },
    /// The acting player drew a replacement card from the deck.
    DrewFromDeck,
    /// No card effect.
    Skipped,
}

/// Result of a successfully applied turn action.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AppliedAction {
    pub effect: ActionEffect,
    /// `true` when this was the final turn and the round entered
    /// [`RoundPhase::Resolving`]: the caller's cue to hand off to the
    /// resolution sequence instead of the ordinary state broadcast.
    pub round_complete: bool,
}

/// The core state machine: one deck, a fixed seating, dealer/turn rotation,
/// and the outcome rules.
#[derive(Debug)]
pub struct RoundEngine {
    deck: Deck,
    players: Vec<Player>,
    /// `None` until the first round seeds a random dealer.
    dealer: Option<usize>,
    current_turn: usize,
    last_turn: usize,
    players_in: usize,
    starting_lives: u8,
    phase: RoundPhase,
}

impl RoundEngine {
    /// Creates an engine with a freshly shuffled deck and no seating yet.
    pub fn new(starting_lives: u8) -> Self {
        let mut deck = Deck::new();
        deck.shuffle();
        Self {
            deck,
            players: Vec::new(),
            dealer: None,
            current_turn: 0,
            last_turn: 0,
            players_in: 0,
            starting_lives: starting_lives.max(1),
            phase: RoundPhase::AwaitingRoundStart,
        }
    }

    /// Fixes the seating for the whole game. Must be called exactly once,
    /// before the first round.
    pub fn set_players(&mut self, roster: &[(PlayerId, String)]) -> Result<(), EngineError> {
        if !self.players.is_empty() {
            return Err(EngineError::PlayersAlreadySet);
        }
        if roster.len() < 2 {
            return Err(EngineError::NotEnoughPlayers(roster.len()));
        }
        for (id, name) in roster {
            self.players.push(Player::new(*id, name.clone(), self.starting_lives));
        }
        self.players_in = self.players.len();
        Ok(())
    }

    /// Starts the next round: reshuffle guard, dealer advance, deal.
    pub fn start_round(&mut self) -> Result<(), EngineError> {
        if self.phase != RoundPhase::AwaitingRoundStart {
            return Err(EngineError::CannotStartRound(self.phase));
        }
        if self.players.is_empty() {
            return Err(EngineError::NotEnoughPlayers(0));
        }

        // One card per active player, plus one spare so the final seat can
        // always draw from the deck.
        if self.deck.remaining() < self.players_in + 1 {
            self.deck.reset();
            self.deck.shuffle();
            tracing::debug!(remaining = self.deck.remaining(), "deck reset and reshuffled");
        }

        self.advance_dealer();
        let dealer = self.dealer.expect("dealer set by advance_dealer");
        self.current_turn = dealer;
        self.last_turn = self.compute_last_turn(dealer);

        // Deal one card to every active seat, dealer first, in seat order.
        let seat_count = self.players.len();
        for offset in 0..seat_count {
            let seat = (dealer + offset) % seat_count;
            if self.players[seat].is_out() {
                continue;
            }
            let card = self.deck.draw().ok_or(EngineError::DeckExhausted)?;
            self.players[seat].receive_card(card);
        }

        self.phase = RoundPhase::AwaitingTurn;
        tracing::debug!(
            dealer,
            last_turn = self.last_turn,
            players_in = self.players_in,
            "round started"
        );
        Ok(())
    }

    /// Applies one turn action for `actor`.
    ///
    /// Hard preconditions: a round must be in progress, `actor` must be the
    /// player at the current seat, and `Deck` is only legal from the final
    /// seat. A rejected action mutates nothing.
    pub fn apply_action(
        &mut self,
        actor: PlayerId,
        action: TurnAction,
    ) -> Result<AppliedAction, EngineError> {
        if self.phase != RoundPhase::AwaitingTurn {
            return Err(EngineError::RoundNotInProgress(self.phase));
        }
        let seat = self.current_turn;
        if self.players[seat].id() != actor {
            return Err(EngineError::NotYourTurn(actor));
        }

        let effect = match action {
            TurnAction::Swap => {
                let neighbor = self.next_active_seat(seat);
                let neighbor_id = self.players[neighbor].id();
                // A King cannot be taken: the swap is refused, no cards
                // move, and the turn is still spent.
                let blocked = self.players[neighbor]
                    .card()
                    .is_some_and(|c| c.rank == Rank::King);
                if blocked {
                    ActionEffect::SwapBlocked { by: neighbor_id }
                } else {
                    let mine = self.players[seat].take_card();
                    let theirs = self.players[neighbor].take_card();
                    if let Some(card) = theirs {
                        self.players[seat].receive_card(card);
                    }
                    if let Some(card) = mine {
                        self.players[neighbor].receive_card(card);
                    }
                    ActionEffect::Swapped { with: neighbor_id }
                }
            }
            TurnAction::Deck => {
                if seat != self.last_turn {
                    return Err(EngineError::DeckNotAvailable);
                }
                // No rank-based refusal here: the King rule applies only
                // to swaps. The reshuffle guard reserved this card.
                let card = self.deck.draw().ok_or(EngineError::DeckExhausted)?;
                self.players[seat].receive_card(card);
                ActionEffect::DrewFromDeck
            }
            TurnAction::Skip => ActionEffect::Skipped,
        };

        let round_complete = seat == self.last_turn;
        if round_complete {
            self.phase = RoundPhase::Resolving;
        } else {
            self.current_turn = self.next_active_seat(seat);
        }

        tracing::debug!(%actor, ?effect, round_complete, "turn applied");
        Ok(AppliedAction { effect, round_complete })
    }

    /// Resolves the round. Exactly one of the three outcome branches
    /// fires: quad elimination, trip, or the lowest-card default (which
    /// degenerates to a draw when every rank is paired).
    pub fn determine_outcome(&mut self) -> Result<RoundOutcome, EngineError> {
        if self.phase != RoundPhase::Resolving {
            return Err(EngineError::NotResolving(self.phase));
        }

        // Rank value → number of active holders.
        let mut counts: HashMap<u8, u8> = HashMap::new();
        for player in self.players.iter().filter(|p| !p.is_out()) {
            let card = player.card().ok_or(EngineError::MissingCard(player.id()))?;
            *counts.entry(card.rank_value()).or_insert(0) += 1;
        }

        let ranks_with_count = |count: u8| {
            let mut ranks: Vec<u8> = counts
                .iter()
                .filter(|&(_, &c)| c == count)
                .map(|(&rank, _)| rank)
                .collect();
            ranks.sort_unstable();
            ranks
        };

        // Quad: every holder is eliminated outright, whatever their lives.
        let quad_ranks = ranks_with_count(4);
        if !quad_ranks.is_empty() {
            let mut losers = Vec::new();
            let seat_order: Vec<usize> = self.seats_from_dealer().collect();
            for seat in seat_order {
                if self.players[seat].is_out() {
                    continue;
                }
                let holds_quad = self.players[seat]
                    .card()
                    .is_some_and(|c| quad_ranks.contains(&c.rank_value()));
                if holds_quad {
                    self.eliminate(seat);
                    losers.push(self.players[seat].id());
                }
            }
            let log = format!("Four of a kind! {} are out of the game", self.names_of(&losers));
            tracing::info!(%log, "round resolved");
            return Ok(RoundOutcome { kind: OutcomeKind::QuadElimination, losers, log });
        }

        // Trip: within each trip group, the holder(s) at the lowest life
        // count lose a life (ties all lose).
        let trip_ranks = ranks_with_count(3);
        if !trip_ranks.is_empty() {
            let mut losers = Vec::new();
            for &rank in &trip_ranks {
                let holders: Vec<usize> = self
                    .seats_from_dealer()
                    .filter(|&seat| {
                        !self.players[seat].is_out()
                            && self.players[seat].card().is_some_and(|c| c.rank_value() == rank)
                    })
                    .collect();
                let min_lives = holders
                    .iter()
                    .map(|&seat| self.players[seat].lives())
                    .min()
                    .expect("a trip rank has holders");
                for &seat in &holders {
                    if self.players[seat].lives() == min_lives {
                        self.lose_life(seat);
                        losers.push(self.players[seat].id());
                    }
                }
            }
            let log = format!("Three of a kind! {} lose a life", self.names_of(&losers));
            tracing::info!(%log, "round resolved");
            return Ok(RoundOutcome { kind: OutcomeKind::TripOutcome, losers, log });
        }

        // Default: only unpaired ("unsafe") players can lose. Equal ranks
        // pair up, so a tie on the lowest unsafe rank should be
        // impossible; scanning in seat order from the dealer resolves it
        // deterministically if it ever happens.
        let unsafe_seats: Vec<usize> = self
            .seats_from_dealer()
            .filter(|&seat| {
                !self.players[seat].is_out()
                    && self.players[seat]
                        .card()
                        .is_some_and(|c| counts.get(&c.rank_value()) == Some(&1))
            })
            .collect();

        if unsafe_seats.is_empty() {
            let log = "All cards are paired — nobody loses a life".to_string();
            tracing::info!(%log, "round resolved");
            return Ok(RoundOutcome { kind: OutcomeKind::Draw, losers: Vec::new(), log });
        }

        let lowest = unsafe_seats
            .iter()
            .map(|&seat| self.players[seat].card().map(|c| c.rank_value()).unwrap_or(u8::MAX))
            .min()
            .expect("unsafe set is non-empty");
        let loser_seat = *unsafe_seats
            .iter()
            .find(|&&seat| {
                self.players[seat].card().is_some_and(|c| c.rank_value() == lowest)
            })
            .expect("a seat holds the lowest rank");

        let loser = &self.players[loser_seat];
        let log = match loser.card() {
            Some(card) => format!("{} loses a life with the {}", loser.name(), card),
            None => format!("{} loses a life", loser.name()),
        };
        let losers = vec![loser.id()];
        self.lose_life(loser_seat);
        tracing::info!(%log, "round resolved");
        Ok(RoundOutcome { kind: OutcomeKind::LowestCard, losers, log })
    }

    /// Round cleanup: every hand is emptied and the phase moves on,
    /// back to awaiting the next round, or to game over when at most one
    /// player remains.
    pub fn clean_up(&mut self) {
        for player in &mut self.players {
            player.clear_card();
        }
        if self.phase == RoundPhase::Resolving {
            self.phase = if self.players_in <= 1 {
                RoundPhase::GameOver
            } else {
                RoundPhase::AwaitingRoundStart
            };
        }
    }

    /// Returns the sole surviving player by advancing the dealer pointer
    /// one more time; the skip-eliminated advance can only land on the
    /// last active seat.
    pub fn determine_winner(&mut self) -> Result<&Player, EngineError> {
        if self.players_in > 1 {
            return Err(EngineError::GameStillRunning);
        }
        if self.players_in == 0 {
            return Err(EngineError::NoSurvivingPlayer);
        }
        self.advance_dealer();
        let dealer = self.dealer.expect("dealer set by advance_dealer");
        Ok(&self.players[dealer])
    }

    /// `true` when the current seat is the final seat of the rotation.
    pub fn is_last_player(&self) -> bool {
        self.phase == RoundPhase::AwaitingTurn && self.current_turn == self.last_turn
    }

    pub fn phase(&self) -> RoundPhase {
        self.phase
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn players_in(&self) -> usize {
        self.players_in
    }

    pub fn dealer_index(&self) -> Option<usize> {
        self.dealer
    }

    pub fn current_turn_index(&self) -> Option<usize> {
        self.dealer.map(|_| self.current_turn)
    }

    pub fn last_turn_index(&self) -> Option<usize> {
        self.dealer.map(|_| self.last_turn)
    }

    pub fn deck_remaining(&self) -> usize {
        self.deck.remaining()
    }

    /// First round: a uniformly random seat. Later rounds: the next seat,
    /// skipping eliminated players.
    fn advance_dealer(&mut self) {
        let dealer = match self.dealer {
            None => {
                let seed = rand::rng().random_range(0..self.players.len());
                if self.players[seed].is_out() {
                    self.next_active_seat(seed)
                } else {
                    seed
                }
            }
            Some(current) => self.next_active_seat(current),
        };
        self.dealer = Some(dealer);
    }

    /// The next active seat strictly after `from`, wrapping. Returns
    /// `from` itself only when it is the sole active seat.
    fn next_active_seat(&self, from: usize) -> usize {
        let seat_count = self.players.len();
        (1..=seat_count)
            .map(|step| (from + step) % seat_count)
            .find(|&seat| !self.players[seat].is_out())
            .expect("at least one active seat")
    }

    /// The final seat of the round's rotation: the last ACTIVE seat
    /// walking backward from the seat just before the dealer. With no
    /// eliminations this is exactly `(dealer + seat_count − 1) mod
    /// seat_count`.
    fn compute_last_turn(&self, dealer: usize) -> usize {
        let seat_count = self.players.len();
        (0..seat_count)
            .map(|back| (dealer + seat_count - 1 - back) % seat_count)
            .find(|&seat| !self.players[seat].is_out())
            .expect("at least one active seat")
    }

    /// Seats in dealing order: dealer first, then clockwise.
    fn seats_from_dealer(&self) -> impl Iterator<Item = usize> + '_ {
        let seat_count = self.players.len();
        let dealer = self.dealer.unwrap_or(0);
        (0..seat_count).map(move |offset| (dealer + offset) % seat_count)
    }

    /// Removes one life, eliminating the player if that was their last.
    /// Lives never go below zero.
    fn lose_life(&mut self, seat: usize) {
        let lives = self.players[seat].lives();
        if lives <= 1 {
            self.eliminate(seat);
        } else {
            self.players[seat].set_lives(lives - 1);
        }
    }

    /// Flags a seat as out exactly once and keeps `players_in` in step.
    fn eliminate(&mut self, seat: usize) {
        if !self.players[seat].is_out() {
            self.players[seat].mark_out();
            self.players_in -= 1;
            tracing::info!(player = %self.players[seat].id(), "player eliminated");
        }
    }

    fn names_of(&self, ids: &[PlayerId]) -> String {
        let names: Vec<&str> = self
            .players
            .iter()
            .filter(|p| ids.contains(&p.id()))
            .map(|p| p.name())
            .collect();
        names.join(", ")
    }
}
