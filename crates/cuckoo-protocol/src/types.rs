//! Wire event types.
//!
//! Every enum here uses internally tagged JSON (`#[serde(tag = "type")]`),
//! so a message looks like `{ "type": "CreateRoom", "player_name": "Gavin" }`
//! and is easy to dispatch on in a browser client.

use std::fmt;

use cuckoo_engine::{Card, OutcomeKind, PlayerId, TurnAction};
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Room identity
// ---------------------------------------------------------------------------

/// A short, human-typeable room code (e.g. `"K7Q2X"`).
///
/// Codes are unique only among currently-active rooms; once a room is
/// removed its code may be handed out again. Generation and the
/// uniqueness check live in the room registry; this type just carries
/// the value.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(String);

impl RoomCode {
    /// Wraps a code, normalizing to uppercase so lookups are
    /// case-insensitive for typing convenience.
    pub fn new(code: impl Into<String>) -> Self {
        Self(code.into().to_uppercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// Shared views
// ---------------------------------------------------------------------------

/// The lobby lifecycle of a room.
///
/// A finished game returns the room to `Lobby` rather than destroying it,
/// so the same group can go again.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoomPhase {
    Lobby,
    InProgress,
}

/// One lobby roster entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub id: PlayerId,
    pub name: String,
}

/// One seat as exposed to clients: identity, lives, and the current hand.
///
/// `card` is `null` between rounds and for eliminated seats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeatView {
    pub id: PlayerId,
    pub name: String,
    pub lives: u8,
    pub is_out: bool,
    pub card: Option<Card>,
}

// ---------------------------------------------------------------------------
// Client → server
// ---------------------------------------------------------------------------

/// Everything a client can ask the server to do.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientEvent {
    /// Create a new room and become its host.
    CreateRoom { player_name: String },

    /// Join an existing room by code.
    JoinRoom {
        room_code: RoomCode,
        player_name: String,
    },

    /// Host only: start the game with the given starting life count.
    StartGame {
        room_code: RoomCode,
        starting_lives: u8,
    },

    /// Take a turn action in a running game.
    PlayerAction {
        room_code: RoomCode,
        action: TurnAction,
    },
}

// ---------------------------------------------------------------------------
// Server → client
// ---------------------------------------------------------------------------

/// Everything the server can tell a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerEvent {
    /// Sent once on connect: the opaque identity this connection acts as.
    /// Clients use it to find themselves in rosters and seat lists.
    Welcome { player_id: PlayerId },

    /// Lobby state: sent to the whole room whenever the roster or phase
    /// changes outside a running round.
    LobbyUpdate {
        room_code: RoomCode,
        host: PlayerId,
        roster: Vec<RosterEntry>,
        phase: RoomPhase,
    },

    /// Full game-state snapshot: seats, hands, and the three published
    /// rotation indices.
    GameStateUpdate {
        room_code: RoomCode,
        host: PlayerId,
        phase: RoomPhase,
        players: Vec<SeatView>,
        dealer_index: Option<usize>,
        current_turn_index: Option<usize>,
        last_turn_index: Option<usize>,
    },

    /// The result of a resolved round.
    RoundOutcome {
        kind: OutcomeKind,
        log: String,
        losers: Vec<PlayerId>,
    },

    /// The game ended. `winner_name` is `None` in the degenerate case
    /// where a quad eliminated every remaining player at once.
    GameOver { winner_name: Option<String> },

    /// A join attempt failed; sent to the joiner only.
    JoinError { message: String },

    /// An action or start request was rejected; sent to the sender only.
    ActionError { message: String },

    /// The room hit an unrecoverable fault and was reset to the lobby.
    RoomFault { message: String },
}

// =========================================================================
// Tests
// =========================================================================
