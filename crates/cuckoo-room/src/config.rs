//! Room configuration.

use cuckoo_sequence::SequenceConfig;

/// Settings for a room instance.
#[derive(Debug, Clone)]
pub struct RoomConfig {
    /// Minimum players required to start a game.
    pub min_players: usize,

    /// Maximum players allowed in the room.
    pub max_players: usize,

    /// Lives used when a start request doesn't specify a count.
    pub default_starting_lives: u8,

    /// Pacing of the round-resolution broadcast sequence.
    pub sequence: SequenceConfig,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            max_players: 8,
            default_starting_lives: 3,
            sequence: SequenceConfig::default(),
        }
    }
}
