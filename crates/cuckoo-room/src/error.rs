//! Error types for the room layer.

use cuckoo_engine::PlayerId;
use cuckoo_protocol::RoomCode;

/// Errors that can occur during room operations.
#[derive(Debug, thiserror::Error)]
pub enum RoomError {
    /// No room with this code exists.
    #[error("Room not found.")]
    NotFound(RoomCode),

    /// The room has no free seats.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// The room's game has already started; late joins are not supported.
    #[error("room {0} has a game in progress")]
    GameInProgress(RoomCode),

    /// The player is already in this room.
    #[error("player {0} already in room {1}")]
    AlreadyJoined(PlayerId, RoomCode),

    /// The player is in a different room; one room at a time.
    #[error("player {0} is already in room {1}")]
    AlreadyInOtherRoom(PlayerId, RoomCode),

    /// The player is not in this room.
    #[error("player {0} not in room {1}")]
    NotInRoom(PlayerId, RoomCode),

    /// The player is not in any room.
    #[error("player {0} is not in any room")]
    NotInAnyRoom(PlayerId),

    /// The room's command channel is closed or full.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}
