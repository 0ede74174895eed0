//! The room registry: the one process-wide map from codes to rooms.
//!
//! The registry is an explicit object created at process start and passed
//! by reference to connection handlers, never ambient global state. It
//! owns room creation (including code generation), the player → room
//! index, and teardown of emptied rooms.

use std::collections::HashMap;

use cuckoo_engine::PlayerId;
use cuckoo_protocol::RoomCode;

use crate::code::random_code;
use crate::session::spawn_room;
use crate::{PlayerSender, RoomConfig, RoomError, RoomHandle};

/// Tracks every active room and which player is in which room.
pub struct RoomRegistry {
    /// Active rooms, keyed by code.
    rooms: HashMap<RoomCode, RoomHandle>,

    /// Maps each player to their current room.
    /// A player can be in at most ONE room at a time.
    player_rooms: HashMap<PlayerId, RoomCode>,

    /// Configuration applied to every room this registry creates.
    config: RoomConfig,
}

impl RoomRegistry {
    pub fn new(config: RoomConfig) -> Self {
        Self {
            rooms: HashMap::new(),
            player_rooms: HashMap::new(),
            config,
        }
    }

    /// Creates a room with `host` as its first member and returns the
    /// new code.
    ///
    /// Codes are generated, checked against the live map, and retried on
    /// collision, never assumed unique.
    pub async fn create_room(
        &mut self,
        host: PlayerId,
        name: impl Into<String>,
        sender: PlayerSender,
    ) -> Result<RoomCode, RoomError> {
        if let Some(current) = self.player_rooms.get(&host) {
            return Err(RoomError::AlreadyInOtherRoom(host, current.clone()));
        }

        let code = loop {
            let candidate = random_code();
            if !self.rooms.contains_key(&candidate) {
                break candidate;
            }
            tracing::debug!(code = %candidate, "room code collision — retrying");
        };

        let handle = spawn_room(code.clone(), host, self.config.clone());
        handle.join(host, name, sender).await?;

        self.rooms.insert(code.clone(), handle);
        self.player_rooms.insert(host, code.clone());
        tracing::info!(room = %code, %host, "room created");
        Ok(code)
    }

    /// Adds a player to an existing room.
    pub async fn join_room(
        &mut self,
        player: PlayerId,
        code: &RoomCode,
        name: impl Into<String>,
        sender: PlayerSender,
    ) -> Result<(), RoomError> {
        if let Some(current) = self.player_rooms.get(&player) {
            if current == code {
                return Err(RoomError::AlreadyJoined(player, code.clone()));
            }
            return Err(RoomError::AlreadyInOtherRoom(player, current.clone()));
        }

        let handle = self
            .rooms
            .get(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;

        handle.join(player, name, sender).await?;
        self.player_rooms.insert(player, code.clone());
        Ok(())
    }

    /// Removes a player from their current room. An emptied room is torn
    /// down and its code freed for reuse.
    pub async fn leave_room(&mut self, player: PlayerId) -> Result<(), RoomError> {
        let code = self
            .player_rooms
            .get(&player)
            .cloned()
            .ok_or(RoomError::NotInAnyRoom(player))?;

        let remaining = match self.rooms.get(&code) {
            Some(handle) => handle.leave(player).await?,
            None => 0,
        };
        self.player_rooms.remove(&player);

        if remaining == 0 {
            if let Some(handle) = self.rooms.remove(&code) {
                let _ = handle.shutdown().await;
            }
            tracing::info!(room = %code, "empty room removed");
        }
        Ok(())
    }

    /// Point lookup of a running room.
    pub fn get(&self, code: &RoomCode) -> Option<RoomHandle> {
        self.rooms.get(code).cloned()
    }

    /// Shuts a room down and drops every membership record for it.
    pub async fn remove(&mut self, code: &RoomCode) -> Result<(), RoomError> {
        let handle = self
            .rooms
            .remove(code)
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        let _ = handle.shutdown().await;
        self.player_rooms.retain(|_, room| room != code);
        tracing::info!(room = %code, "room removed");
        Ok(())
    }

    /// The room a player is currently in, if any.
    pub fn player_room(&self, player: &PlayerId) -> Option<&RoomCode> {
        self.player_rooms.get(player)
    }

    /// Number of active rooms.
    pub fn room_count(&self) -> usize {
        self.rooms.len()
    }
}

impl Default for RoomRegistry {
    fn default() -> Self {
        Self::new(RoomConfig::default())
    }
}
