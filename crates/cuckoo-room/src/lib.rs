//! Room sessions for the Cuckoo game server.
//!
//! Each room runs as an isolated Tokio task (actor model) owning one
//! lobby roster and, once a game starts, one round engine. All mutations
//! for a room flow through its command channel, so within a room every
//! action is applied in arrival order, which is the turn-sequencing guarantee the
//! engine depends on. Rooms never share mutable state; the only shared
//! structure is the [`RoomRegistry`] that maps codes to running rooms.
//!
//! # Key types
//!
//! - [`RoomRegistry`] — creates rooms, routes players, owns the code map
//! - [`RoomHandle`] — send commands to a running room session
//! - [`RoomConfig`] — player limits, default lives, resolution pacing

mod code;
mod config;
mod error;
mod registry;
mod session;

pub use config::RoomConfig;
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use session::{PlayerSender, RoomHandle};
