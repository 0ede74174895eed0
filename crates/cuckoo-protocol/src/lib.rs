//! Wire protocol for the Cuckoo game server.
//!
//! This crate defines the "language" clients and the server speak:
//!
//! - **Types** ([`ClientEvent`], [`ServerEvent`], [`SeatView`], etc.) —
//!   the message structures that travel on the wire.
//! - **Codec** ([`Codec`] trait, [`JsonCodec`]) — how those messages are
//!   converted to/from bytes.
//! - **Errors** ([`ProtocolError`]) — what can go wrong while encoding or
//!   decoding.
//!
//! The protocol layer sits between transport (raw bytes) and the room
//! layer (game orchestration). It knows nothing about connections or
//! timing, only message shapes. Internal engine state (deck contents,
//! seat bookkeeping beyond the three published indices) never appears
//! here.

mod codec;
mod error;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use types::{ClientEvent, RoomCode, RoomPhase, RosterEntry, SeatView, ServerEvent};

// The engine value types that appear in wire payloads.
pub use cuckoo_engine::{Card, OutcomeKind, PlayerId, Rank, Suit, TurnAction};
