//! Codec trait and implementations for serializing wire events.
//!
//! The rest of the stack never touches `serde_json` directly; it goes
//! through the [`Codec`] trait, so the wire format can be swapped (e.g.
//! for a compact binary codec) without touching the room or server
//! layers.

use serde::{Serialize, de::DeserializeOwned};

use crate::ProtocolError;

/// Converts wire events to and from raw bytes.
///
/// `Send + Sync + 'static` because the codec is shared across connection
/// handler tasks.
pub trait Codec: Send + Sync + 'static {
    /// Serializes a value into bytes.
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError>;

    /// Deserializes bytes back into a value.
    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError>;
}

/// A [`Codec`] that uses JSON via `serde_json`.
///
/// Human-readable and inspectable in browser DevTools: the right default
/// for a game whose clients are web pages.
///
/// ## Example
///
/// ```rust
/// use cuckoo_protocol::{Codec, JsonCodec, ClientEvent};
///
/// let codec = JsonCodec;
/// let event = ClientEvent::CreateRoom { player_name: "Gavin".into() };
///
/// let bytes = codec.encode(&event).unwrap();
/// let decoded: ClientEvent = codec.decode(&bytes).unwrap();
/// assert_eq!(event, decoded);
/// ```
#[cfg(feature = "json")]
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonCodec;

#[cfg(feature = "json")]
impl Codec for JsonCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, ProtocolError> {
        serde_json::to_vec(value).map_err(ProtocolError::Encode)
    }

    fn decode<T: DeserializeOwned>(&self, data: &[u8]) -> Result<T, ProtocolError> {
        serde_json::from_slice(data).map_err(ProtocolError::Decode)
    }
}
