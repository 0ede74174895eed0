//! Room code generation.

use cuckoo_protocol::RoomCode;
use rand::Rng;

/// Length of generated room codes.
const CODE_LEN: usize = 5;

/// Uppercase alphanumerics: short enough to read out loud, large enough
/// (36^5 ≈ 60M) that collisions among live rooms stay rare. Uniqueness is
/// still checked against the registry; this function only proposes.
const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Proposes a random room code. The registry retries on collision.
pub(crate) fn random_code() -> RoomCode {
    let mut rng = rand::rng();
    let code: String = (0..CODE_LEN)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect();
    RoomCode::new(code)
}
