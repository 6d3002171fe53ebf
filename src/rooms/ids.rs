use rand::Rng;
use uuid::Uuid;

pub const ROOM_ID_LENGTH: usize = 6;

/// Room code alphabet: upper-case letters and digits without I, O, 0 and 1.
pub const ROOM_ID_CHARS: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

/// Source of candidate room codes. The registry retries on collision, so an
/// implementation only has to produce well-formed codes.
pub trait RoomIdSource: Send + Sync {
    fn next_id(&self) -> String;
}

/// Uniformly random codes from the thread-local RNG.
#[derive(Debug, Default, Clone, Copy)]
pub struct RandomRoomIds;

impl RoomIdSource for RandomRoomIds {
    fn next_id(&self) -> String {
        let mut rng = rand::rng();
        (0..ROOM_ID_LENGTH)
            .map(|_| ROOM_ID_CHARS[rng.random_range(0..ROOM_ID_CHARS.len())] as char)
            .collect()
    }
}

pub fn generate_player_id() -> String {
    Uuid::new_v4().to_string()
}

/// Room codes are case-insensitive; lookups go through this.
pub fn normalize_room_id(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}
