use crossbeam::atomic::AtomicCell;
use rand::{thread_rng, Rng};

/// Monotonic counter handing out session ids.
pub(crate) static ID_COUNTER: AtomicCell<u64> = AtomicCell::new(1);

/// The fixed URL-safe alphabet used for room, user, and track ids.
const ID_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789_-";

pub const ROOM_ID_LENGTH: usize = 8;
pub const USER_ID_LENGTH: usize = 10;
pub const TRACK_ID_LENGTH: usize = 8;

/// The avatar colors assigned to users in join order.
pub const AVATAR_PALETTE: [&str; 12] = [
    "#FF5722", "#FF9800", "#FFC107", "#4CAF50", "#2196F3", "#9C27B0", "#E91E63", "#00BCD4",
    "#8BC34A", "#FF5252", "#69F0AE", "#40C4FF",
];

/// Generates an opaque URL-safe id of the given length.
pub fn random_id(length: usize) -> String {
    let mut rng = thread_rng();

    std::iter::repeat(())
        .map(|_| ID_ALPHABET[rng.gen_range(0..ID_ALPHABET.len())] as char)
        .take(length)
        .collect()
}

/// Trims surrounding whitespace and truncates to a maximum amount of characters.
pub(crate) fn clean_name(input: &str, max_length: usize) -> String {
    input.trim().chars().take(max_length).collect()
}
