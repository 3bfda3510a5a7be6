//! The jam engine, facilitating room coordination, synchronized playback,
//! skip voting, and chat for anonymous listening sessions.

mod clock;
mod protocol;
mod rooms;
mod session;
mod util;

pub mod youtube;

pub use clock::*;
pub use protocol::*;
pub use rooms::*;
pub use session::*;
pub use util::{random_id, AVATAR_PALETTE, ROOM_ID_LENGTH, TRACK_ID_LENGTH, USER_ID_LENGTH};
