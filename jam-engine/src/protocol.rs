use serde::{Deserialize, Serialize};
use serde_json::Value;

/// One queued video reference.
///
/// Only `id`, `youtube_id`, and `added_by` matter to the engine; title and
/// thumbnail are opaque payload passed through to clients. `added_by_name` is
/// snapshotted when the track is added and never refreshed.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Track {
    pub id: String,
    pub youtube_id: String,
    pub title: String,
    pub thumbnail: String,
    pub duration: f64,
    pub added_by: String,
    pub added_by_name: String,
}

/// One participant as seen by clients.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: String,
    pub name: String,
    pub color: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaybackState {
    Playing,
    Paused,
}

/// The full room snapshot sent to a joining participant.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SerializedRoom {
    pub id: String,
    pub name: String,
    pub host_id: Option<String>,
    pub queue: Vec<Track>,
    pub current_index: i64,
    pub playback_state: PlaybackState,
    /// The current track position, computed at serialization time.
    pub elapsed: f64,
    pub started_at: u64,
    pub users: Vec<User>,
    pub skip_votes: usize,
    pub skip_needed: usize,
    pub crossfade_duration: f64,
}

/// The closed set of messages clients can send.
///
/// Fields the engine must coerce rather than reject (`time`, `text`,
/// `duration`) are decoded as raw values; everything else that fails to
/// decode makes the whole frame parse to nothing, and the dispatcher drops
/// it silently.
#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    #[serde(rename = "join")]
    Join {
        #[serde(default)]
        room_id: String,
        #[serde(default)]
        user_name: String,
    },
    #[serde(rename = "queue:add")]
    QueueAdd {
        #[serde(default)]
        url: String,
    },
    #[serde(rename = "queue:remove")]
    QueueRemove {
        #[serde(default)]
        track_id: String,
    },
    #[serde(rename = "playback:play")]
    Play,
    #[serde(rename = "playback:pause")]
    Pause,
    #[serde(rename = "playback:skip")]
    Skip,
    #[serde(rename = "playback:seek")]
    Seek {
        #[serde(default)]
        time: Value,
    },
    #[serde(rename = "chat:message")]
    Chat {
        #[serde(default)]
        text: Value,
    },
    #[serde(rename = "crossfade:set")]
    CrossfadeSet {
        #[serde(default)]
        duration: Value,
    },
}

/// Messages the server sends to clients.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    #[serde(rename = "room:state")]
    RoomState { room: SerializedRoom, user_id: String },
    #[serde(rename = "room:error")]
    RoomError { message: String },
    #[serde(rename = "queue:updated")]
    QueueUpdated { queue: Vec<Track>, current_index: i64 },
    #[serde(rename = "playback:sync")]
    PlaybackSync {
        state: PlaybackState,
        current_index: i64,
        elapsed: f64,
        timestamp: u64,
        youtube_id: Option<String>,
    },
    #[serde(rename = "user:joined")]
    UserJoined { user: User },
    #[serde(rename = "user:left")]
    UserLeft { user_id: String },
    #[serde(rename = "skip:votes")]
    SkipVotes { current: usize, needed: usize },
    #[serde(rename = "chat:message")]
    Chat {
        user_id: String,
        user_name: String,
        text: String,
        timestamp: u64,
    },
    #[serde(rename = "crossfade:updated")]
    CrossfadeUpdated { duration: f64 },
}

/// Decodes one inbound frame. `None` means the frame is ignored.
pub fn parse_client_message(frame: &str) -> Option<ClientMessage> {
    serde_json::from_str(frame).ok()
}

/// Coerces a raw value to a finite number, treating anything else as zero.
pub(crate) fn coerce_number(value: &Value) -> f64 {
    value
        .as_f64()
        .or_else(|| value.as_str().and_then(|s| s.trim().parse().ok()))
        .filter(|n: &f64| n.is_finite())
        .unwrap_or(0.0)
}

/// Coerces a raw value to a string, treating anything else as empty.
pub(crate) fn coerce_text(value: &Value) -> &str {
    value.as_str().unwrap_or("")
}
