use jam_engine::{youtube::ResolvedVideo, RoomSummary};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Options for a new room. The whole body is optional; a missing or
/// malformed body is treated as no options at all.
#[derive(Debug, Default, Deserialize, ToSchema)]
pub struct CreateRoomSchema {
    pub name: Option<String>,
}

/// The response to room creation: just the handle a client needs to join.
#[derive(Debug, Serialize, ToSchema)]
pub struct RoomCreatedSchema {
    pub id: String,
    pub name: String,
}

impl From<RoomSummary> for RoomCreatedSchema {
    fn from(summary: RoomSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RoomSchema {
    pub id: String,
    pub name: String,
    pub user_count: usize,
}

impl From<RoomSummary> for RoomSchema {
    fn from(summary: RoomSummary) -> Self {
        Self {
            id: summary.id,
            name: summary.name,
            user_count: summary.user_count,
        }
    }
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedVideoSchema {
    pub youtube_id: String,
    pub title: String,
    pub thumbnail: String,
}

impl From<ResolvedVideo> for ResolvedVideoSchema {
    fn from(video: ResolvedVideo) -> Self {
        Self {
            youtube_id: video.youtube_id,
            title: video.title,
            thumbnail: video.thumbnail,
        }
    }
}
