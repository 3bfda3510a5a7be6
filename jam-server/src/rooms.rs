use axum::{
    body::Bytes,
    extract::Path,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json,
};

use crate::{
    context::ServerContext,
    errors::{ServerError, ServerResult},
    schemas::{CreateRoomSchema, RoomCreatedSchema, RoomSchema},
    Router,
};

#[utoipa::path(
    post,
    path = "/api/rooms",
    tag = "rooms",
    request_body = CreateRoomSchema,
    responses(
        (status = 201, body = RoomCreatedSchema)
    )
)]
pub async fn create_room(context: ServerContext, body: Bytes) -> impl IntoResponse {
    // A missing or malformed body counts as no options at all.
    let schema: CreateRoomSchema = serde_json::from_slice(&body).unwrap_or_default();

    let room = context.rooms.create_room(schema.name);

    (StatusCode::CREATED, Json(RoomCreatedSchema::from(room)))
}

#[utoipa::path(
    get,
    path = "/api/rooms",
    tag = "rooms",
    responses(
        (status = 200, body = Vec<RoomSchema>)
    )
)]
pub async fn list_rooms(context: ServerContext) -> Json<Vec<RoomSchema>> {
    let rooms: Vec<_> = context
        .rooms
        .list_rooms()
        .into_iter()
        .map(RoomSchema::from)
        .collect();

    Json(rooms)
}

#[utoipa::path(
    get,
    path = "/api/rooms/{id}",
    tag = "rooms",
    responses(
        (status = 200, body = RoomSchema),
        (status = 404, description = "Room not found")
    )
)]
pub async fn room(context: ServerContext, Path(id): Path<String>) -> ServerResult<Json<RoomSchema>> {
    context
        .rooms
        .room_summary(&id)
        .map(|room| Json(room.into()))
        .ok_or(ServerError::RoomNotFound)
}

pub fn router() -> Router {
    Router::new()
        .route("/", post(create_room))
        .route("/", get(list_rooms))
        .route("/:id", get(room))
}
