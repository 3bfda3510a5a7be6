use axum::{response::IntoResponse, Json};
use utoipa::OpenApi;

use crate::{
    resolve, rooms,
    schemas::{CreateRoomSchema, ResolvedVideoSchema, RoomCreatedSchema, RoomSchema},
};

#[derive(OpenApi)]
#[openapi(
    info(description = "jam-server exposes endpoints to create and inspect listening rooms"),
    paths(rooms::create_room, rooms::list_rooms, rooms::room, resolve::resolve),
    components(schemas(CreateRoomSchema, RoomCreatedSchema, RoomSchema, ResolvedVideoSchema))
)]
pub struct ApiDoc;

pub async fn docs() -> impl IntoResponse {
    Json(ApiDoc::openapi())
}
