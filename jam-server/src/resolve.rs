use axum::{extract::Query, Json};
use jam_engine::youtube;
use serde::Deserialize;

use crate::{
    errors::{ServerError, ServerResult},
    schemas::ResolvedVideoSchema,
};

#[derive(Debug, Deserialize)]
pub struct ResolveQuery {
    url: Option<String>,
}

#[utoipa::path(
    get,
    path = "/api/youtube/resolve",
    tag = "youtube",
    params(
        ("url" = Option<String>, Query, description = "The video url or raw id to resolve")
    ),
    responses(
        (status = 200, body = ResolvedVideoSchema),
        (status = 400, description = "Missing or unrecognizable url")
    )
)]
pub async fn resolve(Query(query): Query<ResolveQuery>) -> ServerResult<Json<ResolvedVideoSchema>> {
    let url = query
        .url
        .filter(|url| !url.is_empty())
        .ok_or(ServerError::UrlParamRequired)?;

    let video = youtube::resolve(&url)
        .await
        .ok_or(ServerError::InvalidYoutubeUrl)?;

    Ok(Json(video.into()))
}
