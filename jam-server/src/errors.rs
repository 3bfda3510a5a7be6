use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

pub type ServerResult<T> = Result<T, ServerError>;

#[derive(Debug, Error)]
pub enum ServerError {
    #[error("Room not found")]
    RoomNotFound,
    #[error("url query param required")]
    UrlParamRequired,
    #[error("Invalid YouTube URL")]
    InvalidYoutubeUrl,
}

impl ServerError {
    fn as_status_code(&self) -> StatusCode {
        match self {
            Self::RoomNotFound => StatusCode::NOT_FOUND,
            Self::UrlParamRequired => StatusCode::BAD_REQUEST,
            Self::InvalidYoutubeUrl => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let body = json!({ "error": self.to_string() });

        (self.as_status_code(), Json(body)).into_response()
    }
}
