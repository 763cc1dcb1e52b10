//! Per-user video listing.

use super::{VideoEntry, VideoList};
use crate::api::AppState;
use crate::error::{ApiError, Error};
use crate::types::UserId;
use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

/// GET /users/:id/videos - Stored streams of one user
#[utoipa::path(
    get,
    path = "/api/v1/users/{id}/videos",
    tag = "videos",
    params(
        ("id" = i64, Path, description = "Chat user ID")
    ),
    responses(
        (status = 200, description = "Stored streams, newest first", body = VideoList),
        (status = 404, description = "User has never used the bot", body = ApiError),
        (status = 500, description = "Internal server error", body = ApiError)
    )
)]
pub async fn list_user_videos(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, Error> {
    let user_id = UserId(id);

    if state.db.get_user(user_id).await?.is_none() {
        return Err(Error::NotFound(format!("user {}", user_id)));
    }

    let videos = state
        .db
        .list_user_videos(user_id)
        .await?
        .into_iter()
        .map(VideoEntry::from)
        .collect();

    Ok(Json(VideoList {
        user_id: user_id.get(),
        videos,
    }))
}
