use axum::{
    Json,
    extract::{Path, State},
};
use std::sync::Arc;

use crate::api::auth::UserOut;
use crate::api::error::ApiError;
use crate::api::posts::PostOut;
use crate::api::server::AppState;
use crate::db::repo;

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<UserOut>, ApiError> {
    let user = repo::get_user(&state.db, &user_id)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    Ok(Json(UserOut::from_user(&user)))
}

pub async fn get_user_posts(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<String>,
) -> Result<Json<Vec<PostOut>>, ApiError> {
    let posts = repo::user_posts(&state.db, &user_id).await?;

    Ok(Json(posts.into_iter().map(PostOut::from_feed_post).collect()))
}
