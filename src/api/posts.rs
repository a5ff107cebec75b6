use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::auth::CurrentUser;
use crate::api::error::ApiError;
use crate::api::server::AppState;
use crate::db::models::{Comment, FeedPost, Post, User};
use crate::db::repo;

const MAX_POST_LEN: usize = 5000;
const MAX_COMMENT_LEN: usize = 2000;

/// Body for post and comment creation.
#[derive(Deserialize)]
pub struct ContentPayload {
    pub content: String,
}

#[derive(Deserialize)]
pub struct FeedQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_feed_limit")]
    pub limit: i64,
}

fn default_feed_limit() -> i64 {
    20
}

#[derive(Deserialize)]
pub struct CommentQuery {
    #[serde(default)]
    pub skip: i64,
    #[serde(default = "default_comment_limit")]
    pub limit: i64,
}

fn default_comment_limit() -> i64 {
    100
}

#[derive(Debug, Serialize)]
pub struct PostAuthor {
    pub id: Option<String>,
    pub name: String,
    pub title: String,
    pub avatar_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct PostOut {
    pub id: String,
    pub content: String,
    pub created_at: DateTime<Utc>,
    pub likes: i64,
    pub comments: i64,
    pub author: PostAuthor,
}

impl PostOut {
    pub fn from_feed_post(post: FeedPost) -> Self {
        let author = match post.author_name {
            Some(name) => PostAuthor {
                id: Some(post.author_id),
                name,
                title: post.author_title.unwrap_or_else(|| "Member".to_string()),
                avatar_url: post.author_avatar_url,
            },
            // Author row is gone; keep the post readable.
            None => PostAuthor {
                id: None,
                name: "Unknown".to_string(),
                title: "Member".to_string(),
                avatar_url: None,
            },
        };

        Self {
            id: post.id,
            content: post.content,
            created_at: post.created_at,
            likes: post.likes,
            comments: post.comments,
            author,
        }
    }

    fn freshly_created(post: &Post, author: &User) -> Self {
        Self {
            id: post.id.clone(),
            content: post.content.clone(),
            created_at: post.created_at,
            likes: 0,
            comments: 0,
            author: PostAuthor {
                id: Some(author.id.clone()),
                name: author.name.clone(),
                title: author
                    .title
                    .clone()
                    .unwrap_or_else(|| "Member".to_string()),
                avatar_url: author.avatar_url.clone(),
            },
        }
    }
}

fn validated_content(raw: &str, max_len: usize) -> Result<String, ApiError> {
    let content = raw.trim();
    if content.is_empty() {
        return Err(ApiError::Validation("Content cannot be empty.".to_string()));
    }
    if content.chars().count() > max_len {
        return Err(ApiError::Validation(format!(
            "Content cannot exceed {max_len} characters."
        )));
    }
    Ok(content.to_string())
}

pub async fn create_post(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Json(payload): Json<ContentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let content = validated_content(&payload.content, MAX_POST_LEN)?;

    let post = Post {
        id: Uuid::new_v4().to_string(),
        author_id: user.id.clone(),
        content,
        created_at: Utc::now(),
    };
    repo::insert_post(&state.db, &post).await?;

    Ok((
        StatusCode::CREATED,
        Json(PostOut::freshly_created(&post, &user)),
    ))
}

pub async fn list_posts(
    State(state): State<Arc<AppState>>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<Vec<PostOut>>, ApiError> {
    let posts = repo::feed_posts(&state.db, query.skip, query.limit).await?;

    Ok(Json(posts.into_iter().map(PostOut::from_feed_post).collect()))
}

pub async fn get_post(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
) -> Result<Json<PostOut>, ApiError> {
    let post = repo::get_feed_post(&state.db, &post_id)
        .await?
        .ok_or(ApiError::NotFound("Post not found."))?;

    Ok(Json(PostOut::from_feed_post(post)))
}

pub async fn delete_post(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let post = repo::get_post(&state.db, &post_id)
        .await?
        .ok_or(ApiError::NotFound("Post not found."))?;

    if post.author_id != user.id {
        return Err(ApiError::Forbidden("You cannot delete this post."));
    }

    repo::delete_post(&state.db, &post_id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn add_comment(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
    Json(payload): Json<ContentPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let content = validated_content(&payload.content, MAX_COMMENT_LEN)?;

    let post = repo::get_post(&state.db, &post_id)
        .await?
        .ok_or(ApiError::NotFound("Post not found."))?;

    let comment = Comment {
        id: Uuid::new_v4().to_string(),
        post_id: post.id,
        author_id: user.id,
        content,
        created_at: Utc::now(),
    };
    repo::insert_comment(&state.db, &comment).await?;

    Ok((StatusCode::CREATED, Json(comment)))
}

pub async fn list_comments(
    State(state): State<Arc<AppState>>,
    Path(post_id): Path<String>,
    Query(query): Query<CommentQuery>,
) -> Result<Json<Vec<Comment>>, ApiError> {
    let post = repo::get_post(&state.db, &post_id)
        .await?
        .ok_or(ApiError::NotFound("Post not found."))?;

    let comments = repo::list_comments(&state.db, &post.id, query.skip, query.limit).await?;

    Ok(Json(comments))
}

pub async fn like_post(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let post = repo::get_post(&state.db, &post_id)
        .await?
        .ok_or(ApiError::NotFound("Post not found."))?;

    repo::like_post(&state.db, &post.id, &user.id).await?;

    Ok(StatusCode::NO_CONTENT)
}

pub async fn unlike_post(
    State(state): State<Arc<AppState>>,
    CurrentUser(user): CurrentUser,
    Path(post_id): Path<String>,
) -> Result<StatusCode, ApiError> {
    let post = repo::get_post(&state.db, &post_id)
        .await?
        .ok_or(ApiError::NotFound("Post not found."))?;

    repo::unlike_post(&state.db, &post.id, &user.id).await?;

    Ok(StatusCode::NO_CONTENT)
}
