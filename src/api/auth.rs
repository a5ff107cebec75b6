use axum::{
    Json,
    extract::{FromRequestParts, Query, State},
    http::{StatusCode, header, request::Parts},
    response::IntoResponse,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use uuid::Uuid;

use crate::api::error::ApiError;
use crate::api::server::AppState;
use crate::auth::{create_token, decode_token, hash_password, verify_password};
use crate::db::models::User;
use crate::db::repo;

#[derive(Deserialize)]
pub struct RegisterPayload {
    pub name: String,
    pub email: String,
    pub password: String,
    pub title: Option<String>,
    pub bio: Option<String>,
}

#[derive(Deserialize)]
pub struct LoginPayload {
    pub email: String,
    pub password: String,
}

/// Public view of a user; never carries the password hash.
#[derive(Debug, Serialize)]
pub struct UserOut {
    pub id: String,
    pub name: String,
    pub email: String,
    pub title: Option<String>,
    pub bio: Option<String>,
    pub avatar_url: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl UserOut {
    pub fn from_user(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            name: user.name.clone(),
            email: user.email.clone(),
            title: user.title.clone(),
            bio: user.bio.clone(),
            avatar_url: user.avatar_url.clone(),
            created_at: user.created_at,
        }
    }
}

#[derive(Serialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub user: UserOut,
}

/// The authenticated user behind the request's bearer token.
///
/// Handlers take this as an argument; requests without a valid token (or
/// whose user has since disappeared) are rejected with 401 before the
/// handler runs.
pub struct CurrentUser(pub User);

impl FromRequestParts<Arc<AppState>> for CurrentUser {
    type Rejection = ApiError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header_value = parts
            .headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .ok_or(ApiError::MissingCredentials)?;

        let token = header_value
            .strip_prefix("Bearer ")
            .ok_or(ApiError::MissingCredentials)?;

        let user_id = decode_token(token, &state.jwt_secret)?;

        let user = repo::get_user(&state.db, &user_id)
            .await?
            .ok_or(ApiError::UnknownTokenUser)?;

        Ok(CurrentUser(user))
    }
}

fn validate_registration(payload: &RegisterPayload) -> Result<(), ApiError> {
    let name_len = payload.name.trim().chars().count();
    if !(2..=80).contains(&name_len) {
        return Err(ApiError::Validation(
            "Name must be between 2 and 80 characters.".to_string(),
        ));
    }
    if !payload.email.contains('@') {
        return Err(ApiError::Validation("Invalid email address.".to_string()));
    }
    Ok(())
}

pub async fn register(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<RegisterPayload>,
) -> Result<impl IntoResponse, ApiError> {
    validate_registration(&payload)?;

    if repo::get_user_by_email(&state.db, &payload.email)
        .await?
        .is_some()
    {
        return Err(ApiError::EmailTaken);
    }

    let user = User {
        id: Uuid::new_v4().to_string(),
        name: payload.name.trim().to_string(),
        email: payload.email,
        password_hash: hash_password(&payload.password)?,
        title: payload.title,
        bio: payload.bio,
        avatar_url: None,
        created_at: Utc::now(),
    };
    repo::insert_user(&state.db, &user).await?;

    let token = create_token(&user.id, &state.jwt_secret)?;

    Ok((
        StatusCode::CREATED,
        Json(AuthResponse {
            access_token: token,
            user: UserOut::from_user(&user),
        }),
    ))
}

pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginPayload>,
) -> Result<Json<AuthResponse>, ApiError> {
    // Unknown email and wrong password are indistinguishable to the caller.
    let user = repo::get_user_by_email(&state.db, &payload.email)
        .await?
        .ok_or(ApiError::InvalidCredentials)?;

    verify_password(&payload.password, &user.password_hash)?;

    let token = create_token(&user.id, &state.jwt_secret)?;

    Ok(Json(AuthResponse {
        access_token: token,
        user: UserOut::from_user(&user),
    }))
}

#[derive(Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

pub async fn user_id_by_email(
    State(state): State<Arc<AppState>>,
    Query(query): Query<EmailQuery>,
) -> Result<Json<String>, ApiError> {
    let user = repo::get_user_by_email(&state.db, &query.email)
        .await?
        .ok_or(ApiError::NotFound("User not found"))?;

    Ok(Json(user.id))
}

pub async fn me(CurrentUser(user): CurrentUser) -> Json<UserOut> {
    Json(UserOut::from_user(&user))
}
