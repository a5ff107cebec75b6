use axum::{
    Json, Router,
    routing::{get, post},
};
use chrono::{SecondsFormat, Utc};
use serde_json::json;
use sqlx::SqlitePool;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::api::{auth, posts, users};
use crate::config::EnvConfig;
use crate::db;
use crate::db::repo;

#[derive(Clone)]
pub struct AppState {
    pub db: SqlitePool,
    pub jwt_secret: String,
}

async fn status() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    }))
}

/// Assemble the full router. Tests spawn this directly against their own pool.
pub fn build_app(pool: SqlitePool, jwt_secret: String) -> Router {
    let state = Arc::new(AppState {
        db: pool,
        jwt_secret,
    });

    Router::new()
        .route("/status", get(status))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/id/by_email", get(auth::user_id_by_email))
        .route("/auth/me", get(auth::me))
        .route("/users/{user_id}", get(users::get_user))
        .route("/users/{user_id}/posts", get(users::get_user_posts))
        .route("/posts", post(posts::create_post).get(posts::list_posts))
        .route(
            "/posts/{post_id}",
            get(posts::get_post).delete(posts::delete_post),
        )
        .route(
            "/posts/{post_id}/comments",
            post(posts::add_comment).get(posts::list_comments),
        )
        .route(
            "/posts/{post_id}/like",
            post(posts::like_post).delete(posts::unlike_post),
        )
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

pub async fn start_server(config: EnvConfig) {
    let pool = db::connect(&config.database_url)
        .await
        .expect("Failed to connect to SQLite");

    repo::init_db(&pool)
        .await
        .expect("Failed to initialize database schema");

    let app = build_app(pool, config.jwt_secret);

    let addr = format!("0.0.0.0:{}", config.port);
    let listener = TcpListener::bind(&addr)
        .await
        .unwrap_or_else(|_| panic!("Failed to bind to {addr}"));

    tracing::info!("Server running on http://{addr}");

    axum::serve(listener, app).await.expect("Server failed");
}
