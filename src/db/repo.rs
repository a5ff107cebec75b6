use crate::db::models::{Comment, FeedPost, Post, User};
use sqlx::SqlitePool;

const FEED_POST_COLUMNS: &str = r#"
    p.id, p.author_id, p.content, p.created_at,
    (SELECT COUNT(*) FROM post_likes pl WHERE pl.post_id = p.id) AS likes,
    (SELECT COUNT(*) FROM comments c WHERE c.post_id = p.id) AS comments,
    u.name AS author_name,
    u.title AS author_title,
    u.avatar_url AS author_avatar_url
"#;

pub async fn init_db(pool: &SqlitePool) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS users (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            email TEXT UNIQUE NOT NULL,
            password_hash TEXT NOT NULL,
            title TEXT,
            bio TEXT,
            avatar_url TEXT,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS posts (
            id TEXT PRIMARY KEY,
            author_id TEXT NOT NULL REFERENCES users(id),
            content TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS comments (
            id TEXT PRIMARY KEY,
            post_id TEXT NOT NULL REFERENCES posts(id),
            author_id TEXT NOT NULL REFERENCES users(id),
            content TEXT NOT NULL,
            created_at TEXT NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS post_likes (
            post_id TEXT NOT NULL REFERENCES posts(id),
            user_id TEXT NOT NULL REFERENCES users(id),
            PRIMARY KEY (post_id, user_id)
        )
        "#,
    )
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn insert_user(pool: &SqlitePool, user: &User) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO users (id, name, email, password_hash, title, bio, avatar_url, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&user.id)
    .bind(&user.name)
    .bind(&user.email)
    .bind(&user.password_hash)
    .bind(&user.title)
    .bind(&user.bio)
    .bind(&user.avatar_url)
    .bind(user.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_user(pool: &SqlitePool, id: &str) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn get_user_by_email(
    pool: &SqlitePool,
    email: &str,
) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
        .bind(email)
        .fetch_optional(pool)
        .await
}

pub async fn insert_post(pool: &SqlitePool, post: &Post) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO posts (id, author_id, content, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&post.id)
    .bind(&post.author_id)
    .bind(&post.content)
    .bind(post.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

pub async fn get_post(pool: &SqlitePool, id: &str) -> Result<Option<Post>, sqlx::Error> {
    sqlx::query_as::<_, Post>("SELECT * FROM posts WHERE id = ?")
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Newest-first page of the public feed, with authors and counts joined in.
pub async fn feed_posts(
    pool: &SqlitePool,
    skip: i64,
    limit: i64,
) -> Result<Vec<FeedPost>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {FEED_POST_COLUMNS}
        FROM posts p
        LEFT JOIN users u ON u.id = p.author_id
        ORDER BY p.created_at DESC
        LIMIT ? OFFSET ?
        "#
    );

    sqlx::query_as::<_, FeedPost>(&sql)
        .bind(limit)
        .bind(skip)
        .fetch_all(pool)
        .await
}

pub async fn get_feed_post(
    pool: &SqlitePool,
    id: &str,
) -> Result<Option<FeedPost>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {FEED_POST_COLUMNS}
        FROM posts p
        LEFT JOIN users u ON u.id = p.author_id
        WHERE p.id = ?
        "#
    );

    sqlx::query_as::<_, FeedPost>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

pub async fn user_posts(pool: &SqlitePool, author_id: &str) -> Result<Vec<FeedPost>, sqlx::Error> {
    let sql = format!(
        r#"
        SELECT {FEED_POST_COLUMNS}
        FROM posts p
        LEFT JOIN users u ON u.id = p.author_id
        WHERE p.author_id = ?
        ORDER BY p.created_at DESC
        "#
    );

    sqlx::query_as::<_, FeedPost>(&sql)
        .bind(author_id)
        .fetch_all(pool)
        .await
}

pub async fn delete_post(pool: &SqlitePool, id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM post_likes WHERE post_id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM comments WHERE post_id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn insert_comment(pool: &SqlitePool, comment: &Comment) -> Result<(), sqlx::Error> {
    sqlx::query(
        r#"
        INSERT INTO comments (id, post_id, author_id, content, created_at)
        VALUES (?, ?, ?, ?, ?)
        "#,
    )
    .bind(&comment.id)
    .bind(&comment.post_id)
    .bind(&comment.author_id)
    .bind(&comment.content)
    .bind(comment.created_at)
    .execute(pool)
    .await?;

    Ok(())
}

/// Oldest-first page of a post's comments.
pub async fn list_comments(
    pool: &SqlitePool,
    post_id: &str,
    skip: i64,
    limit: i64,
) -> Result<Vec<Comment>, sqlx::Error> {
    sqlx::query_as::<_, Comment>(
        r#"
        SELECT * FROM comments
        WHERE post_id = ?
        ORDER BY created_at ASC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(post_id)
    .bind(limit)
    .bind(skip)
    .fetch_all(pool)
    .await
}

/// Idempotent: liking a post twice leaves a single row.
pub async fn like_post(pool: &SqlitePool, post_id: &str, user_id: &str) -> Result<(), sqlx::Error> {
    sqlx::query("INSERT OR IGNORE INTO post_likes (post_id, user_id) VALUES (?, ?)")
        .bind(post_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

pub async fn unlike_post(
    pool: &SqlitePool,
    post_id: &str,
    user_id: &str,
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM post_likes WHERE post_id = ? AND user_id = ?")
        .bind(post_id)
        .bind(user_id)
        .execute(pool)
        .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use uuid::Uuid;

    async fn test_pool() -> SqlitePool {
        let pool = crate::db::connect("sqlite::memory:").await.unwrap();
        init_db(&pool).await.unwrap();
        pool
    }

    fn test_user(email: &str) -> User {
        User {
            id: Uuid::new_v4().to_string(),
            name: "Ada".to_string(),
            email: email.to_string(),
            password_hash: "hash".to_string(),
            title: None,
            bio: None,
            avatar_url: None,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_insert_and_fetch_user() {
        let pool = test_pool().await;
        let user = test_user("ada@example.com");

        insert_user(&pool, &user).await.unwrap();

        let by_id = get_user(&pool, &user.id).await.unwrap().unwrap();
        assert_eq!(by_id.email, "ada@example.com");

        let by_email = get_user_by_email(&pool, "ada@example.com")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(by_email.id, user.id);

        assert!(get_user_by_email(&pool, "nobody@example.com")
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn test_duplicate_email_rejected() {
        let pool = test_pool().await;
        insert_user(&pool, &test_user("dup@example.com")).await.unwrap();

        let result = insert_user(&pool, &test_user("dup@example.com")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_feed_counts_and_order() {
        let pool = test_pool().await;
        let user = test_user("feed@example.com");
        insert_user(&pool, &user).await.unwrap();

        let older = Post {
            id: Uuid::new_v4().to_string(),
            author_id: user.id.clone(),
            content: "first".to_string(),
            created_at: Utc::now() - chrono::Duration::seconds(10),
        };
        let newer = Post {
            id: Uuid::new_v4().to_string(),
            author_id: user.id.clone(),
            content: "second".to_string(),
            created_at: Utc::now(),
        };
        insert_post(&pool, &older).await.unwrap();
        insert_post(&pool, &newer).await.unwrap();

        like_post(&pool, &older.id, &user.id).await.unwrap();
        // Second like from the same user must not double-count.
        like_post(&pool, &older.id, &user.id).await.unwrap();

        let feed = feed_posts(&pool, 0, 20).await.unwrap();
        assert_eq!(feed.len(), 2);
        assert_eq!(feed[0].content, "second");
        assert_eq!(feed[1].content, "first");
        assert_eq!(feed[1].likes, 1);
        assert_eq!(feed[0].likes, 0);
        assert_eq!(feed[0].author_name.as_deref(), Some("Ada"));

        unlike_post(&pool, &older.id, &user.id).await.unwrap();
        let refreshed = get_feed_post(&pool, &older.id).await.unwrap().unwrap();
        assert_eq!(refreshed.likes, 0);
    }

    #[tokio::test]
    async fn test_delete_post_removes_comments_and_likes() {
        let pool = test_pool().await;
        let user = test_user("del@example.com");
        insert_user(&pool, &user).await.unwrap();

        let post = Post {
            id: Uuid::new_v4().to_string(),
            author_id: user.id.clone(),
            content: "bye".to_string(),
            created_at: Utc::now(),
        };
        insert_post(&pool, &post).await.unwrap();
        like_post(&pool, &post.id, &user.id).await.unwrap();
        insert_comment(
            &pool,
            &Comment {
                id: Uuid::new_v4().to_string(),
                post_id: post.id.clone(),
                author_id: user.id.clone(),
                content: "so long".to_string(),
                created_at: Utc::now(),
            },
        )
        .await
        .unwrap();

        delete_post(&pool, &post.id).await.unwrap();

        assert!(get_post(&pool, &post.id).await.unwrap().is_none());
        let comments = list_comments(&pool, &post.id, 0, 100).await.unwrap();
        assert!(comments.is_empty());
    }
}
