use axum::{
    Extension, Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    models::post::{CreatePostRequest, FeedPost, Post, PostListParams},
    utils::{html::clean_html, jwt::AuthContext},
};

pub(crate) const FEED_COLUMNS: &str = r#"
    SELECT p.id, p.user_id, a.username, a.fname, a.lname, a.icon,
           p.content, p.badge, p.image_url, p.created_at
    FROM posts p
    JOIN accounts a ON a.id = p.user_id
"#;

/// Inserts a post on behalf of `user_id`. Content is sanitized first.
pub(crate) async fn insert_post(
    pool: &SqlitePool,
    user_id: i64,
    payload: &CreatePostRequest,
) -> Result<Post, AppError> {
    let content = clean_html(&payload.content);
    if content.trim().is_empty() {
        return Err(AppError::BadRequest("Post content cannot be empty".to_string()));
    }

    sqlx::query_as::<_, Post>(
        r#"
        INSERT INTO posts (user_id, content, badge, image_url, created_at)
        VALUES (?, ?, ?, ?, ?)
        RETURNING id, user_id, content, badge, image_url, created_at
        "#,
    )
    .bind(user_id)
    .bind(&content)
    .bind(&payload.badge)
    .bind(&payload.image_url)
    .bind(Utc::now())
    .fetch_one(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create post: {:?}", e);
        AppError::from(e)
    })
}

/// Create a new post.
/// Any signed-in player may post, optionally showing off a badge.
pub async fn create_post(
    State(pool): State<SqlitePool>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let post = insert_post(&pool, auth.user_id, &payload).await?;
    tracing::info!("User {} created post {}", auth.user_id, post.id);

    Ok((StatusCode::CREATED, Json(post)))
}

/// List posts (Recent first).
/// Supports cursor-based pagination via `before`.
pub async fn list_posts(
    State(pool): State<SqlitePool>,
    Query(params): Query<PostListParams>,
) -> Result<impl IntoResponse, AppError> {
    let limit = params.limit.unwrap_or(20).clamp(1, 100); // Default 20, max 100

    let sql = format!(
        "{} WHERE (? IS NULL OR p.id < ?) ORDER BY p.id DESC LIMIT ?",
        FEED_COLUMNS
    );
    let posts = sqlx::query_as::<_, FeedPost>(&sql)
        .bind(params.before)
        .bind(params.before)
        .bind(limit)
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list posts: {:?}", e);
            AppError::from(e)
        })?;

    Ok(Json(posts))
}

/// Delete a post (hard delete).
/// Requires: Login + (Author OR Admin).
pub async fn delete_post(
    State(pool): State<SqlitePool>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let author: i64 = sqlx::query_scalar("SELECT user_id FROM posts WHERE id = ?")
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    if author != auth.user_id && !auth.is_admin() {
        return Err(AppError::Forbidden(
            "You are not authorized to delete this post".to_string(),
        ));
    }

    sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete post: {:?}", e);
            AppError::from(e)
        })?;

    Ok(StatusCode::NO_CONTENT)
}
