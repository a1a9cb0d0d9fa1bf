// src/handlers/admin.rs

use axum::{
    Json,
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use sqlx::{QueryBuilder, Sqlite, SqlitePool, types::Json as SqlJson};
use validator::Validate;

use crate::{
    config::DEFAULT_ICON,
    error::{AppError, conflict_on_unique},
    handlers::{
        account::update_account,
        auth::duplicate_account_message,
        community::{FEED_COLUMNS, insert_post},
    },
    models::{
        account::{Account, SignupRequest, UpdateAccountRequest},
        post::{CreatePostRequest, FeedPost, PostListParams, UpdatePostRequest},
        question::{Question, QuestionRequest, UpdateQuestionRequest, check_correct_index},
        ticket::ContactTicket,
    },
    quiz::runtime::QuizRuntime,
    utils::{hash::hash_password, html::clean_html, jwt::AuthContext},
};

const ROLES: [&str; 2] = ["user", "admin"];

fn check_role(role: &str) -> Result<(), AppError> {
    if ROLES.contains(&role) {
        Ok(())
    } else {
        Err(AppError::BadRequest(format!("Unknown role '{}'", role)))
    }
}

/// `?search=` over names, username and email.
#[derive(Debug, Deserialize)]
pub struct AccountSearchParams {
    pub search: Option<String>,
}

/// Lists all accounts, newest first.
/// Admin only.
pub async fn list_accounts(
    State(pool): State<SqlitePool>,
    Query(params): Query<AccountSearchParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(
        "SELECT id, fname, lname, username, email, password, icon, role, created_at FROM accounts",
    );

    if let Some(search) = params.search.filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", search.trim());
        builder.push(" WHERE fname LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR lname LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR username LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR email LIKE ");
        builder.push_bind(pattern);
    }
    builder.push(" ORDER BY id DESC");

    let accounts = builder
        .build_query_as::<Account>()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list accounts: {:?}", e);
            AppError::from(e)
        })?;

    Ok(Json(accounts))
}

/// DTO for Admin creating an account (can specify role).
#[derive(Debug, Deserialize, Validate)]
pub struct AdminCreateAccountRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub account: SignupRequest,
    pub role: Option<String>, // 'user' or 'admin'
}

/// Creates a new account with a specific role.
/// Admin only.
pub async fn create_account(
    State(pool): State<SqlitePool>,
    Json(payload): Json<AdminCreateAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let role = payload.role.unwrap_or_else(|| "user".to_string());
    check_role(&role)?;

    let req = payload.account;
    let hashed_password = hash_password(&req.password)?;
    let icon = req.icon.unwrap_or_else(|| DEFAULT_ICON.to_string());

    let account = sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO accounts (fname, lname, username, email, password, icon, role, created_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        RETURNING id, fname, lname, username, email, password, icon, role, created_at
        "#,
    )
    .bind(&req.fname)
    .bind(&req.lname)
    .bind(&req.username)
    .bind(&req.email)
    .bind(&hashed_password)
    .bind(&icon)
    .bind(&role)
    .bind(Utc::now())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        let message = duplicate_account_message(&e);
        conflict_on_unique(e, message)
    })?;

    tracing::info!("Admin created account {} ({})", account.id, account.role);

    Ok((StatusCode::CREATED, Json(account)))
}

/// DTO for updating an account. Fields are optional.
#[derive(Debug, Deserialize, Validate)]
pub struct AdminUpdateAccountRequest {
    #[serde(flatten)]
    #[validate(nested)]
    pub fields: UpdateAccountRequest,
    pub role: Option<String>,
}

/// Updates account information.
/// Admin only.
pub async fn update_account_by_admin(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<AdminUpdateAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;
    if let Some(role) = &payload.role {
        check_role(role)?;
    }

    let account = update_account(&pool, id, payload.fields, payload.role).await?;
    Ok(Json(account))
}

/// Deletes an account by ID together with its data.
/// Admin only. Prevents deleting self.
pub async fn delete_account(
    State(pool): State<SqlitePool>,
    State(quiz): State<QuizRuntime>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    if id == auth.user_id {
        return Err(AppError::BadRequest("Cannot delete yourself".to_string()));
    }

    // Login sessions, attempts and posts cascade; tickets keep their author name.
    let result = sqlx::query("DELETE FROM accounts WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete account: {:?}", e);
            AppError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    let dropped = quiz.teardown_user(id).await;
    tracing::info!("Admin deleted account {}, {} quiz session(s) discarded", id, dropped);

    Ok(StatusCode::NO_CONTENT)
}

/// Lists the question pool in storage order.
/// Admin only.
pub async fn list_questions(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let questions = sqlx::query_as::<_, Question>(
        "SELECT id, prompt, options, correct_index, created_at FROM questions ORDER BY id ASC",
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(questions))
}

/// Creates a new quiz question.
/// Admin only.
pub async fn create_question(
    State(pool): State<SqlitePool>,
    Json(payload): Json<QuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let question = sqlx::query_as::<_, Question>(
        r#"
        INSERT INTO questions (prompt, options, correct_index, created_at)
        VALUES (?, ?, ?, ?)
        RETURNING id, prompt, options, correct_index, created_at
        "#,
    )
    .bind(&payload.prompt)
    .bind(SqlJson(&payload.options))
    .bind(payload.correct_index)
    .bind(Utc::now())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to create question: {:?}", e);
        AppError::from(e)
    })?;

    Ok((StatusCode::CREATED, Json(question)))
}

async fn fetch_question(pool: &SqlitePool, id: i64) -> Result<Question, AppError> {
    sqlx::query_as::<_, Question>(
        "SELECT id, prompt, options, correct_index, created_at FROM questions WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("Question not found".to_string()))
}

/// Updates a question by ID.
/// The correct index is checked against the options the question ends up with.
/// Admin only.
pub async fn update_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdateQuestionRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let current = fetch_question(&pool, id).await?;
    if payload.prompt.is_none() && payload.options.is_none() && payload.correct_index.is_none() {
        return Ok(Json(current));
    }

    let option_count = payload
        .options
        .as_ref()
        .map_or(current.options.0.len(), Vec::len);
    let correct_index = payload.correct_index.unwrap_or(current.correct_index);
    check_correct_index(correct_index, option_count)
        .map_err(|_| AppError::BadRequest("correct_index is out of range".to_string()))?;

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE questions SET ");
    let mut separated = builder.separated(", ");

    if let Some(prompt) = payload.prompt {
        separated.push("prompt = ");
        separated.push_bind_unseparated(prompt);
    }

    if let Some(options) = payload.options {
        separated.push("options = ");
        separated.push_bind_unseparated(SqlJson(options));
    }

    if let Some(index) = payload.correct_index {
        separated.push("correct_index = ");
        separated.push_bind_unseparated(index);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    builder.build().execute(&pool).await.map_err(|e| {
        tracing::error!("Failed to update question: {:?}", e);
        AppError::from(e)
    })?;

    Ok(Json(fetch_question(&pool, id).await?))
}

/// Deletes a quiz question by ID.
/// Sessions already running keep their shuffled copy.
/// Admin only.
pub async fn delete_question(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM questions WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to delete question: {:?}", e);
            AppError::from(e)
        })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Question not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Lists posts with their authors, newest first.
/// `q` searches the content and the author's names and username.
/// Admin only.
pub async fn list_posts(
    State(pool): State<SqlitePool>,
    Query(params): Query<PostListParams>,
) -> Result<impl IntoResponse, AppError> {
    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new(FEED_COLUMNS);

    if let Some(q) = params.q.filter(|s| !s.trim().is_empty()) {
        let pattern = format!("%{}%", q.trim());
        builder.push(" WHERE p.content LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR a.fname LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR a.lname LIKE ");
        builder.push_bind(pattern.clone());
        builder.push(" OR a.username LIKE ");
        builder.push_bind(pattern);
    }
    builder.push(" ORDER BY p.id DESC");

    let posts = builder
        .build_query_as::<FeedPost>()
        .fetch_all(&pool)
        .await
        .map_err(|e| {
            tracing::error!("Failed to list posts: {:?}", e);
            AppError::from(e)
        })?;

    Ok(Json(posts))
}

/// Publishes a post as the signed-in admin.
/// Admin only.
pub async fn create_post(
    State(pool): State<SqlitePool>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<CreatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let post = insert_post(&pool, auth.user_id, &payload).await?;
    Ok((StatusCode::CREATED, Json(post)))
}

/// Edits a post by ID. Fields are optional.
/// Admin only.
pub async fn update_post(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
    Json(payload): Json<UpdatePostRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    if payload.content.is_some() || payload.badge.is_some() || payload.image_url.is_some() {
        let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE posts SET ");
        let mut separated = builder.separated(", ");

        if let Some(content) = payload.content {
            separated.push("content = ");
            separated.push_bind_unseparated(clean_html(&content));
        }

        if let Some(badge) = payload.badge {
            separated.push("badge = ");
            separated.push_bind_unseparated(badge);
        }

        if let Some(image_url) = payload.image_url {
            separated.push("image_url = ");
            separated.push_bind_unseparated(image_url);
        }

        builder.push(" WHERE id = ");
        builder.push_bind(id);

        let result = builder.build().execute(&pool).await.map_err(|e| {
            tracing::error!("Failed to update post: {:?}", e);
            AppError::from(e)
        })?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Post not found".to_string()));
        }
    }

    let post = sqlx::query_as::<_, FeedPost>(&format!("{} WHERE p.id = ?", FEED_COLUMNS))
        .bind(id)
        .fetch_optional(&pool)
        .await?
        .ok_or(AppError::NotFound("Post not found".to_string()))?;

    Ok(Json(post))
}

/// Deletes any post by ID.
/// Admin only.
pub async fn delete_post(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let result = sqlx::query("DELETE FROM posts WHERE id = ?")
        .bind(id)
        .execute(&pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("Post not found".to_string()));
    }

    Ok(StatusCode::NO_CONTENT)
}

/// Contact tickets, newest first.
/// Admin only.
pub async fn list_tickets(State(pool): State<SqlitePool>) -> Result<impl IntoResponse, AppError> {
    let tickets = sqlx::query_as::<_, ContactTicket>(
        r#"
        SELECT id, ticket_number, user_id, username, email, description, created_at
        FROM contact_tickets
        ORDER BY id DESC
        "#,
    )
    .fetch_all(&pool)
    .await?;

    Ok(Json(tickets))
}

/// Dashboard counters.
/// Admin only.
pub async fn stats(
    State(pool): State<SqlitePool>,
    State(quiz): State<QuizRuntime>,
) -> Result<impl IntoResponse, AppError> {
    let mut counts = serde_json::Map::new();
    for table in ["accounts", "questions", "attempts", "posts", "contact_tickets"] {
        let count: i64 = sqlx::query_scalar(&format!("SELECT COUNT(*) FROM {}", table))
            .fetch_one(&pool)
            .await?;
        counts.insert(table.to_string(), json!(count));
    }
    counts.insert("live_sessions".to_string(), json!(quiz.live_count().await));

    Ok(Json(serde_json::Value::Object(counts)))
}
