// src/handlers/auth.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use uuid::Uuid;
use validator::Validate;

use crate::{
    config::{Config, DEFAULT_ICON},
    error::{AppError, conflict_on_unique},
    models::account::{Account, LoginRequest, SignupRequest},
    quiz::runtime::QuizRuntime,
    utils::{
        hash::{hash_password, verify_password},
        jwt::{AuthContext, sign_jwt},
    },
};

/// Picks the 409 message for a UNIQUE violation on `accounts`.
pub(crate) fn duplicate_account_message(err: &sqlx::Error) -> &'static str {
    if err.to_string().contains("accounts.email") {
        "Email already exists."
    } else {
        "Username already exists."
    }
}

/// Registers a new player account.
///
/// Hashes the password using Argon2 before storing it.
/// Returns 201 Created and the account (excluding password).
pub async fn signup(
    State(pool): State<SqlitePool>,
    Json(payload): Json<SignupRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let hashed_password = hash_password(&payload.password)?;
    let icon = payload.icon.unwrap_or_else(|| DEFAULT_ICON.to_string());

    let account = sqlx::query_as::<_, Account>(
        r#"
        INSERT INTO accounts (fname, lname, username, email, password, icon, role, created_at)
        VALUES (?, ?, ?, ?, ?, ?, 'user', ?)
        RETURNING id, fname, lname, username, email, password, icon, role, created_at
        "#,
    )
    .bind(&payload.fname)
    .bind(&payload.lname)
    .bind(&payload.username)
    .bind(&payload.email)
    .bind(&hashed_password)
    .bind(&icon)
    .bind(Utc::now())
    .fetch_one(&pool)
    .await
    .map_err(|e| {
        let message = duplicate_account_message(&e);
        conflict_on_unique(e, message)
    })?;

    tracing::info!("Account {} signed up as '{}'", account.id, account.username);

    Ok((StatusCode::CREATED, Json(account)))
}

/// Authenticates a user and returns a JWT token.
///
/// Opens a login session; the token is only honored while that session is
/// open.
pub async fn login(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Json(payload): Json<LoginRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let account = sqlx::query_as::<_, Account>(
        r#"
        SELECT id, fname, lname, username, email, password, icon, role, created_at
        FROM accounts
        WHERE username = ?
        "#,
    )
    .bind(&payload.username)
    .fetch_optional(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Login DB error: {:?}", e);
        AppError::from(e)
    })?
    .ok_or(AppError::AuthError("User not found".to_string()))?;

    if !verify_password(&payload.password, &account.password)? {
        tracing::info!("Rejected login for '{}': password mismatch", account.username);
        return Err(AppError::AuthError("Invalid password".to_string()));
    }

    let login_id = Uuid::new_v4().to_string();
    sqlx::query("INSERT INTO login_sessions (id, account_id, created_at) VALUES (?, ?, ?)")
        .bind(&login_id)
        .bind(account.id)
        .bind(Utc::now())
        .execute(&pool)
        .await?;

    let token = sign_jwt(
        account.id,
        &login_id,
        &account.role,
        &config.jwt_secret,
        config.jwt_expiration,
    )?;

    tracing::info!("Login successful for '{}'", account.username);

    Ok(Json(json!({
        "token": token,
        "type": "Bearer",
        "user": {
            "id": account.id,
            "username": account.username,
            "icon": account.icon,
            "role": account.role,
        }
    })))
}

/// Ends the current login session.
///
/// The token stops working immediately and quiz sessions started under this
/// login are discarded.
pub async fn logout(
    State(pool): State<SqlitePool>,
    State(quiz): State<QuizRuntime>,
    Extension(auth): Extension<AuthContext>,
) -> Result<impl IntoResponse, AppError> {
    sqlx::query("UPDATE login_sessions SET revoked_at = ? WHERE id = ? AND revoked_at IS NULL")
        .bind(Utc::now())
        .bind(&auth.login_id)
        .execute(&pool)
        .await?;

    let dropped = quiz.teardown_login(&auth.login_id).await;
    tracing::info!(
        "User {} logged out, {} quiz session(s) discarded",
        auth.user_id,
        dropped
    );

    Ok(StatusCode::NO_CONTENT)
}
