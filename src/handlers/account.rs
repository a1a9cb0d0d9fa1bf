// src/handlers/account.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    response::IntoResponse,
};
use sqlx::{QueryBuilder, Sqlite, SqlitePool};
use validator::Validate;

use crate::{
    error::{AppError, conflict_on_unique},
    handlers::auth::duplicate_account_message,
    models::account::{Account, PublicAccount, UpdateAccountRequest},
    utils::{hash::hash_password, jwt::AuthContext},
};

/// Public profile (name and icon) of any account.
pub async fn get_account(
    State(pool): State<SqlitePool>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let account = sqlx::query_as::<_, PublicAccount>(
        "SELECT id, username, icon FROM accounts WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(&pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))?;

    Ok(Json(account))
}

/// Full profile of the caller.
pub async fn get_me(
    State(pool): State<SqlitePool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(fetch_account(&pool, auth.user_id).await?))
}

/// Profile settings: partial update of the caller's own account.
pub async fn update_me(
    State(pool): State<SqlitePool>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let account = update_account(&pool, auth.user_id, payload, None).await?;
    tracing::info!("Account {} updated its profile", account.id);

    Ok(Json(account))
}

pub(crate) async fn fetch_account(pool: &SqlitePool, id: i64) -> Result<Account, AppError> {
    sqlx::query_as::<_, Account>(
        r#"
        SELECT id, fname, lname, username, email, password, icon, role, created_at
        FROM accounts
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await?
    .ok_or(AppError::NotFound("User not found".to_string()))
}

/// Applies the present fields of `payload` (and `role`, admin only) to an
/// account and returns the updated row.
pub(crate) async fn update_account(
    pool: &SqlitePool,
    id: i64,
    payload: UpdateAccountRequest,
    role: Option<String>,
) -> Result<Account, AppError> {
    if payload.is_empty() && role.is_none() {
        return fetch_account(pool, id).await;
    }

    let password = payload.password.as_deref().map(hash_password).transpose()?;

    let mut builder: QueryBuilder<Sqlite> = QueryBuilder::new("UPDATE accounts SET ");
    let mut separated = builder.separated(", ");

    if let Some(fname) = payload.fname {
        separated.push("fname = ");
        separated.push_bind_unseparated(fname);
    }

    if let Some(lname) = payload.lname {
        separated.push("lname = ");
        separated.push_bind_unseparated(lname);
    }

    if let Some(username) = payload.username {
        separated.push("username = ");
        separated.push_bind_unseparated(username);
    }

    if let Some(email) = payload.email {
        separated.push("email = ");
        separated.push_bind_unseparated(email);
    }

    if let Some(hashed) = password {
        separated.push("password = ");
        separated.push_bind_unseparated(hashed);
    }

    if let Some(icon) = payload.icon {
        separated.push("icon = ");
        separated.push_bind_unseparated(icon);
    }

    if let Some(role) = role {
        separated.push("role = ");
        separated.push_bind_unseparated(role);
    }

    builder.push(" WHERE id = ");
    builder.push_bind(id);

    let result = builder.build().execute(pool).await.map_err(|e| {
        let message = duplicate_account_message(&e);
        conflict_on_unique(e, message)
    })?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound("User not found".to_string()));
    }

    fetch_account(pool, id).await
}
