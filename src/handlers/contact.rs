// src/handlers/contact.rs

use axum::{Extension, Json, extract::State, http::StatusCode, response::IntoResponse};
use chrono::Utc;
use serde_json::json;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    error::AppError,
    handlers::account::fetch_account,
    models::ticket::{ContactRequest, generate_ticket_number},
    utils::{html::clean_html, jwt::AuthContext},
};

/// Files a support ticket addressed to the admins.
///
/// Returns the six-digit ticket number the player can quote later.
pub async fn contact_admin(
    State(pool): State<SqlitePool>,
    Extension(auth): Extension<AuthContext>,
    Json(payload): Json<ContactRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let description = clean_html(&payload.description);
    if description.trim().is_empty() {
        return Err(AppError::BadRequest("Please describe your concern.".to_string()));
    }

    let email = match payload.email {
        Some(email) => email,
        None => fetch_account(&pool, auth.user_id).await?.email,
    };

    let ticket_number = generate_ticket_number(&mut rand::thread_rng());

    sqlx::query(
        r#"
        INSERT INTO contact_tickets (ticket_number, user_id, username, email, description, created_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(&ticket_number)
    .bind(auth.user_id)
    .bind(&auth.username)
    .bind(&email)
    .bind(&description)
    .bind(Utc::now())
    .execute(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to store contact ticket: {:?}", e);
        AppError::from(e)
    })?;

    tracing::info!("User {} opened ticket #{}", auth.user_id, ticket_number);

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "success": true,
            "ticket_number": ticket_number,
        })),
    ))
}
