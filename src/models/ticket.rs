// src/models/ticket.rs

use rand::Rng;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

/// Represents the 'contact_tickets' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct ContactTicket {
    pub id: i64,
    pub ticket_number: String,
    pub user_id: Option<i64>,
    pub username: String,
    pub email: String,
    pub description: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for contacting the admin.
/// When `email` is omitted the account's address is used.
#[derive(Debug, Deserialize, Validate)]
pub struct ContactRequest {
    #[validate(length(min = 1, max = 5000, message = "Please describe your concern."))]
    pub description: String,
    #[validate(email)]
    pub email: Option<String>,
}

/// Six-digit ticket number, never starting with 0.
pub fn generate_ticket_number<R: Rng + ?Sized>(rng: &mut R) -> String {
    rng.gen_range(100_000..=999_999).to_string()
}
