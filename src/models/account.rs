// src/models/account.rs

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::utils::asset::validate_asset_ref;

/// Represents the 'accounts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct Account {
    pub id: i64,
    pub fname: String,
    pub lname: String,

    /// Unique display name.
    pub username: String,

    /// Unique contact address.
    pub email: String,

    /// Argon2 password hash.
    /// Skipped during serialization to prevent leaking sensitive data.
    #[serde(skip)]
    pub password: String,

    /// Icon reference (site-relative path or absolute URL).
    pub icon: String,

    /// 'user' or 'admin'.
    pub role: String,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// What other players may see of an account.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize, PartialEq, Eq)]
pub struct PublicAccount {
    pub id: i64,
    pub username: String,
    pub icon: String,
}

/// DTO for creating a new account (Sign up).
#[derive(Debug, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 50, message = "First name is required."))]
    pub fname: String,
    #[validate(length(min = 1, max = 50, message = "Last name is required."))]
    pub lname: String,
    #[validate(length(
        min = 3,
        max = 50,
        message = "Username length must be between 3 and 50 characters."
    ))]
    pub username: String,
    #[validate(email(message = "Email address is invalid."))]
    pub email: String,
    #[validate(custom(function = validate_password_policy))]
    pub password: String,
    #[validate(length(max = 500), custom(function = validate_asset_ref))]
    pub icon: Option<String>,
}

/// DTO for user login.
#[derive(Debug, Deserialize, Validate)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 50, message = "Username is required."))]
    pub username: String,
    #[validate(length(min = 1, max = 128, message = "Password is required."))]
    pub password: String,
}

/// DTO for profile settings. Absent fields stay unchanged.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateAccountRequest {
    #[validate(length(min = 1, max = 50))]
    pub fname: Option<String>,
    #[validate(length(min = 1, max = 50))]
    pub lname: Option<String>,
    #[validate(length(min = 3, max = 50))]
    pub username: Option<String>,
    #[validate(email)]
    pub email: Option<String>,
    #[validate(custom(function = validate_password_policy))]
    pub password: Option<String>,
    #[validate(length(max = 500), custom(function = validate_asset_ref))]
    pub icon: Option<String>,
}

impl UpdateAccountRequest {
    pub fn is_empty(&self) -> bool {
        self.fname.is_none()
            && self.lname.is_none()
            && self.username.is_none()
            && self.email.is_none()
            && self.password.is_none()
            && self.icon.is_none()
    }
}

const SPECIAL_CHARS: &str = r"!@#$%^&*()_+{}\[\]:;<>,.?~\\/-";

static PASSWORD_ALPHABET: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"^[A-Za-z\d{}]{{8,}}$", SPECIAL_CHARS)).expect("valid password regex")
});
static HAS_UPPER: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[A-Z]").expect("valid regex"));
static HAS_DIGIT: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\d").expect("valid regex"));
static HAS_SPECIAL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"[{}]", SPECIAL_CHARS)).expect("valid special-char regex")
});

/// Password policy: at least 8 characters drawn from letters, digits and
/// the allowed special characters, with one uppercase letter, one digit and
/// one special character.
pub fn validate_password_policy(password: &str) -> Result<(), validator::ValidationError> {
    let ok = PASSWORD_ALPHABET.is_match(password)
        && HAS_UPPER.is_match(password)
        && HAS_DIGIT.is_match(password)
        && HAS_SPECIAL.is_match(password);

    if !ok {
        let mut err = validator::ValidationError::new("weak_password");
        err.message = Some("Password does not meet security requirements.".into());
        return Err(err);
    }
    Ok(())
}
