use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::Validate;

use crate::utils::asset::validate_asset_ref;

/// Represents the 'posts' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Post {
    pub id: i64,
    pub user_id: i64,
    pub content: String,

    /// Optional achievement badge the author chose to show off.
    pub badge: Option<String>,
    pub image_url: Option<String>,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// A feed item joined with its author.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct FeedPost {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub fname: String,
    pub lname: String,
    pub icon: String,
    pub content: String,
    pub badge: Option<String>,
    pub image_url: Option<String>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

/// DTO for creating a new post.
#[derive(Debug, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(
        min = 1,
        max = 5000,
        message = "Content length must be between 1 and 5000 chars"
    ))]
    pub content: String,

    #[validate(length(max = 50))]
    pub badge: Option<String>,

    #[validate(length(max = 500), custom(function = validate_asset_ref))]
    pub image_url: Option<String>,
}

/// DTO for admin edits of a post. Absent fields stay unchanged.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdatePostRequest {
    #[validate(length(min = 1, max = 5000))]
    pub content: Option<String>,
    #[validate(length(max = 50))]
    pub badge: Option<String>,
    #[validate(length(max = 500), custom(function = validate_asset_ref))]
    pub image_url: Option<String>,
}

/// Query parameters for listing posts.
#[derive(Debug, Deserialize)]
pub struct PostListParams {
    /// Cursor for pagination: the id of the last post in the previous page.
    pub before: Option<i64>,

    /// Number of items to return (default: 20, max: 100).
    pub limit: Option<i64>,

    /// Search keyword over content and author names (admin listing).
    pub q: Option<String>,
}
