// src/models/attempt.rs

use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use validator::{Validate, ValidationError};

use crate::{config::POINTS_PER_CORRECT, quiz::session::AttemptSummary};

/// Represents the 'attempts' table in the database.
/// One row per finished quiz playthrough; rows are never updated.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub user_id: i64,
    pub username: String,
    pub total_questions: i64,
    pub correct_answers: i64,
    pub total_points: i64,
    pub average_time_per_question: f64,
    pub achievement: String,
    pub answered_at: chrono::DateTime<chrono::Utc>,
}

/// Attempt payload handed to storage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewAttempt {
    pub user_id: i64,
    pub username: String,
    pub total_questions: i64,
    pub correct_answers: i64,
    pub total_points: i64,
    pub average_time_per_question: f64,
    pub achievement: String,
}

impl NewAttempt {
    pub fn from_summary(user_id: i64, username: &str, summary: &AttemptSummary) -> Self {
        Self {
            user_id,
            username: username.to_string(),
            total_questions: summary.total_questions,
            correct_answers: summary.correct_answers,
            total_points: summary.total_points,
            average_time_per_question: summary.average_time_per_question,
            achievement: summary.achievement.label().to_string(),
        }
    }
}

/// DTO for recording an attempt played out on the client.
/// The achievement is always recomputed from the points.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = validate_attempt_totals))]
pub struct RecordAttemptRequest {
    #[validate(range(min = 1, max = 1000))]
    pub total_questions: i64,
    #[validate(range(min = 0))]
    pub correct_answers: i64,
    #[validate(range(min = 0))]
    pub total_points: i64,
    #[validate(range(min = 0.0, max = 100000.0))]
    pub average_time_per_question: f64,
}

/// Points are a multiple of 10, bounded by the question count, and agree
/// with the correct-answer count.
fn validate_attempt_totals(req: &RecordAttemptRequest) -> Result<(), ValidationError> {
    if req.total_points % POINTS_PER_CORRECT != 0 {
        return Err(ValidationError::new("points_not_multiple_of_ten"));
    }
    if req.total_points > req.total_questions * POINTS_PER_CORRECT {
        return Err(ValidationError::new("points_exceed_question_count"));
    }
    if req.correct_answers != req.total_points / POINTS_PER_CORRECT {
        return Err(ValidationError::new("correct_answers_mismatch"));
    }
    Ok(())
}
