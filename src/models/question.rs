// src/models/question.rs

use serde::{Deserialize, Serialize};
use sqlx::{prelude::FromRow, types::Json};
use validator::{Validate, ValidationError};

use crate::{config::MIN_QUESTION_OPTIONS, quiz::session::PoolQuestion};

/// Represents the 'questions' table in the database.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,

    /// The support-ticket scenario shown to the player.
    pub prompt: String,

    /// Answer options in their stored order.
    /// Stored as a JSON array in the database.
    pub options: Json<Vec<String>>,

    /// Index into `options` of the right answer.
    pub correct_index: i64,

    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl From<Question> for PoolQuestion {
    fn from(q: Question) -> Self {
        PoolQuestion {
            id: q.id,
            prompt: q.prompt,
            options: q.options.0,
            // Negative indexes are treated as malformed by the session loader.
            correct_index: usize::try_from(q.correct_index).unwrap_or(usize::MAX),
        }
    }
}

/// DTO for creating or replacing a question.
#[derive(Debug, Deserialize, Validate)]
#[validate(schema(function = validate_correct_index))]
pub struct QuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub prompt: String,
    #[validate(custom(function = validate_options))]
    pub options: Vec<String>,
    pub correct_index: i64,
}

/// DTO for partial question updates.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateQuestionRequest {
    #[validate(length(min = 1, max = 1000))]
    pub prompt: Option<String>,
    #[validate(custom(function = validate_options))]
    pub options: Option<Vec<String>>,
    pub correct_index: Option<i64>,
}

fn validate_options(options: &[String]) -> Result<(), ValidationError> {
    if options.len() < MIN_QUESTION_OPTIONS {
        return Err(ValidationError::new("not_enough_options"));
    }
    for opt in options {
        if opt.trim().is_empty() {
            return Err(ValidationError::new("option_cannot_be_empty"));
        }
        if opt.len() > 500 {
            return Err(ValidationError::new("option_too_long"));
        }
    }
    Ok(())
}

fn validate_correct_index(req: &QuestionRequest) -> Result<(), ValidationError> {
    check_correct_index(req.correct_index, req.options.len())
}

/// The correct index must point at one of the options.
pub fn check_correct_index(index: i64, option_count: usize) -> Result<(), ValidationError> {
    if index < 0 || index as usize >= option_count {
        return Err(ValidationError::new("correct_index_out_of_range"));
    }
    Ok(())
}
