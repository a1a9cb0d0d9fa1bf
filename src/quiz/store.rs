// src/quiz/store.rs

use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::{
    error::AppError,
    models::{attempt::NewAttempt, question::Question},
    quiz::session::PoolQuestion,
};

/// Storage the quiz runtime depends on: where questions come from and where
/// finished attempts go.
#[async_trait]
pub trait QuizStore: Send + Sync + 'static {
    /// The full question pool, in storage order.
    async fn question_pool(&self) -> Result<Vec<PoolQuestion>, AppError>;

    /// Persists a finished attempt and returns its id.
    async fn record_attempt(&self, attempt: &NewAttempt) -> Result<i64, AppError>;
}

#[async_trait]
impl QuizStore for SqlitePool {
    async fn question_pool(&self) -> Result<Vec<PoolQuestion>, AppError> {
        let questions = sqlx::query_as::<_, Question>(
            r#"
            SELECT id, prompt, options, correct_index, created_at
            FROM questions
            ORDER BY id ASC
            "#,
        )
        .fetch_all(self)
        .await
        .map_err(|e| {
            tracing::error!("Failed to fetch question pool: {:?}", e);
            AppError::from(e)
        })?;

        Ok(questions.into_iter().map(PoolQuestion::from).collect())
    }

    async fn record_attempt(&self, attempt: &NewAttempt) -> Result<i64, AppError> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO attempts
            (user_id, username, total_questions, correct_answers, total_points,
             average_time_per_question, achievement, answered_at)
            VALUES (?, ?, ?, ?, ?, ?, ?, ?)
            RETURNING id
            "#,
        )
        .bind(attempt.user_id)
        .bind(&attempt.username)
        .bind(attempt.total_questions)
        .bind(attempt.correct_answers)
        .bind(attempt.total_points)
        .bind(attempt.average_time_per_question)
        .bind(&attempt.achievement)
        .bind(chrono::Utc::now())
        .fetch_one(self)
        .await
        .map_err(|e| {
            tracing::error!("Failed to record attempt: {:?}", e);
            AppError::from(e)
        })?;

        Ok(id)
    }
}
