// src/handlers/results.rs

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use sqlx::SqlitePool;
use validator::Validate;

use crate::{
    config::{Config, HISTORY_PAGE_SIZE, LEADERBOARD_PAGE_SIZE},
    error::AppError,
    models::{
        account::PublicAccount,
        attempt::{Attempt, NewAttempt, RecordAttemptRequest},
    },
    quiz::{
        scoring::{Achievement, build_history_summary, build_leaderboard},
        store::QuizStore,
    },
    utils::{
        jwt::AuthContext,
        pagination::{PageParams, paginate},
    },
};

async fn attempts_of(pool: &SqlitePool, user_id: i64) -> Result<Vec<Attempt>, AppError> {
    let attempts = sqlx::query_as::<_, Attempt>(
        r#"
        SELECT id, user_id, username, total_questions, correct_answers, total_points,
               average_time_per_question, achievement, answered_at
        FROM attempts
        WHERE user_id = ?
        ORDER BY id DESC
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch attempts of user {}: {:?}", user_id, e);
        AppError::from(e)
    })?;

    Ok(attempts)
}

/// Records an attempt played out on the client.
///
/// Totals are checked for consistency and the achievement is recomputed from
/// the points, so clients cannot award themselves a tier.
pub async fn record_result(
    State(pool): State<SqlitePool>,
    Extension(auth): Extension<AuthContext>,
    Json(req): Json<RecordAttemptRequest>,
) -> Result<impl IntoResponse, AppError> {
    req.validate()?;

    let achievement = Achievement::from_points(req.total_points);
    let attempt = NewAttempt {
        user_id: auth.user_id,
        username: auth.username.clone(),
        total_questions: req.total_questions,
        correct_answers: req.correct_answers,
        total_points: req.total_points,
        average_time_per_question: req.average_time_per_question,
        achievement: achievement.label().to_string(),
    };

    let id = pool.record_attempt(&attempt).await?;

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": id,
            "achievement": achievement,
        })),
    ))
}

/// The caller's attempts, newest first.
pub async fn list_my_results(
    State(pool): State<SqlitePool>,
    Extension(auth): Extension<AuthContext>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = attempts_of(&pool, auth.user_id).await?;
    Ok(Json(paginate(attempts, params, HISTORY_PAGE_SIZE)))
}

/// History page statistics for the caller.
pub async fn my_summary(
    State(pool): State<SqlitePool>,
    Extension(auth): Extension<AuthContext>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = attempts_of(&pool, auth.user_id).await?;
    Ok(Json(build_history_summary(&attempts, Utc::now())))
}

/// Global leaderboard, recomputed from all attempts on every request.
pub async fn get_leaderboard(
    State(pool): State<SqlitePool>,
    State(config): State<Config>,
    Query(params): Query<PageParams>,
) -> Result<impl IntoResponse, AppError> {
    let attempts = sqlx::query_as::<_, Attempt>(
        r#"
        SELECT id, user_id, username, total_questions, correct_answers, total_points,
               average_time_per_question, achievement, answered_at
        FROM attempts
        ORDER BY id ASC
        "#,
    )
    .fetch_all(&pool)
    .await
    .map_err(|e| {
        tracing::error!("Failed to fetch leaderboard attempts: {:?}", e);
        AppError::from(e)
    })?;

    let accounts = sqlx::query_as::<_, PublicAccount>(
        r#"
        SELECT id, username, icon
        FROM accounts
        WHERE id IN (SELECT DISTINCT user_id FROM attempts)
        "#,
    )
    .fetch_all(&pool)
    .await?;

    let board = build_leaderboard(&attempts, &accounts, config.leaderboard_rule);

    Ok(Json(paginate(board, params, LEADERBOARD_PAGE_SIZE)))
}
