// src/handlers/quiz.rs

use axum::{
    Extension, Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    error::AppError,
    quiz::runtime::{Action, QuizRuntime},
    utils::jwt::AuthContext,
};

/// Body of the select command.
#[derive(Debug, Deserialize)]
pub struct SelectOptionRequest {
    pub option: usize,
}

/// Starts a quiz session over the whole question pool.
///
/// Question order and option order are shuffled per session. With an empty
/// pool the session is returned in the `loading` phase.
pub async fn start_session(
    State(quiz): State<QuizRuntime>,
    Extension(auth): Extension<AuthContext>,
) -> Result<impl IntoResponse, AppError> {
    let view = quiz.start(auth).await;
    Ok((StatusCode::CREATED, Json(view)))
}

/// Returns the caller's session.
pub async fn get_session(
    State(quiz): State<QuizRuntime>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(quiz.view(&auth, id).await?))
}

pub async fn select_option(
    State(quiz): State<QuizRuntime>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
    Json(req): Json<SelectOptionRequest>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(quiz.apply(&auth, id, Action::Select(req.option)).await?))
}

pub async fn submit_answer(
    State(quiz): State<QuizRuntime>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(quiz.apply(&auth, id, Action::Submit).await?))
}

/// Spends one assist credit on the current question.
pub async fn request_assist(
    State(quiz): State<QuizRuntime>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(quiz.apply(&auth, id, Action::Assist).await?))
}

pub async fn next_question(
    State(quiz): State<QuizRuntime>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(quiz.apply(&auth, id, Action::Next).await?))
}

/// Ends the session early; the results are the same as finishing normally.
pub async fn end_session(
    State(quiz): State<QuizRuntime>,
    Extension(auth): Extension<AuthContext>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(quiz.apply(&auth, id, Action::End).await?))
}
