use std::sync::Arc;

use axum::extract::FromRef;
use sqlx::SqlitePool;

use crate::{config::Config, quiz::runtime::QuizRuntime};

#[derive(Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub config: Config,
    pub quiz: QuizRuntime,
}

impl AppState {
    /// Wires the quiz runtime to the same database pool.
    pub fn new(pool: SqlitePool, config: Config) -> Self {
        let quiz = QuizRuntime::new(Arc::new(pool.clone()));
        Self { pool, config, quiz }
    }
}

impl FromRef<AppState> for SqlitePool {
    fn from_ref(state: &AppState) -> Self {
        state.pool.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}

impl FromRef<AppState> for QuizRuntime {
    fn from_ref(state: &AppState) -> Self {
        state.quiz.clone()
    }
}
