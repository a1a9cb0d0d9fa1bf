// src/quiz/runtime.rs

use std::{collections::HashMap, sync::Arc, time::Duration};

use chrono::{DateTime, Utc};
use rand::{SeedableRng, rngs::StdRng};
use serde::Serialize;
use tokio::{sync::Mutex, task::JoinHandle, time::Instant};
use uuid::Uuid;

use crate::{
    config::{QUIZ_SESSION_TTL_SECS, QUIZ_SWEEP_INTERVAL_SECS},
    error::AppError,
    models::attempt::NewAttempt,
    quiz::{
        session::{AttemptSummary, Phase, PoolQuestion, QuizSession},
        store::QuizStore,
    },
    utils::jwt::AuthContext,
};

/// Outcome of persisting a finished attempt, shown next to the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SaveStatus {
    Pending,
    Saved,
    Failed,
}

/// Player commands on a live session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Select(usize),
    Submit,
    Assist,
    Next,
    End,
}

struct LiveSession {
    owner: AuthContext,
    session: QuizSession,
    save_status: Option<SaveStatus>,
    ticker: Option<JoinHandle<()>>,
    touched_at: Instant,
}

impl LiveSession {
    /// Finished and loading sessions have no countdown to end them, so they
    /// expire once left idle.
    fn is_stale(&self, now: Instant, ttl: Duration) -> bool {
        !self.session.is_in_progress() && now.duration_since(self.touched_at) >= ttl
    }

    fn stop_ticker(&mut self) {
        if let Some(handle) = self.ticker.take() {
            handle.abort();
        }
    }
}

impl Drop for LiveSession {
    fn drop(&mut self) {
        self.stop_ticker();
    }
}

type SessionMap = HashMap<Uuid, LiveSession>;

/// Live quiz sessions, each exclusively owned by one login.
///
/// A login or account holds at most one session; starting another replaces
/// it without saving. In-progress sessions run a one-second countdown task.
/// The task is aborted when the session finishes, when its owner logs out,
/// and when the entry is dropped. Finished attempts are persisted in the
/// background; the save outcome never changes the results. Finished and
/// loading sessions are evicted after `QUIZ_SESSION_TTL_SECS` of inactivity.
#[derive(Clone)]
pub struct QuizRuntime {
    sessions: Arc<Mutex<SessionMap>>,
    store: Arc<dyn QuizStore>,
}

impl QuizRuntime {
    pub fn new(store: Arc<dyn QuizStore>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(HashMap::new())),
            store,
        }
    }

    /// An unreachable pool is treated like an empty one: the session waits
    /// in `Loading`.
    async fn fetch_pool(&self) -> Vec<PoolQuestion> {
        match self.store.question_pool().await {
            Ok(pool) => pool,
            Err(e) => {
                tracing::warn!("Question pool unavailable, session stays loading: {}", e);
                Vec::new()
            }
        }
    }

    /// Starts a new session for `owner`. Any other session of the same login
    /// or account is dropped unsaved, stopping its countdown.
    pub async fn start(&self, owner: AuthContext) -> SessionView {
        let pool = self.fetch_pool().await;
        let session = QuizSession::start(&pool, &mut StdRng::from_entropy(), Utc::now());
        let id = Uuid::new_v4();

        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, live| {
            live.owner.login_id != owner.login_id && live.owner.user_id != owner.user_id
        });
        let replaced = before - sessions.len();
        if replaced > 0 {
            tracing::info!(
                "Dropped {} earlier quiz session(s) of user {}",
                replaced,
                owner.user_id
            );
        }
        evict_stale(&mut sessions, Instant::now());

        let mut live = LiveSession {
            owner,
            session,
            save_status: None,
            ticker: None,
            touched_at: Instant::now(),
        };
        if live.session.is_in_progress() {
            live.ticker = Some(self.spawn_ticker(id));
        }

        tracing::info!(
            "Quiz session {} started for user {} with {} questions",
            id,
            live.owner.user_id,
            live.session.question_count()
        );

        let view = SessionView::new(id, &live.session, live.save_status);
        sessions.insert(id, live);
        view
    }

    /// Current view of a session. A session still in `Loading` retries the
    /// question pool first.
    pub async fn view(&self, owner: &AuthContext, id: Uuid) -> Result<SessionView, AppError> {
        let loading = {
            let sessions = self.sessions.lock().await;
            owned(&sessions, owner, id)?.session.phase() == Phase::Loading
        };

        if loading {
            let pool = self.fetch_pool().await;
            let mut sessions = self.sessions.lock().await;
            let live = owned_mut(&mut sessions, owner, id)?;
            if live.session.load(&pool, &mut StdRng::from_entropy(), Utc::now()) {
                live.ticker = Some(self.spawn_ticker(id));
            }
        }

        let mut sessions = self.sessions.lock().await;
        let live = owned_mut(&mut sessions, owner, id)?;
        live.touched_at = Instant::now();
        Ok(SessionView::new(id, &live.session, live.save_status))
    }

    /// Applies a player command. Commands that do not fit the current state
    /// are ignored and the unchanged view is returned.
    pub async fn apply(
        &self,
        owner: &AuthContext,
        id: Uuid,
        action: Action,
    ) -> Result<SessionView, AppError> {
        let mut sessions = self.sessions.lock().await;
        let live = owned_mut(&mut sessions, owner, id)?;
        let now = Utc::now();
        live.touched_at = Instant::now();

        let was_finished = live.session.is_finished();
        let changed = match action {
            Action::Select(index) => live.session.select_option(index),
            Action::Submit => live.session.submit(),
            Action::Assist => live.session.request_assist(&mut StdRng::from_entropy()),
            Action::Next => live.session.advance(now),
            Action::End => live.session.end_early(now),
        };

        if !changed {
            tracing::debug!("Ignored {:?} on quiz session {}", action, id);
        }

        if !was_finished && live.session.is_finished() {
            self.on_finished(id, live);
        }

        Ok(SessionView::new(id, &live.session, live.save_status))
    }

    /// Drops every session opened under `login_id`, stopping their timers.
    pub async fn teardown_login(&self, login_id: &str) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, live| live.owner.login_id != login_id);
        before - sessions.len()
    }

    /// Drops every session of an account (used when the account is deleted).
    pub async fn teardown_user(&self, user_id: i64) -> usize {
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, live| live.owner.user_id != user_id);
        before - sessions.len()
    }

    /// Number of sessions still being played.
    pub async fn live_count(&self) -> usize {
        let sessions = self.sessions.lock().await;
        sessions.values().filter(|live| live.session.is_in_progress()).count()
    }

    /// Number of registered sessions in any phase.
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }

    /// Removes finished and loading sessions idle for longer than the TTL.
    pub async fn sweep(&self) -> usize {
        let mut sessions = self.sessions.lock().await;
        evict_stale(&mut sessions, Instant::now())
    }

    /// Runs `sweep` periodically for the lifetime of the server.
    pub fn spawn_sweeper(&self) -> JoinHandle<()> {
        let runtime = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(QUIZ_SWEEP_INTERVAL_SECS));
            loop {
                interval.tick().await;
                runtime.sweep().await;
            }
        })
    }

    fn spawn_ticker(&self, id: Uuid) -> JoinHandle<()> {
        let runtime = self.clone();
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(Duration::from_secs(1));
            // The first tick completes immediately.
            interval.tick().await;

            loop {
                interval.tick().await;

                let mut sessions = runtime.sessions.lock().await;
                let Some(live) = sessions.get_mut(&id) else {
                    break;
                };
                if live.session.countdown_tick(Utc::now()) {
                    tracing::info!("Quiz session {} ran out of time", id);
                    runtime.on_finished(id, live);
                    break;
                }
                if !live.session.is_in_progress() {
                    break;
                }
            }
        })
    }

    /// Terminal transition bookkeeping: stop the timer and persist the
    /// attempt in the background.
    fn on_finished(&self, id: Uuid, live: &mut LiveSession) {
        live.stop_ticker();
        live.touched_at = Instant::now();

        let Some(summary) = live.session.summary() else {
            return;
        };
        live.save_status = Some(SaveStatus::Pending);

        let attempt = NewAttempt::from_summary(live.owner.user_id, &live.owner.username, summary);
        let runtime = self.clone();

        tokio::spawn(async move {
            let status = match runtime.store.record_attempt(&attempt).await {
                Ok(attempt_id) => {
                    tracing::info!("Saved attempt {} from quiz session {}", attempt_id, id);
                    SaveStatus::Saved
                }
                Err(e) => {
                    tracing::error!("Failed to save attempt from quiz session {}: {}", id, e);
                    SaveStatus::Failed
                }
            };

            if let Some(live) = runtime.sessions.lock().await.get_mut(&id) {
                live.save_status = Some(status);
            }
        });
    }
}

fn evict_stale(sessions: &mut SessionMap, now: Instant) -> usize {
    let ttl = Duration::from_secs(QUIZ_SESSION_TTL_SECS);
    let before = sessions.len();
    sessions.retain(|_, live| !live.is_stale(now, ttl));
    let evicted = before - sessions.len();
    if evicted > 0 {
        tracing::debug!("Evicted {} idle quiz session(s)", evicted);
    }
    evicted
}

fn owned<'a>(
    sessions: &'a SessionMap,
    owner: &AuthContext,
    id: Uuid,
) -> Result<&'a LiveSession, AppError> {
    sessions
        .get(&id)
        .filter(|live| live.owner.user_id == owner.user_id)
        .ok_or(AppError::NotFound("Quiz session not found".to_string()))
}

fn owned_mut<'a>(
    sessions: &'a mut SessionMap,
    owner: &AuthContext,
    id: Uuid,
) -> Result<&'a mut LiveSession, AppError> {
    sessions
        .get_mut(&id)
        .filter(|live| live.owner.user_id == owner.user_id)
        .ok_or(AppError::NotFound("Quiz session not found".to_string()))
}

/// The current question without its answer.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: i64,
    pub prompt: String,
    pub options: Vec<String>,
}

/// What the player sees of a session.
#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub id: Uuid,
    pub phase: Phase,
    pub question_index: usize,
    pub total_questions: usize,
    pub question: Option<QuestionView>,
    pub selected: Option<usize>,
    pub submitted: bool,
    /// Revealed only once the current question is submitted.
    pub correct_index: Option<usize>,
    pub points: i64,
    pub correct_count: usize,
    pub assists_remaining: u32,
    pub highlighted: Vec<usize>,
    pub remaining_seconds: u32,
    pub started_at: Option<DateTime<Utc>>,
    pub ended_at: Option<DateTime<Utc>>,
    pub summary: Option<AttemptSummary>,
    pub save_status: Option<SaveStatus>,
}

impl SessionView {
    pub fn new(id: Uuid, session: &QuizSession, save_status: Option<SaveStatus>) -> Self {
        let current = session.current_question();
        let correct_index = match (session.phase(), current) {
            (Phase::Submitted, Some(q)) => Some(q.correct_index),
            _ => None,
        };

        Self {
            id,
            phase: session.phase(),
            question_index: session.current_index(),
            total_questions: session.question_count(),
            question: current.map(|q| QuestionView {
                id: q.id,
                prompt: q.prompt.clone(),
                options: q.options.clone(),
            }),
            selected: session.selected(),
            submitted: session.phase() == Phase::Submitted,
            correct_index,
            points: session.points(),
            correct_count: session.correct_count(),
            assists_remaining: session.assists_remaining(),
            highlighted: session.highlighted().to_vec(),
            remaining_seconds: session.remaining_secs(),
            started_at: session.started_at(),
            ended_at: session.ended_at(),
            summary: session.summary().cloned(),
            save_status,
        }
    }
}
