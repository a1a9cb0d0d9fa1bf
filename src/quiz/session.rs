// src/quiz/session.rs

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use rand::{Rng, seq::SliceRandom};
use serde::Serialize;

use crate::{
    config::{POINTS_PER_CORRECT, QUIZ_ASSIST_BUDGET, QUIZ_TIME_LIMIT_SECS},
    quiz::scoring::{Achievement, round2},
};

/// A question as it sits in the pool, before any shuffling.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PoolQuestion {
    pub id: i64,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

/// A question as presented in one session.
/// Options are in session order and `correct_index` points into that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionQuestion {
    pub id: i64,
    pub prompt: String,
    pub options: Vec<String>,
    pub correct_index: usize,
}

impl SessionQuestion {
    /// Shuffles the options of `question`, carrying the correct answer along.
    /// Returns `None` for malformed questions (fewer than two options, or a
    /// correct index outside the option list).
    fn shuffled<R: Rng + ?Sized>(question: &PoolQuestion, rng: &mut R) -> Option<Self> {
        if question.options.len() < 2 || question.correct_index >= question.options.len() {
            return None;
        }

        let mut order: Vec<usize> = (0..question.options.len()).collect();
        order.shuffle(rng);

        let correct_index = order.iter().position(|&i| i == question.correct_index)?;
        let options = order.iter().map(|&i| question.options[i].clone()).collect();

        Some(Self {
            id: question.id,
            prompt: question.prompt.clone(),
            options,
            correct_index,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// No questions yet (empty or unreachable pool).
    Loading,
    /// Current question open for selection.
    Answering,
    /// Current question locked in, waiting for `advance`.
    Submitted,
    /// Terminal.
    Results,
}

/// Totals computed once, when a session reaches `Results`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AttemptSummary {
    pub total_questions: i64,
    pub correct_answers: i64,
    pub total_points: i64,
    pub average_time_per_question: f64,
    pub achievement: Achievement,
}

impl AttemptSummary {
    fn compute(
        total_questions: usize,
        points: i64,
        started_at: DateTime<Utc>,
        ended_at: DateTime<Utc>,
    ) -> Self {
        let answered = points / POINTS_PER_CORRECT;
        let elapsed_secs = (ended_at - started_at).num_milliseconds().max(0) as f64 / 1000.0;

        let average_time_per_question = if answered > 0 {
            round2(elapsed_secs / answered as f64)
        } else {
            0.0
        };

        Self {
            total_questions: total_questions as i64,
            correct_answers: answered,
            total_points: points,
            average_time_per_question,
            achievement: Achievement::from_points(points),
        }
    }
}

/// State of one quiz playthrough.
///
/// Every transition is a method; methods that cannot apply in the current
/// state leave it untouched and return `false`.
#[derive(Debug, Clone)]
pub struct QuizSession {
    questions: Vec<SessionQuestion>,
    current: usize,
    phase: Phase,
    selected: Option<usize>,
    points: i64,
    correct: HashSet<i64>,
    assists_remaining: u32,
    assist_used: bool,
    highlighted: Vec<usize>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
    remaining_secs: u32,
    summary: Option<AttemptSummary>,
}

impl Default for QuizSession {
    fn default() -> Self {
        Self::new()
    }
}

impl QuizSession {
    /// A session with no questions, in `Loading`.
    pub fn new() -> Self {
        Self {
            questions: Vec::new(),
            current: 0,
            phase: Phase::Loading,
            selected: None,
            points: 0,
            correct: HashSet::new(),
            assists_remaining: QUIZ_ASSIST_BUDGET,
            assist_used: false,
            highlighted: Vec::new(),
            started_at: None,
            ended_at: None,
            remaining_secs: QUIZ_TIME_LIMIT_SECS,
            summary: None,
        }
    }

    /// Builds a session from `pool` in one step. See [`QuizSession::load`].
    pub fn start<R: Rng + ?Sized>(pool: &[PoolQuestion], rng: &mut R, now: DateTime<Utc>) -> Self {
        let mut session = Self::new();
        session.load(pool, rng, now);
        session
    }

    /// Fills a `Loading` session from the pool: question order and each
    /// question's option order are permuted independently.
    ///
    /// Malformed questions are skipped. If nothing usable remains the
    /// session stays in `Loading`.
    pub fn load<R: Rng + ?Sized>(
        &mut self,
        pool: &[PoolQuestion],
        rng: &mut R,
        now: DateTime<Utc>,
    ) -> bool {
        if self.phase != Phase::Loading {
            return false;
        }

        let mut questions: Vec<SessionQuestion> = pool
            .iter()
            .filter_map(|q| {
                let shuffled = SessionQuestion::shuffled(q, rng);
                if shuffled.is_none() {
                    tracing::warn!("Skipping malformed question {}", q.id);
                }
                shuffled
            })
            .collect();

        if questions.is_empty() {
            return false;
        }

        questions.shuffle(rng);

        self.questions = questions;
        self.current = 0;
        self.phase = Phase::Answering;
        self.started_at = Some(now);
        true
    }

    /// Records the chosen option for the current question.
    pub fn select_option(&mut self, index: usize) -> bool {
        if self.phase != Phase::Answering {
            return false;
        }
        match self.current_question() {
            Some(q) if index < q.options.len() => {
                self.selected = Some(index);
                true
            }
            _ => false,
        }
    }

    /// Locks in the selection and scores it.
    pub fn submit(&mut self) -> bool {
        if self.phase != Phase::Answering {
            return false;
        }
        let Some(selected) = self.selected else {
            return false;
        };
        let Some(question) = self.questions.get(self.current) else {
            return false;
        };

        if selected == question.correct_index {
            self.points += POINTS_PER_CORRECT;
            self.correct.insert(question.id);
        }
        self.phase = Phase::Submitted;
        true
    }

    /// Highlights the correct option and one random incorrect option.
    /// The pair is reported in ascending index order, so its layout does not
    /// tell which one is correct.
    pub fn request_assist<R: Rng + ?Sized>(&mut self, rng: &mut R) -> bool {
        if self.phase != Phase::Answering || self.assist_used || self.assists_remaining == 0 {
            return false;
        }
        let Some(question) = self.questions.get(self.current) else {
            return false;
        };

        let correct = question.correct_index;
        let wrong: Vec<usize> = (0..question.options.len()).filter(|&i| i != correct).collect();
        let Some(&decoy) = wrong.choose(rng) else {
            return false;
        };

        let mut pair = vec![correct, decoy];
        pair.sort_unstable();

        self.highlighted = pair;
        self.assist_used = true;
        self.assists_remaining -= 1;
        true
    }

    /// Moves on from a submitted question, or finishes when none is left.
    /// An unsubmitted question cannot be skipped.
    pub fn advance(&mut self, now: DateTime<Utc>) -> bool {
        if self.phase != Phase::Submitted {
            return false;
        }

        self.selected = None;
        self.highlighted.clear();
        self.assist_used = false;

        if self.current + 1 < self.questions.len() {
            self.current += 1;
            self.phase = Phase::Answering;
        } else {
            self.finish(now);
        }
        true
    }

    /// Explicit early termination.
    pub fn end_early(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_in_progress() {
            return false;
        }
        self.finish(now);
        true
    }

    /// One elapsed second. Returns `true` only on the tick that expires the
    /// session.
    pub fn countdown_tick(&mut self, now: DateTime<Utc>) -> bool {
        if !self.is_in_progress() {
            return false;
        }

        self.remaining_secs = self.remaining_secs.saturating_sub(1);
        if self.remaining_secs == 0 {
            self.finish(now);
            return true;
        }
        false
    }

    fn finish(&mut self, now: DateTime<Utc>) {
        let started_at = self.started_at.unwrap_or(now);

        self.phase = Phase::Results;
        self.ended_at = Some(now);
        self.summary = Some(AttemptSummary::compute(
            self.questions.len(),
            self.points,
            started_at,
            now,
        ));
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self.phase, Phase::Answering | Phase::Submitted)
    }

    pub fn is_finished(&self) -> bool {
        self.phase == Phase::Results
    }

    pub fn current_question(&self) -> Option<&SessionQuestion> {
        if self.is_in_progress() {
            self.questions.get(self.current)
        } else {
            None
        }
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    pub fn questions(&self) -> &[SessionQuestion] {
        &self.questions
    }

    pub fn selected(&self) -> Option<usize> {
        self.selected
    }

    pub fn points(&self) -> i64 {
        self.points
    }

    pub fn correct_count(&self) -> usize {
        self.correct.len()
    }

    pub fn is_correct(&self, question_id: i64) -> bool {
        self.correct.contains(&question_id)
    }

    pub fn assists_remaining(&self) -> u32 {
        self.assists_remaining
    }

    pub fn highlighted(&self) -> &[usize] {
        &self.highlighted
    }

    pub fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    pub fn summary(&self) -> Option<&AttemptSummary> {
        self.summary.as_ref()
    }
}
