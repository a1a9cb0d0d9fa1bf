// src/quiz/scoring.rs

use std::{collections::HashMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Serialize, Serializer};

use crate::{
    config::DEFAULT_ICON,
    models::{account::PublicAccount, attempt::Attempt},
};

/// Rounds to two decimal places.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Achievement tier, a step function of total points.
/// Variants are ordered from lowest to highest tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Achievement {
    Beginner,
    OnTheWay,
    TicketPro,
    MasterResolver,
}

impl Achievement {
    pub const ALL: [Achievement; 4] = [
        Achievement::Beginner,
        Achievement::OnTheWay,
        Achievement::TicketPro,
        Achievement::MasterResolver,
    ];

    pub fn from_points(points: i64) -> Self {
        if points >= 270 {
            Achievement::MasterResolver
        } else if points >= 200 {
            Achievement::TicketPro
        } else if points >= 100 {
            Achievement::OnTheWay
        } else {
            Achievement::Beginner
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Achievement::Beginner => "Beginner",
            Achievement::OnTheWay => "On the Way",
            Achievement::TicketPro => "Ticket Pro",
            Achievement::MasterResolver => "Master Resolver",
        }
    }
}

impl fmt::Display for Achievement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for Achievement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.label())
    }
}

/// How a user's attempts collapse into one leaderboard row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AggregationRule {
    /// Points and average time both come from the best-scoring attempt.
    #[default]
    BestAttempt,
    /// Max points and max average time, taken independently
    /// (they may come from different attempts).
    IndependentMax,
}

impl FromStr for AggregationRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "best_attempt" => Ok(AggregationRule::BestAttempt),
            "independent_max" => Ok(AggregationRule::IndependentMax),
            other => Err(format!("unknown leaderboard rule '{}'", other)),
        }
    }
}

/// One ranked row of the leaderboard. Derived on every request, never stored.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeaderboardEntry {
    pub rank: usize,
    pub user_id: i64,
    pub username: String,
    pub icon: String,
    pub overall_points: i64,
    pub average_speed: f64,
    pub achievement: Achievement,
}

struct Best {
    user_id: i64,
    points: i64,
    average: f64,
    achieved_at: DateTime<Utc>,
}

/// Builds the global ranking from all attempts.
///
/// Entries are sorted by points descending. Equal points go to whoever
/// reached that score first, then to the lower user id.
pub fn build_leaderboard(
    attempts: &[Attempt],
    accounts: &[PublicAccount],
    rule: AggregationRule,
) -> Vec<LeaderboardEntry> {
    let mut index: HashMap<i64, usize> = HashMap::new();
    let mut groups: Vec<Best> = Vec::new();

    for attempt in attempts {
        let Some(&slot) = index.get(&attempt.user_id) else {
            index.insert(attempt.user_id, groups.len());
            groups.push(Best {
                user_id: attempt.user_id,
                points: attempt.total_points,
                average: attempt.average_time_per_question,
                achieved_at: attempt.answered_at,
            });
            continue;
        };

        let best = &mut groups[slot];
        let improves = attempt.total_points > best.points
            || (attempt.total_points == best.points && attempt.answered_at < best.achieved_at);

        match rule {
            AggregationRule::BestAttempt => {
                if improves {
                    best.points = attempt.total_points;
                    best.average = attempt.average_time_per_question;
                    best.achieved_at = attempt.answered_at;
                }
            }
            AggregationRule::IndependentMax => {
                if improves {
                    best.points = attempt.total_points;
                    best.achieved_at = attempt.answered_at;
                }
                best.average = best.average.max(attempt.average_time_per_question);
            }
        }
    }

    groups.sort_by(|a, b| {
        b.points
            .cmp(&a.points)
            .then(a.achieved_at.cmp(&b.achieved_at))
            .then(a.user_id.cmp(&b.user_id))
    });

    let names: HashMap<i64, &PublicAccount> = accounts.iter().map(|a| (a.id, a)).collect();

    groups
        .into_iter()
        .enumerate()
        .map(|(i, best)| {
            let (username, icon) = match names.get(&best.user_id) {
                Some(account) => (account.username.clone(), account.icon.clone()),
                None => ("Unknown".to_string(), DEFAULT_ICON.to_string()),
            };
            LeaderboardEntry {
                rank: i + 1,
                user_id: best.user_id,
                username,
                icon,
                overall_points: best.points,
                average_speed: round2(best.average),
                achievement: Achievement::from_points(best.points),
            }
        })
        .collect()
}

/// Per-user statistics shown on the history page.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistorySummary {
    pub attempts: usize,
    pub total_solved: i64,
    pub average_time: f64,
    pub latest_achievement: Achievement,
    pub active_rate: f64,
}

const ACTIVE_RATE_START: f64 = 100.0;
const ACTIVE_RATE_FLOOR: f64 = 75.0;
const ACTIVE_RATE_DECAY_PER_DAY: f64 = 0.01;

/// Activity heuristic: 100, minus 0.01 per full day since `last_seen`,
/// never below 75.
pub fn active_rate(last_seen: DateTime<Utc>, now: DateTime<Utc>) -> f64 {
    let days = (now - last_seen).num_days().max(0) as f64;
    round2((ACTIVE_RATE_START - days * ACTIVE_RATE_DECAY_PER_DAY).max(ACTIVE_RATE_FLOOR))
}

/// Summarizes one user's attempts.
pub fn build_history_summary(attempts: &[Attempt], now: DateTime<Utc>) -> HistorySummary {
    if attempts.is_empty() {
        return HistorySummary {
            attempts: 0,
            total_solved: 0,
            average_time: 0.0,
            latest_achievement: Achievement::Beginner,
            active_rate: ACTIVE_RATE_START,
        };
    }

    let total_solved = attempts.iter().map(|a| a.correct_answers).max().unwrap_or(0);
    let max_points = attempts.iter().map(|a| a.total_points).max().unwrap_or(0);
    let mean = attempts
        .iter()
        .map(|a| a.average_time_per_question)
        .sum::<f64>()
        / attempts.len() as f64;

    let rate = attempts
        .iter()
        .map(|a| a.answered_at)
        .max()
        .map(|last| active_rate(last, now))
        .unwrap_or(ACTIVE_RATE_START);

    HistorySummary {
        attempts: attempts.len(),
        total_solved,
        average_time: round2(mean),
        latest_achievement: Achievement::from_points(max_points),
        active_rate: rate,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 5, 10, 12, 0, 0).unwrap()
    }

    fn attempt(user_id: i64, points: i64, average: f64, minutes: i64) -> Attempt {
        Attempt {
            id: 0,
            user_id,
            username: format!("user{}", user_id),
            total_questions: 30,
            correct_answers: points / 10,
            total_points: points,
            average_time_per_question: average,
            achievement: Achievement::from_points(points).label().to_string(),
            answered_at: t0() + Duration::minutes(minutes),
        }
    }

    fn account(id: i64, name: &str) -> PublicAccount {
        PublicAccount {
            id,
            username: name.to_string(),
            icon: format!("/uploads/{}.png", name),
        }
    }

    #[test]
    fn test_achievement_thresholds() {
        assert_eq!(Achievement::from_points(0), Achievement::Beginner);
        assert_eq!(Achievement::from_points(90), Achievement::Beginner);
        assert_eq!(Achievement::from_points(100), Achievement::OnTheWay);
        assert_eq!(Achievement::from_points(190), Achievement::OnTheWay);
        assert_eq!(Achievement::from_points(200), Achievement::TicketPro);
        assert_eq!(Achievement::from_points(260), Achievement::TicketPro);
        assert_eq!(Achievement::from_points(270), Achievement::MasterResolver);
        assert_eq!(Achievement::from_points(300), Achievement::MasterResolver);
    }

    #[test]
    fn test_achievement_is_monotonic() {
        let mut previous = Achievement::from_points(0);
        for points in (0..=300).step_by(10) {
            let tier = Achievement::from_points(points);
            assert!(tier >= previous);
            assert!(Achievement::ALL.contains(&tier));
            previous = tier;
        }
    }

    #[test]
    fn test_achievement_serializes_as_label() {
        let json = serde_json::to_string(&Achievement::TicketPro).unwrap();
        assert_eq!(json, "\"Ticket Pro\"");
    }

    #[test]
    fn test_rule_parsing() {
        assert_eq!(
            "independent_max".parse::<AggregationRule>(),
            Ok(AggregationRule::IndependentMax)
        );
        assert_eq!(
            " Best_Attempt ".parse::<AggregationRule>(),
            Ok(AggregationRule::BestAttempt)
        );
        assert!("whatever".parse::<AggregationRule>().is_err());
    }

    #[test]
    fn test_leaderboard_orders_by_points() {
        let attempts = vec![
            attempt(1, 100, 5.0, 0),
            attempt(2, 250, 4.0, 1),
            attempt(3, 180, 3.0, 2),
            attempt(1, 120, 6.0, 3),
        ];
        let accounts = vec![account(1, "ana"), account(2, "ben"), account(3, "cy")];

        let board = build_leaderboard(&attempts, &accounts, AggregationRule::BestAttempt);

        let ids: Vec<i64> = board.iter().map(|e| e.user_id).collect();
        let ranks: Vec<usize> = board.iter().map(|e| e.rank).collect();
        assert_eq!(ids, vec![2, 3, 1]);
        assert_eq!(ranks, vec![1, 2, 3]);
        assert_eq!(board[2].overall_points, 120);
        assert_eq!(board[2].average_speed, 6.0);
        assert_eq!(board[0].username, "ben");
        assert_eq!(board[0].achievement, Achievement::TicketPro);
    }

    #[test]
    fn test_leaderboard_tie_goes_to_earliest_achiever() {
        let attempts = vec![attempt(7, 200, 8.0, 0), attempt(3, 200, 9.0, 5)];
        let accounts = vec![account(7, "a"), account(3, "b")];

        let board = build_leaderboard(&attempts, &accounts, AggregationRule::BestAttempt);
        assert_eq!(board[0].user_id, 7);
        assert_eq!(board[0].rank, 1);
        assert_eq!(board[1].user_id, 3);
        assert_eq!(board[1].rank, 2);
    }

    #[test]
    fn test_leaderboard_tie_on_same_instant_uses_user_id() {
        let attempts = vec![attempt(9, 150, 8.0, 0), attempt(4, 150, 9.0, 0)];
        let board = build_leaderboard(&attempts, &[], AggregationRule::BestAttempt);
        assert_eq!(board[0].user_id, 4);
        assert_eq!(board[1].user_id, 9);
    }

    #[test]
    fn test_best_attempt_rule_keeps_fields_together() {
        let attempts = vec![attempt(1, 200, 3.5, 0), attempt(1, 90, 12.0, 1)];
        let board = build_leaderboard(&attempts, &[], AggregationRule::BestAttempt);
        assert_eq!(board.len(), 1);
        assert_eq!(board[0].overall_points, 200);
        assert_eq!(board[0].average_speed, 3.5);
    }

    #[test]
    fn test_independent_max_rule() {
        let attempts = vec![attempt(1, 200, 3.5, 0), attempt(1, 90, 12.0, 1)];
        let board = build_leaderboard(&attempts, &[], AggregationRule::IndependentMax);
        assert_eq!(board[0].overall_points, 200);
        assert_eq!(board[0].average_speed, 12.0);
    }

    #[test]
    fn test_unknown_account_gets_placeholder() {
        let attempts = vec![attempt(42, 60, 2.0, 0)];
        let board = build_leaderboard(&attempts, &[account(1, "ana")], AggregationRule::BestAttempt);
        assert_eq!(board[0].username, "Unknown");
        assert_eq!(board[0].icon, DEFAULT_ICON);
    }

    #[test]
    fn test_empty_leaderboard() {
        assert!(build_leaderboard(&[], &[], AggregationRule::BestAttempt).is_empty());
    }

    #[test]
    fn test_history_summary() {
        let attempts = vec![
            attempt(1, 120, 5.0, 0),
            attempt(1, 210, 6.25, 10),
            attempt(1, 80, 4.0, 20),
        ];
        let now = t0() + Duration::days(3) + Duration::minutes(30);

        let summary = build_history_summary(&attempts, now);
        assert_eq!(summary.attempts, 3);
        assert_eq!(summary.total_solved, 21);
        assert_eq!(summary.average_time, 5.08);
        assert_eq!(summary.latest_achievement, Achievement::TicketPro);
        assert_eq!(summary.active_rate, 99.97);
    }

    #[test]
    fn test_history_summary_empty() {
        let summary = build_history_summary(&[], t0());
        assert_eq!(summary.total_solved, 0);
        assert_eq!(summary.average_time, 0.0);
        assert_eq!(summary.latest_achievement, Achievement::Beginner);
        assert_eq!(summary.active_rate, 100.0);
    }

    #[test]
    fn test_active_rate_counts_full_days_only() {
        assert_eq!(active_rate(t0(), t0() + Duration::hours(23)), 100.0);
        assert_eq!(active_rate(t0(), t0() + Duration::hours(49)), 99.98);
    }

    #[test]
    fn test_active_rate_floor() {
        assert_eq!(active_rate(t0(), t0() + Duration::days(2_500)), 75.0);
        assert_eq!(active_rate(t0(), t0() + Duration::days(100_000)), 75.0);
        for days in (0..5_000).step_by(97) {
            assert!(active_rate(t0(), t0() + Duration::days(days)) >= 75.0);
        }
    }

    #[test]
    fn test_active_rate_ignores_future_timestamps() {
        assert_eq!(active_rate(t0() + Duration::days(2), t0()), 100.0);
    }
}
