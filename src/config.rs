// src/config.rs

use std::env;
use dotenvy::dotenv;

use crate::quiz::scoring::AggregationRule;

/// Points awarded per correctly answered question.
pub const POINTS_PER_CORRECT: i64 = 10;

/// Wall-clock budget of a quiz session, in seconds.
pub const QUIZ_TIME_LIMIT_SECS: u32 = 300;

/// Idle time after which a finished or still-loading session is evicted.
pub const QUIZ_SESSION_TTL_SECS: u64 = 600;

/// How often the session registry is swept for stale entries.
pub const QUIZ_SWEEP_INTERVAL_SECS: u64 = 60;

/// Assist credits granted per quiz session.
pub const QUIZ_ASSIST_BUDGET: u32 = 3;

/// Minimum number of options a question must carry.
pub const MIN_QUESTION_OPTIONS: usize = 4;

/// Icon used for accounts without one, and for unknown leaderboard users.
pub const DEFAULT_ICON: &str = "/icon/defaulticon.jpg";

pub const LEADERBOARD_PAGE_SIZE: u32 = 10;
pub const HISTORY_PAGE_SIZE: u32 = 2;
pub const MAX_PAGE_SIZE: u32 = 100;

#[derive(Debug, Clone)]
pub struct Config {
    pub database_url: String,
    pub jwt_secret: String,
    pub jwt_expiration: u64,
    pub rust_log: String,
    pub bind_addr: String,
    pub admin_username: Option<String>,
    pub admin_password: Option<String>,
    pub admin_email: Option<String>,
    pub leaderboard_rule: AggregationRule,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let database_url = env::var("DATABASE_URL")
            .unwrap_or_else(|_| "sqlite://helpdesk.db?mode=rwc".to_string());

        let jwt_secret = env::var("JWT_SECRET")
            .expect("JWT_SECRET must be set");

        let jwt_expiration = env::var("JWT_EXPIRATION")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(86_400);

        let rust_log = env::var("RUST_LOG")
            .unwrap_or_else(|_| "info".to_string());

        let bind_addr = env::var("BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string());

        let leaderboard_rule = env::var("LEADERBOARD_RULE")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();

        Self {
            database_url,
            jwt_secret,
            jwt_expiration,
            rust_log,
            bind_addr,
            admin_username: env::var("ADMIN_USERNAME").ok(),
            admin_password: env::var("ADMIN_PASSWORD").ok(),
            admin_email: env::var("ADMIN_EMAIL").ok(),
            leaderboard_rule,
        }
    }
}
