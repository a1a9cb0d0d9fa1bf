// tests/common/mod.rs

#![allow(dead_code)]

use chrono::Utc;
use helpdesk_trainer::{
    config::Config, quiz::scoring::AggregationRule, routes, state::AppState,
    utils::hash::hash_password,
};
use serde_json::{Value, json};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};

pub const PASSWORD: &str = "Passw0rd!";

pub struct TestApp {
    pub address: String,
    pub pool: SqlitePool,
    pub client: reqwest::Client,
}

/// Spawns the app on a random port, backed by a fresh in-memory database.
pub async fn spawn_app() -> TestApp {
    // A single connection that never expires keeps the in-memory DB alive.
    let pool = SqlitePoolOptions::new()
        .max_connections(1)
        .idle_timeout(None)
        .max_lifetime(None)
        .connect("sqlite::memory:")
        .await
        .expect("Failed to open in-memory SQLite");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to migrate database");

    let config = Config {
        database_url: "sqlite::memory:".to_string(),
        jwt_secret: "test_secret_for_integration_tests".to_string(),
        jwt_expiration: 600, // 10 minutes for tests
        rust_log: "error".to_string(),
        bind_addr: "127.0.0.1:0".to_string(),
        admin_username: None,
        admin_password: None,
        admin_email: None,
        leaderboard_rule: AggregationRule::BestAttempt,
    };

    let state = AppState::new(pool.clone(), config);
    let app = routes::create_router(state);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind random port");
    let port = listener.local_addr().unwrap().port();
    let address = format!("http://127.0.0.1:{}", port);

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestApp {
        address,
        pool,
        client: reqwest::Client::new(),
    }
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn signup(&self, username: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/signup"))
            .json(&json!({
                "fname": "Test",
                "lname": username,
                "username": username,
                "email": format!("{}@example.com", username),
                "password": PASSWORD,
            }))
            .send()
            .await
            .expect("Signup request failed")
    }

    pub async fn login(&self, username: &str, password: &str) -> reqwest::Response {
        self.client
            .post(self.url("/api/auth/login"))
            .json(&json!({ "username": username, "password": password }))
            .send()
            .await
            .expect("Login request failed")
    }

    /// Signs up and logs in, returning the bearer token.
    pub async fn player(&self, username: &str) -> String {
        assert_eq!(self.signup(username).await.status().as_u16(), 201);
        self.token_for(username).await
    }

    pub async fn token_for(&self, username: &str) -> String {
        let body: Value = self.login(username, PASSWORD).await.json().await.unwrap();
        body["token"].as_str().expect("Token not found").to_string()
    }

    /// Inserts an admin account directly and logs it in.
    pub async fn admin(&self, username: &str) -> String {
        sqlx::query(
            r#"
            INSERT INTO accounts (fname, lname, username, email, password, role, created_at)
            VALUES ('Admin', 'Admin', ?, ?, ?, 'admin', ?)
            "#,
        )
        .bind(username)
        .bind(format!("{}@example.com", username))
        .bind(hash_password(PASSWORD).unwrap())
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .unwrap();

        self.token_for(username).await
    }

    /// Seeds `count` questions whose right answer is always the stored
    /// option "Right".
    pub async fn seed_questions(&self, count: usize) {
        for i in 0..count {
            sqlx::query(
                "INSERT INTO questions (prompt, options, correct_index, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(format!("Ticket #{}: the printer is offline", i))
            .bind(json!(["Right", "Wrong A", "Wrong B", "Wrong C"]).to_string())
            .bind(0_i64)
            .bind(Utc::now())
            .execute(&self.pool)
            .await
            .unwrap();
        }
    }

    pub async fn get(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    pub async fn post(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn put(&self, path: &str, token: &str, body: Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .bearer_auth(token)
            .json(&body)
            .send()
            .await
            .unwrap()
    }

    pub async fn delete(&self, path: &str, token: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .bearer_auth(token)
            .send()
            .await
            .unwrap()
    }

    /// Records a client-side attempt worth `points` out of 30.
    pub async fn record(&self, token: &str, points: i64, average: f64) -> reqwest::Response {
        self.post(
            "/api/results",
            token,
            json!({
                "total_questions": 30,
                "correct_answers": points / 10,
                "total_points": points,
                "average_time_per_question": average,
            }),
        )
        .await
    }
}
