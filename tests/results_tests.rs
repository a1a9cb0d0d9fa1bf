// tests/results_tests.rs

mod common;

use common::spawn_app;
use serde_json::{Value, json};

#[tokio::test]
async fn record_result_recomputes_achievement() {
    let app = spawn_app().await;
    let token = app.player("quinn").await;

    let response = app
        .post(
            "/api/results",
            &token,
            json!({
                "total_questions": 30,
                "correct_answers": 27,
                "total_points": 270,
                "average_time_per_question": 3.25,
                "achievement": "Beginner",
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["achievement"], "Master Resolver");
}

#[tokio::test]
async fn record_result_rejects_inconsistent_totals() {
    let app = spawn_app().await;
    let token = app.player("rita").await;

    let cases = [
        // Not a multiple of ten.
        json!({ "total_questions": 5, "correct_answers": 1, "total_points": 15, "average_time_per_question": 1.0 }),
        // More points than questions allow.
        json!({ "total_questions": 2, "correct_answers": 3, "total_points": 30, "average_time_per_question": 1.0 }),
        // Correct count disagrees with points.
        json!({ "total_questions": 5, "correct_answers": 4, "total_points": 20, "average_time_per_question": 1.0 }),
        // Negative time.
        json!({ "total_questions": 5, "correct_answers": 2, "total_points": 20, "average_time_per_question": -1.0 }),
    ];
    for body in cases {
        let response = app.post("/api/results", &token, body.clone()).await;
        assert_eq!(response.status().as_u16(), 400, "accepted {}", body);
    }
}

#[tokio::test]
async fn history_is_paged_newest_first() {
    let app = spawn_app().await;
    let token = app.player("sam").await;

    for points in [50, 120, 80] {
        assert_eq!(app.record(&token, points, 4.0).await.status().as_u16(), 201);
    }

    let page: Value = app.get("/api/results", &token).await.json().await.unwrap();
    assert_eq!(page["total_items"], 3);
    assert_eq!(page["total_pages"], 2);
    assert_eq!(page["per_page"], 2);
    assert_eq!(page["items"][0]["total_points"], 80);
    assert_eq!(page["items"][1]["total_points"], 120);

    let page: Value = app
        .get("/api/results?page=2", &token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(page["items"][0]["total_points"], 50);

    // Out of range pages clamp to the last page.
    let page: Value = app
        .get("/api/results?page=9", &token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(page["page"], 2);
}

#[tokio::test]
async fn history_summary() {
    let app = spawn_app().await;
    let token = app.player("tina").await;

    let empty: Value = app
        .get("/api/results/summary", &token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(empty["attempts"], 0);
    assert_eq!(empty["latest_achievement"], "Beginner");
    assert_eq!(empty["active_rate"], 100.0);

    app.record(&token, 120, 4.0).await;
    app.record(&token, 210, 5.0).await;
    app.record(&token, 90, 6.5).await;

    let summary: Value = app
        .get("/api/results/summary", &token)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(summary["attempts"], 3);
    assert_eq!(summary["total_solved"], 21);
    assert_eq!(summary["average_time"], 5.17);
    assert_eq!(summary["latest_achievement"], "Ticket Pro");
    assert_eq!(summary["active_rate"], 100.0);
}

#[tokio::test]
async fn leaderboard_ranks_best_attempts() {
    let app = spawn_app().await;
    let alice = app.player("alice").await;
    let bob = app.player("bob").await;
    let cara = app.player("cara").await;

    // Alice reaches 200 first; Bob ties later; Cara leads.
    app.record(&alice, 200, 4.0).await;
    app.record(&bob, 100, 9.0).await;
    app.record(&bob, 200, 3.5).await;
    app.record(&cara, 280, 2.0).await;
    app.record(&alice, 50, 8.0).await;

    // Public route.
    let board: Value = app
        .client
        .get(app.url("/api/leaderboard"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(board["total_items"], 3);
    assert_eq!(board["per_page"], 10);

    let rows = board["items"].as_array().unwrap();
    let names: Vec<&str> = rows.iter().map(|r| r["username"].as_str().unwrap()).collect();
    assert_eq!(names, ["cara", "alice", "bob"]);
    let ranks: Vec<i64> = rows.iter().map(|r| r["rank"].as_i64().unwrap()).collect();
    assert_eq!(ranks, [1, 2, 3]);

    assert_eq!(rows[0]["achievement"], "Master Resolver");
    assert_eq!(rows[1]["overall_points"], 200);
    // Best attempt supplies the time too.
    assert_eq!(rows[1]["average_speed"], 4.0);
    assert_eq!(rows[2]["average_speed"], 3.5);
    assert_eq!(rows[2]["icon"], "/icon/defaulticon.jpg");

    let page: Value = app
        .client
        .get(app.url("/api/leaderboard?page=2&per_page=2"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(page["items"][0]["username"], "bob");
    assert_eq!(page["items"][0]["rank"], 3);
}
