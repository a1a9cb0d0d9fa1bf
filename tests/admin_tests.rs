// tests/admin_tests.rs

mod common;

use common::{PASSWORD, spawn_app};
use serde_json::{Value, json};

#[tokio::test]
async fn admin_routes_reject_players() {
    let app = spawn_app().await;
    let token = app.player("uma").await;

    for path in ["/api/admin/accounts", "/api/admin/questions", "/api/admin/stats"] {
        assert_eq!(app.get(path, &token).await.status().as_u16(), 403, "{}", path);
    }

    let anonymous = app
        .client
        .get(app.url("/api/admin/accounts"))
        .send()
        .await
        .unwrap();
    assert_eq!(anonymous.status().as_u16(), 401);
}

#[tokio::test]
async fn admin_account_management() {
    let app = spawn_app().await;
    let admin = app.admin("root").await;

    // Create with a role.
    let response = app
        .post(
            "/api/admin/accounts",
            &admin,
            json!({
                "fname": "Vera",
                "lname": "Mod",
                "username": "vera",
                "email": "vera@example.com",
                "password": PASSWORD,
                "role": "admin",
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let vera: Value = response.json().await.unwrap();
    assert_eq!(vera["role"], "admin");
    let vera_id = vera["id"].as_i64().unwrap();

    // Unknown roles are refused.
    let response = app
        .post(
            "/api/admin/accounts",
            &admin,
            json!({
                "fname": "X",
                "lname": "Y",
                "username": "xavier",
                "email": "xavier@example.com",
                "password": PASSWORD,
                "role": "superuser",
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);

    // Search matches names, username and email.
    let found: Vec<Value> = app
        .get("/api/admin/accounts?search=vera@", &admin)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["username"], "vera");

    // Demote; the new role applies to her existing token immediately.
    let vera_token = app.token_for("vera").await;
    assert_eq!(app.get("/api/admin/stats", &vera_token).await.status().as_u16(), 200);
    let response = app
        .put(
            &format!("/api/admin/accounts/{}", vera_id),
            &admin,
            json!({ "role": "user", "lname": "Player" }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["lname"], "Player");
    assert_eq!(app.get("/api/admin/stats", &vera_token).await.status().as_u16(), 403);

    // Cannot delete yourself.
    let me: Value = app.get("/api/accounts/me", &admin).await.json().await.unwrap();
    let response = app
        .delete(&format!("/api/admin/accounts/{}", me["id"]), &admin)
        .await;
    assert_eq!(response.status().as_u16(), 400);

    // Deleting an account revokes its access and removes its attempts.
    app.record(&vera_token, 100, 5.0).await;
    let response = app
        .delete(&format!("/api/admin/accounts/{}", vera_id), &admin)
        .await;
    assert_eq!(response.status().as_u16(), 204);
    assert_eq!(app.get("/api/accounts/me", &vera_token).await.status().as_u16(), 401);

    let board: Value = app
        .client
        .get(app.url("/api/leaderboard"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(board["total_items"], 0);

    let response = app
        .delete(&format!("/api/admin/accounts/{}", vera_id), &admin)
        .await;
    assert_eq!(response.status().as_u16(), 404);
}

#[tokio::test]
async fn admin_question_crud() {
    let app = spawn_app().await;
    let admin = app.admin("root").await;

    let response = app
        .post(
            "/api/admin/questions",
            &admin,
            json!({
                "prompt": "User cannot log in after a password reset",
                "options": ["Unlock the account", "Reimage", "Replace keyboard", "Ignore"],
                "correct_index": 0,
            }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 201);
    let question: Value = response.json().await.unwrap();
    let path = format!("/api/admin/questions/{}", question["id"]);
    assert_eq!(question["options"][0], "Unlock the account");

    // Too few options.
    let response = app
        .post(
            "/api/admin/questions",
            &admin,
            json!({ "prompt": "p", "options": ["a", "b", "c"], "correct_index": 0 }),
        )
        .await;
    assert_eq!(response.status().as_u16(), 400);

    // Index checked against the stored options.
    let response = app.put(&path, &admin, json!({ "correct_index": 4 })).await;
    assert_eq!(response.status().as_u16(), 400);

    let response = app
        .put(&path, &admin, json!({ "correct_index": 3, "prompt": "Edited" }))
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let updated: Value = response.json().await.unwrap();
    assert_eq!(updated["correct_index"], 3);
    assert_eq!(updated["prompt"], "Edited");

    let list: Vec<Value> = app
        .get("/api/admin/questions", &admin)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(list.len(), 1);

    assert_eq!(app.delete(&path, &admin).await.status().as_u16(), 204);
    assert_eq!(app.delete(&path, &admin).await.status().as_u16(), 404);
}

#[tokio::test]
async fn admin_moderates_posts_and_reads_tickets() {
    let app = spawn_app().await;
    let admin = app.admin("root").await;
    let player = app.player("walt").await;

    let post: Value = app
        .post("/api/posts", &player, json!({ "content": "Printer fixed" }))
        .await
        .json()
        .await
        .unwrap();
    app.post("/api/posts", &player, json!({ "content": "VPN is down again" }))
        .await;

    // Search by content.
    let found: Vec<Value> = app
        .get("/api/admin/posts?q=printer", &admin)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["username"], "walt");

    let path = format!("/api/admin/posts/{}", post["id"]);
    let response = app
        .put(&path, &admin, json!({ "content": "Printer fixed (edited)" }))
        .await;
    assert_eq!(response.status().as_u16(), 200);
    let edited: Value = response.json().await.unwrap();
    assert_eq!(edited["content"], "Printer fixed (edited)");

    // Admins may delete anyone's post through the public route too.
    let public_path = format!("/api/posts/{}", post["id"]);
    assert_eq!(app.delete(&public_path, &admin).await.status().as_u16(), 204);

    // Admin announcement.
    let response = app
        .post("/api/admin/posts", &admin, json!({ "content": "Maintenance tonight" }))
        .await;
    assert_eq!(response.status().as_u16(), 201);

    // Search by author username.
    let found: Vec<Value> = app
        .get("/api/admin/posts?q=roo", &admin)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(found.len(), 1);
    assert_eq!(found[0]["content"], "Maintenance tonight");
    assert_eq!(found[0]["username"], "root");

    app.post(
        "/api/contact",
        &player,
        json!({ "description": "Please reset my score", "email": "walt@work.example" }),
    )
    .await;
    let tickets: Vec<Value> = app
        .get("/api/admin/tickets", &admin)
        .await
        .json()
        .await
        .unwrap();
    assert_eq!(tickets.len(), 1);
    assert_eq!(tickets[0]["email"], "walt@work.example");

    let stats: Value = app.get("/api/admin/stats", &admin).await.json().await.unwrap();
    assert_eq!(stats["accounts"], 2);
    assert_eq!(stats["posts"], 2);
    assert_eq!(stats["contact_tickets"], 1);
    assert_eq!(stats["live_sessions"], 0);
}
