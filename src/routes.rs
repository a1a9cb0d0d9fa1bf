// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{delete, get, post, put},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{account, admin, auth, community, contact, quiz, results},
    state::AppState,
    utils::jwt::{admin_middleware, auth_middleware},
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (auth, accounts, quiz, results, leaderboard,
///   posts, contact, admin).
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (pool, config, live quiz sessions).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        HeaderValue::from_static("http://localhost:3000"),
        HeaderValue::from_static("http://127.0.0.1:3000"),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let require_auth = middleware::from_fn_with_state(state.clone(), auth_middleware);

    let auth_routes = Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .merge(
            Router::new()
                .route("/logout", post(auth::logout))
                .layer(require_auth.clone()),
        );

    let account_routes = Router::new()
        .route("/{id}", get(account::get_account))
        .merge(
            Router::new()
                .route("/me", get(account::get_me).put(account::update_me))
                .layer(require_auth.clone()),
        );

    let quiz_routes = Router::new()
        .route("/sessions", post(quiz::start_session))
        .route("/sessions/{id}", get(quiz::get_session))
        .route("/sessions/{id}/select", post(quiz::select_option))
        .route("/sessions/{id}/submit", post(quiz::submit_answer))
        .route("/sessions/{id}/assist", post(quiz::request_assist))
        .route("/sessions/{id}/next", post(quiz::next_question))
        .route("/sessions/{id}/end", post(quiz::end_session))
        .layer(require_auth.clone());

    let result_routes = Router::new()
        .route(
            "/",
            get(results::list_my_results).post(results::record_result),
        )
        .route("/summary", get(results::my_summary))
        .layer(require_auth.clone());

    let post_routes = Router::new()
        .route("/", get(community::list_posts))
        .merge(
            Router::new()
                .route("/", post(community::create_post))
                .route("/{id}", delete(community::delete_post))
                .layer(require_auth.clone()),
        );

    let contact_routes = Router::new()
        .route("/", post(contact::contact_admin))
        .layer(require_auth.clone());

    let admin_routes = Router::new()
        .route(
            "/accounts",
            get(admin::list_accounts).post(admin::create_account),
        )
        .route(
            "/accounts/{id}",
            put(admin::update_account_by_admin).delete(admin::delete_account),
        )
        .route(
            "/questions",
            get(admin::list_questions).post(admin::create_question),
        )
        .route(
            "/questions/{id}",
            delete(admin::delete_question).put(admin::update_question),
        )
        .route("/posts", get(admin::list_posts).post(admin::create_post))
        .route(
            "/posts/{id}",
            delete(admin::delete_post).put(admin::update_post),
        )
        .route("/tickets", get(admin::list_tickets))
        .route("/stats", get(admin::stats))
        // Double middleware protection: Auth first, then Admin check
        .layer(middleware::from_fn(admin_middleware))
        .layer(require_auth);

    Router::new()
        .nest("/api/auth", auth_routes)
        .nest("/api/accounts", account_routes)
        .nest("/api/quiz", quiz_routes)
        .nest("/api/results", result_routes)
        .route("/api/leaderboard", get(results::get_leaderboard))
        .nest("/api/posts", post_routes)
        .nest("/api/contact", contact_routes)
        .nest("/api/admin", admin_routes)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
