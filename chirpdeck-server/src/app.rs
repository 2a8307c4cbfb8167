use axum::{
    http::StatusCode,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::{api, state::AppState};

/// Build the HTTP router over shared state
pub fn router(state: AppState) -> Router {
    // Configure CORS
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        // Health check
        .route("/health", get(health_check))
        // Account routes
        .route(
            "/accounts",
            get(api::accounts::list_accounts)
                .post(api::accounts::create_account)
                .put(api::accounts::update_account)
                .options(preflight),
        )
        // Post routes
        .route(
            "/posts",
            get(api::posts::list_posts)
                .post(api::posts::create_post)
                .put(api::posts::update_post_status)
                .options(preflight),
        )
        // Engagement routes
        .route(
            "/likes",
            get(api::likes::list_likes)
                .post(api::likes::simulate_likes)
                .options(preflight),
        )
        // Credential routes
        .route(
            "/credentials",
            get(api::credentials::get_status).options(preflight),
        )
        .route(
            "/credentials/cookie",
            post(api::credentials::save_cookie).options(preflight),
        )
        .route(
            "/credentials/login",
            post(api::credentials::save_login).options(preflight),
        )
        .route(
            "/credentials/oauth1",
            post(api::credentials::save_oauth1).options(preflight),
        )
        // Publisher routes
        .route(
            "/publish",
            get(api::publish::check_connection)
                .post(api::publish::publish)
                .options(preflight),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}

async fn health_check() -> &'static str {
    "OK"
}

/// Empty 200 for CORS preflight requests
async fn preflight() -> StatusCode {
    StatusCode::OK
}
