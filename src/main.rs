//! deckgate - a startup directory with gated pitch decks and demos.
//!
//! This is the main entry point for the web server. The application is
//! organized into the following modules:
//!
//! - `models`: startups, content items, and view events
//! - `store`: sled persistence for listings
//! - `history`: append-only view attribution log
//! - `gate`: the publish/identity/password gate state machine
//! - `embed`: third-party embed URL resolution
//! - `auth`: owner session management
//! - `handlers`: HTTP route handlers
//! - `templates`: HTML rendering

use axum::{
    routing::{get, post},
    Router,
};
use std::net::SocketAddr;
use std::sync::Arc;

use deckgate::{auth, bind_addr, handlers, AppState, DB_PATH};

// ============================================================================
// Main
// ============================================================================

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("deckgate=info")),
        )
        .init();

    let state = Arc::new(AppState::new());

    let app = Router::new()
        // Public directory
        .route("/", get(handlers::index))
        .route("/s/{id}", get(handlers::startup_page))
        // Gate panels
        .route("/s/{id}/{kind}", get(handlers::panel))
        .route("/s/{id}/{kind}/identity", post(handlers::identity_submit))
        .route("/s/{id}/{kind}/password", post(handlers::password_submit))
        // Owner auth
        .route("/login", get(handlers::login_page).post(handlers::login_submit))
        .route("/logout", get(handlers::logout))
        // Owner dashboard
        .route("/dashboard", get(handlers::dashboard))
        .route("/new", get(handlers::new_startup_page).post(handlers::create_startup))
        .route("/dashboard/{id}", get(handlers::edit_startup))
        .route("/dashboard/{id}/views/{kind}", get(handlers::views_page))
        .route("/api/startup/{id}/content/{kind}", post(handlers::update_content))
        .route("/api/startup/{id}/delete", post(handlers::delete_startup))
        .with_state(state);

    let addr = bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind");

    tracing::info!(%addr, db = DB_PATH, "deckgate server running");
    if auth::is_auth_enabled() {
        tracing::info!("owner auth: enabled");
    } else {
        tracing::info!("owner auth: disabled (set DECKGATE_PASSWORD to manage listings)");
    }

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .expect("Server error");
}
