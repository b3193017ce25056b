//! deckgate library - re-exports for testing and external use.
//!
//! deckgate is a self-hosted startup directory with gated pitch decks and
//! demo videos. The modules:
//!
//! - `models`: startups, content items, view events
//! - `store`: sled persistence for listings
//! - `history`: append-only view attribution log
//! - `gate`: the publish/identity/password gate state machine
//! - `embed`: third-party embed URL resolution
//! - `ip`: best-effort viewer IP resolution
//! - `asset_url`: validation of owner-supplied links
//! - `auth`: owner session management
//! - `handlers`: HTTP route handlers
//! - `templates`: HTML rendering

use chrono::{DateTime, Utc};
use sled::Db;
use std::sync::{Arc, Mutex};

pub mod asset_url;
pub mod auth;
pub mod embed;
pub mod gate;
pub mod handlers;
pub mod history;
pub mod ip;
pub mod models;
pub mod store;
pub mod templates;

// ============================================================================
// Configuration
// ============================================================================

pub const DB_PATH: &str = ".deckgate_db";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";

/// Bind address, overridable via DECKGATE_BIND.
pub fn bind_addr() -> String {
    std::env::var("DECKGATE_BIND").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string())
}

/// IP echo endpoint, overridable via DECKGATE_IP_ECHO_URL.
pub fn ip_echo_url() -> String {
    std::env::var("DECKGATE_IP_ECHO_URL").unwrap_or_else(|_| ip::DEFAULT_IP_ECHO_URL.to_string())
}

// ============================================================================
// Rate Limiting
// ============================================================================

/// Tracks owner-login failures for rate limiting with exponential backoff.
/// This limits the dashboard login only; the viewer password gate has no
/// lockout.
pub struct LoginRateLimit {
    pub failures: u32,
    pub locked_until: Option<DateTime<Utc>>,
}

impl LoginRateLimit {
    pub fn new() -> Self {
        Self {
            failures: 0,
            locked_until: None,
        }
    }

    /// Check if login attempts are currently locked out.
    pub fn is_locked(&self) -> bool {
        if let Some(until) = self.locked_until {
            Utc::now() < until
        } else {
            false
        }
    }

    /// Record a failed login attempt. After 5 failures, apply exponential backoff capped at 64s.
    pub fn record_failure(&mut self) {
        self.failures += 1;
        if self.failures >= 5 {
            let delay_secs = std::cmp::min(1i64 << (self.failures - 5), 64);
            self.locked_until = Some(Utc::now() + chrono::Duration::seconds(delay_secs));
        }
    }

    /// Reset on successful login.
    pub fn reset(&mut self) {
        self.failures = 0;
        self.locked_until = None;
    }
}

impl Default for LoginRateLimit {
    fn default() -> Self {
        Self::new()
    }
}

// ============================================================================
// Application State
// ============================================================================

#[derive(Clone)]
pub struct AppState {
    pub db: Db,
    pub http: reqwest::Client,
    pub ip_echo_url: String,
    pub login_rate_limit: Arc<Mutex<LoginRateLimit>>,
}

impl AppState {
    pub fn new() -> Self {
        let db = sled::open(DB_PATH).expect("Failed to open database");
        Self::with_db(db)
    }

    /// Build state around an existing database (temporary ones in tests).
    pub fn with_db(db: Db) -> Self {
        let http = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(5))
            .build()
            .expect("build http client");

        Self {
            db,
            http,
            ip_echo_url: ip_echo_url(),
            login_rate_limit: Arc::new(Mutex::new(LoginRateLimit::new())),
        }
    }

    pub fn grant_cache(&self) -> gate::SledGrantCache {
        gate::SledGrantCache::open(&self.db)
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

// Re-export commonly used types
pub use gate::{
    evaluate, grant_key, submit_identity, submit_password, GateError, GateState, GrantCache,
    GrantPurpose, IdentityOutcome, MemoryGrantCache, SledGrantCache, GRANT_TTL_MS,
};

pub use models::{
    ContentItem, ContentKind, ContentUpdateForm, IdentityForm, NewStartupForm, PasswordForm,
    Startup, ViewEvent, ViewerRole,
};

pub use embed::{resolve_deck_embed, resolve_demo_embed};

pub use history::{append_view, list_views, view_count, SledViewSink, ViewSink};

pub use store::{delete_startup, list_startups, load_startup, new_startup, save_startup, slugify};

pub use asset_url::{validate_asset_url, AssetUrlError};

pub use auth::{
    create_session, is_auth_enabled, is_logged_in, verify_session, SESSION_COOKIE,
    SESSION_TTL_HOURS,
};

pub use templates::{base_html, html_escape};
