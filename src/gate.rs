//! Gate controller for protected content panels.
//!
//! Each (content item, viewer IP) pair moves through up to three gates before
//! the asset renders: the owner's publish flag, an identity capture step, and
//! an optional password lock. Passing a gate writes a grant timestamp into the
//! `GrantCache`; grants expire after 24 hours and are simply overwritten on
//! the next pass, never deleted. `Unlocked` is not durable: every panel open
//! re-derives the state from the item's flags and the cache.

use crate::history::ViewSink;
use crate::models::{ContentItem, ViewEvent, ViewerRole};
use chrono::{DateTime, Utc};
use subtle::ConstantTimeEq;

/// A grant is valid for 24 hours from the moment it was written.
pub const GRANT_TTL_MS: i64 = 24 * 60 * 60 * 1000;

// ============================================================================
// Grant Cache
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrantPurpose {
    /// Identity captured for this content.
    Access,
    /// Password accepted for this content.
    Password,
}

impl GrantPurpose {
    fn as_str(&self) -> &'static str {
        match self {
            GrantPurpose::Access => "access",
            GrantPurpose::Password => "password",
        }
    }
}

/// Key format: `{purpose}_{content_id}_{ip}`. The IP may be empty when the
/// viewer could not be attributed, in which case unattributable viewers share
/// a grant.
pub fn grant_key(purpose: GrantPurpose, content_id: &str, ip: &str) -> String {
    format!("{}_{}_{}", purpose.as_str(), content_id, ip)
}

/// Store of recent grant timestamps (epoch milliseconds).
pub trait GrantCache {
    fn get(&self, key: &str) -> Option<i64>;
    fn set(&self, key: &str, timestamp_ms: i64);
}

/// Grants persisted in a sled tree, values as stringified epoch millis.
pub struct SledGrantCache {
    tree: sled::Tree,
}

impl SledGrantCache {
    pub fn open(db: &sled::Db) -> Self {
        Self {
            tree: db.open_tree("grants").expect("open grants tree"),
        }
    }
}

impl GrantCache for SledGrantCache {
    fn get(&self, key: &str) -> Option<i64> {
        let value = self.tree.get(key.as_bytes()).ok().flatten()?;
        std::str::from_utf8(&value).ok()?.parse().ok()
    }

    fn set(&self, key: &str, timestamp_ms: i64) {
        self.tree
            .insert(key.as_bytes(), timestamp_ms.to_string().as_bytes())
            .ok();
    }
}

/// In-memory cache for tests and ephemeral deployments.
#[derive(Default)]
pub struct MemoryGrantCache {
    grants: std::sync::Mutex<std::collections::HashMap<String, i64>>,
}

impl GrantCache for MemoryGrantCache {
    fn get(&self, key: &str) -> Option<i64> {
        self.grants.lock().unwrap().get(key).copied()
    }

    fn set(&self, key: &str, timestamp_ms: i64) {
        self.grants.lock().unwrap().insert(key.to_string(), timestamp_ms);
    }
}

fn has_fresh_grant(
    cache: &dyn GrantCache,
    purpose: GrantPurpose,
    content_id: &str,
    ip: &str,
    now: DateTime<Utc>,
) -> bool {
    match cache.get(&grant_key(purpose, content_id, ip)) {
        Some(granted_ms) => now.timestamp_millis() - granted_ms < GRANT_TTL_MS,
        None => false,
    }
}

// ============================================================================
// Gate State Machine
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateState {
    /// Owner has not published the asset; terminal.
    Unpublished,
    /// No fresh identity grant for this content + IP.
    NeedsIdentity,
    /// Identity granted, but the password lock is active and unpassed.
    NeedsPassword,
    /// Content renders.
    Unlocked,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateError {
    Unpublished,
    MissingEmail,
    UnknownRole(String),
    IdentityRequired,
    MissingPassword,
    WrongPassword,
}

impl std::fmt::Display for GateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GateError::Unpublished => write!(f, "This content is not available"),
            GateError::MissingEmail => write!(f, "Please enter your email address"),
            GateError::UnknownRole(role) => write!(f, "Unknown role: {}", role),
            GateError::IdentityRequired => {
                write!(f, "Please introduce yourself before entering a password")
            }
            GateError::MissingPassword => write!(f, "Please enter the password"),
            GateError::WrongPassword => write!(f, "Incorrect password"),
        }
    }
}

impl std::error::Error for GateError {}

/// Derive the panel state for the current viewer. Called on every panel open;
/// nothing here writes.
pub fn evaluate(
    item: &ContentItem,
    content_id: &str,
    ip: &str,
    cache: &dyn GrantCache,
    now: DateTime<Utc>,
) -> GateState {
    if !item.is_published {
        return GateState::Unpublished;
    }
    if !has_fresh_grant(cache, GrantPurpose::Access, content_id, ip, now) {
        return GateState::NeedsIdentity;
    }
    if item.is_locked && !has_fresh_grant(cache, GrantPurpose::Password, content_id, ip, now) {
        return GateState::NeedsPassword;
    }
    GateState::Unlocked
}

/// Result of a successful identity submission. `view_recorded` is false when
/// the attribution append failed; the caller surfaces a notice but the viewer
/// still advances.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityOutcome {
    pub state: GateState,
    pub view_recorded: bool,
}

/// Identity gate: validate (email, role), record the view, write the access
/// grant. Availability of content takes priority over completeness of
/// analytics, so a failed append does not fail the submission.
pub fn submit_identity(
    item: &ContentItem,
    content_id: &str,
    ip: &str,
    email: &str,
    role: &str,
    cache: &dyn GrantCache,
    sink: &dyn ViewSink,
    now: DateTime<Utc>,
) -> Result<IdentityOutcome, GateError> {
    if !item.is_published {
        return Err(GateError::Unpublished);
    }
    let email = email.trim();
    if email.is_empty() {
        return Err(GateError::MissingEmail);
    }
    let viewer_title = ViewerRole::parse(role).ok_or_else(|| GateError::UnknownRole(role.to_string()))?;

    let event = ViewEvent {
        email_address: email.to_string(),
        viewer_title,
        ip_address: ip.to_string(),
        timestamp: now,
    };
    let view_recorded = match sink.append_view(content_id, &event) {
        Ok(()) => true,
        Err(err) => {
            tracing::warn!(content_id, %err, "failed to record view event");
            false
        }
    };

    cache.set(
        &grant_key(GrantPurpose::Access, content_id, ip),
        now.timestamp_millis(),
    );

    Ok(IdentityOutcome {
        state: evaluate(item, content_id, ip, cache, now),
        view_recorded,
    })
}

/// Password gate: exact, case-sensitive match against the stored password.
/// Unlimited retries; there is no attempt counter or lockout on this gate.
pub fn submit_password(
    item: &ContentItem,
    content_id: &str,
    ip: &str,
    candidate: &str,
    cache: &dyn GrantCache,
    now: DateTime<Utc>,
) -> Result<GateState, GateError> {
    if !item.is_published {
        return Err(GateError::Unpublished);
    }
    // Step ordering: the password gate only exists behind the identity gate.
    if !has_fresh_grant(cache, GrantPurpose::Access, content_id, ip, now) {
        return Err(GateError::IdentityRequired);
    }
    if !item.is_locked {
        return Ok(GateState::Unlocked);
    }
    if candidate.is_empty() {
        return Err(GateError::MissingPassword);
    }

    let stored = item.password_str().as_bytes();
    let candidate = candidate.as_bytes();
    let matches = stored.len() == candidate.len() && stored.ct_eq(candidate).unwrap_u8() == 1;
    if !matches {
        return Err(GateError::WrongPassword);
    }

    cache.set(
        &grant_key(GrantPurpose::Password, content_id, ip),
        now.timestamp_millis(),
    );
    Ok(GateState::Unlocked)
}
