//! Data models for the startup directory.
//!
//! This module contains the core data structures: startup listings, the gated
//! content items attached to them (pitch deck and demo), and the view events
//! recorded when a viewer passes a gate.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

// ============================================================================
// Startup Listing
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Startup {
    pub id: String,
    pub name: String,
    pub tagline: String,
    pub website: String,
    pub founder_email: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub deck: ContentItem,
    pub demo: ContentItem,
}

impl Startup {
    pub fn content(&self, kind: ContentKind) -> &ContentItem {
        match kind {
            ContentKind::Deck => &self.deck,
            ContentKind::Demo => &self.demo,
        }
    }

    pub fn content_mut(&mut self, kind: ContentKind) -> &mut ContentItem {
        match kind {
            ContentKind::Deck => &mut self.deck,
            ContentKind::Demo => &mut self.demo,
        }
    }

    /// Identifier for one gated asset, used in grant keys and history trees.
    pub fn content_id(&self, kind: ContentKind) -> String {
        format!("{}:{}", self.id, kind)
    }
}

// ============================================================================
// Gated Content
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ContentKind {
    Deck,
    Demo,
}

impl ContentKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "deck" => Some(ContentKind::Deck),
            "demo" => Some(ContentKind::Demo),
            _ => None,
        }
    }
}

impl std::fmt::Display for ContentKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ContentKind::Deck => write!(f, "deck"),
            ContentKind::Demo => write!(f, "demo"),
        }
    }
}

/// One gated asset (pitch deck or demo video).
///
/// `password` is stored as the owner typed it: the dashboard shows the saved
/// password back to the owner, so it is not hashed. The lock may only be
/// enabled together with a non-empty password.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContentItem {
    pub asset_url: String,
    pub is_published: bool,
    pub is_locked: bool,
    pub password: Option<String>,
}

impl ContentItem {
    /// The stored password, empty string when none is set.
    pub fn password_str(&self) -> &str {
        self.password.as_deref().unwrap_or("")
    }
}

// ============================================================================
// View Attribution
// ============================================================================

/// One attribution record: who passed the identity gate for a content item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ViewEvent {
    pub email_address: String,
    pub viewer_title: ViewerRole,
    /// Best-effort; empty when the viewer could not be attributed to an IP.
    pub ip_address: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ViewerRole {
    Investor,
    Founder,
    Operator,
    Analyst,
    Journalist,
    Other,
}

impl ViewerRole {
    pub const ALL: &'static [ViewerRole] = &[
        ViewerRole::Investor,
        ViewerRole::Founder,
        ViewerRole::Operator,
        ViewerRole::Analyst,
        ViewerRole::Journalist,
        ViewerRole::Other,
    ];

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "investor" => Some(ViewerRole::Investor),
            "founder" => Some(ViewerRole::Founder),
            "operator" => Some(ViewerRole::Operator),
            "analyst" => Some(ViewerRole::Analyst),
            "journalist" => Some(ViewerRole::Journalist),
            "other" => Some(ViewerRole::Other),
            _ => None,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ViewerRole::Investor => "Investor",
            ViewerRole::Founder => "Founder",
            ViewerRole::Operator => "Operator",
            ViewerRole::Analyst => "Analyst",
            ViewerRole::Journalist => "Journalist",
            ViewerRole::Other => "Other",
        }
    }
}

impl std::fmt::Display for ViewerRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ViewerRole::Investor => write!(f, "investor"),
            ViewerRole::Founder => write!(f, "founder"),
            ViewerRole::Operator => write!(f, "operator"),
            ViewerRole::Analyst => write!(f, "analyst"),
            ViewerRole::Journalist => write!(f, "journalist"),
            ViewerRole::Other => write!(f, "other"),
        }
    }
}

// ============================================================================
// Form Payloads
// ============================================================================

#[derive(Debug, Clone, Deserialize)]
pub struct IdentityForm {
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PasswordForm {
    pub password: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewStartupForm {
    pub name: String,
    pub tagline: String,
    pub website: String,
    pub founder_email: String,
}

/// Owner-side update of one content item. Checkbox fields arrive only when
/// ticked, hence the defaults.
#[derive(Debug, Clone, Deserialize)]
pub struct ContentUpdateForm {
    pub asset_url: String,
    #[serde(default)]
    pub is_published: bool,
    #[serde(default)]
    pub is_locked: bool,
    #[serde(default)]
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_viewer_role_parse_known() {
        assert_eq!(ViewerRole::parse("investor"), Some(ViewerRole::Investor));
        assert_eq!(ViewerRole::parse("journalist"), Some(ViewerRole::Journalist));
        assert_eq!(ViewerRole::parse("other"), Some(ViewerRole::Other));
    }

    #[test]
    fn test_viewer_role_parse_rejects_unknown() {
        assert_eq!(ViewerRole::parse(""), None);
        assert_eq!(ViewerRole::parse("Investor"), None);
        assert_eq!(ViewerRole::parse("ceo"), None);
    }

    #[test]
    fn test_viewer_role_display_round_trips() {
        for role in ViewerRole::ALL {
            assert_eq!(ViewerRole::parse(&role.to_string()), Some(*role));
        }
    }

    #[test]
    fn test_content_kind_parse() {
        assert_eq!(ContentKind::parse("deck"), Some(ContentKind::Deck));
        assert_eq!(ContentKind::parse("demo"), Some(ContentKind::Demo));
        assert_eq!(ContentKind::parse("video"), None);
    }

    #[test]
    fn test_content_id_format() {
        let s = sample_startup();
        assert_eq!(s.content_id(ContentKind::Deck), "acme:deck");
        assert_eq!(s.content_id(ContentKind::Demo), "acme:demo");
    }

    #[test]
    fn test_view_event_serializes_iso8601_timestamp() {
        let event = ViewEvent {
            email_address: "a@b.com".to_string(),
            viewer_title: ViewerRole::Investor,
            ip_address: "203.0.113.9".to_string(),
            timestamp: "2026-03-01T12:00:00Z".parse().unwrap(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains("2026-03-01T12:00:00"));
        assert!(json.contains("\"investor\""));
    }

    fn sample_startup() -> Startup {
        Startup {
            id: "acme".to_string(),
            name: "Acme".to_string(),
            tagline: "Anvils as a service".to_string(),
            website: "https://acme.example".to_string(),
            founder_email: "founder@acme.example".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deck: ContentItem::default(),
            demo: ContentItem::default(),
        }
    }
}
