//! Owner authentication and session management.
//!
//! Handles founder/owner sessions with HMAC-signed cookies. Authentication is
//! optional and enabled by setting the DECKGATE_PASSWORD environment variable;
//! without it the dashboard is read-only disabled.

use axum_extra::extract::CookieJar;
use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::Utc;
use hmac::{Hmac, Mac};
use rand::Rng;
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use std::env;
use subtle::ConstantTimeEq;

type HmacSha256 = Hmac<Sha256>;

/// Session cookie name
pub const SESSION_COOKIE: &str = "deckgate_session";

/// Session time-to-live in hours
pub const SESSION_TTL_HOURS: i64 = 24;

// ============================================================================
// Session Structure
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
struct Session {
    created: i64,
    expires: i64,
    nonce: String,
}

// ============================================================================
// Authentication Functions
// ============================================================================

/// Get the secret key from environment (DECKGATE_PASSWORD)
pub fn get_secret_key() -> Option<Vec<u8>> {
    env::var("DECKGATE_PASSWORD").ok().map(|p| p.into_bytes())
}

/// Check if owner authentication is enabled
pub fn is_auth_enabled() -> bool {
    get_secret_key().is_some()
}

/// Create a new session token
pub fn create_session() -> Option<String> {
    let secret = get_secret_key()?;
    let now = Utc::now().timestamp();
    let expires = now + (SESSION_TTL_HOURS * 3600);
    let nonce: String = rand::thread_rng()
        .sample_iter(&rand::distributions::Alphanumeric)
        .take(16)
        .map(char::from)
        .collect();

    let session = Session {
        created: now,
        expires,
        nonce,
    };
    let session_json = serde_json::to_string(&session).ok()?;

    let mut mac = HmacSha256::new_from_slice(&secret).ok()?;
    mac.update(session_json.as_bytes());
    let signature = hex_encode(mac.finalize().into_bytes().as_slice());

    Some(format!("{}.{}", base64_encode(&session_json), signature))
}

/// Verify a session token's signature and expiry
pub fn verify_session(token: &str, secret: &[u8]) -> bool {
    let parts: Vec<&str> = token.split('.').collect();
    if parts.len() != 2 {
        return false;
    }

    let session_json = match base64_decode(parts[0]) {
        Some(s) => s,
        None => return false,
    };

    let mut mac = match HmacSha256::new_from_slice(secret) {
        Ok(m) => m,
        Err(_) => return false,
    };
    mac.update(session_json.as_bytes());
    let expected_sig = hex_encode(mac.finalize().into_bytes().as_slice());

    // Constant-time comparison to prevent timing attacks
    let sig_bytes = parts[1].as_bytes();
    let expected_bytes = expected_sig.as_bytes();
    if sig_bytes.len() != expected_bytes.len() {
        return false;
    }
    if sig_bytes.ct_eq(expected_bytes).unwrap_u8() != 1 {
        return false;
    }

    let session: Session = match serde_json::from_str(&session_json) {
        Ok(s) => s,
        Err(_) => return false,
    };

    Utc::now().timestamp() < session.expires
}

/// Check if the owner is logged in via cookie
pub fn is_logged_in(jar: &CookieJar) -> bool {
    let secret = match get_secret_key() {
        Some(s) => s,
        None => return false,
    };

    match jar.get(SESSION_COOKIE) {
        Some(cookie) => verify_session(cookie.value(), &secret),
        None => false,
    }
}

// ============================================================================
// Encoding Helpers
// ============================================================================

pub fn base64_encode(s: &str) -> String {
    STANDARD.encode(s.as_bytes())
}

pub fn base64_decode(s: &str) -> Option<String> {
    let bytes = STANDARD.decode(s).ok()?;
    String::from_utf8(bytes).ok()
}

pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verify_session_round_trip() {
        std::env::set_var("DECKGATE_PASSWORD", "testing-secret");
        let token = create_session().unwrap();
        assert!(verify_session(&token, b"testing-secret"));
        assert!(!verify_session(&token, b"other-secret"));
    }

    #[test]
    fn test_verify_session_rejects_malformed_tokens() {
        assert!(!verify_session("", b"secret"));
        assert!(!verify_session("only-one-part", b"secret"));
        assert!(!verify_session("a.b.c", b"secret"));
        assert!(!verify_session("!!notbase64!!.deadbeef", b"secret"));
    }

    #[test]
    fn test_verify_session_rejects_tampered_payload() {
        std::env::set_var("DECKGATE_PASSWORD", "testing-secret");
        let token = create_session().unwrap();
        let (_, sig) = token.split_once('.').unwrap();
        let forged_payload =
            base64_encode(r#"{"created":0,"expires":99999999999,"nonce":"x"}"#);
        let forged = format!("{}.{}", forged_payload, sig);
        assert!(!verify_session(&forged, b"testing-secret"));
    }

    #[test]
    fn test_base64_round_trip() {
        let s = "hello deckgate";
        assert_eq!(base64_decode(&base64_encode(s)).unwrap(), s);
    }

    #[test]
    fn test_hex_encode() {
        assert_eq!(hex_encode(&[0x00, 0xff, 0x1a]), "00ff1a");
    }
}
