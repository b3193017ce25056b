//! Best-effort viewer IP resolution for view attribution.
//!
//! Attribution wants the viewer's public address. Resolution order: the first
//! `X-Forwarded-For` hop, then the socket peer when it is a public address,
//! then a GET to a public IP-echo endpoint (only useful behind NAT in
//! development, where it observes the gateway's address). Every step is
//! best-effort: total failure yields an empty string and never blocks gating.

use axum::http::HeaderMap;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

/// Echo endpoint returning the caller's IP as a bare text body.
pub const DEFAULT_IP_ECHO_URL: &str = "https://api.ipify.org";

/// Check if an IPv4 address is internal/private and useless for attribution.
fn is_internal_ipv4(ip: &Ipv4Addr) -> bool {
    ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_broadcast()
        || ip.is_unspecified()
        // Shared address space (100.64.0.0/10, CGNAT)
        || (ip.octets()[0] == 100 && (ip.octets()[1] & 0xC0) == 64)
}

/// Check if an IPv6 address is internal/private.
fn is_internal_ipv6(ip: &Ipv6Addr) -> bool {
    ip.is_loopback()
        || ip.is_unspecified()
        || ip.to_ipv4_mapped().map(|v4| is_internal_ipv4(&v4)).unwrap_or(false)
        // Unique local (fc00::/7)
        || (ip.segments()[0] & 0xFE00) == 0xFC00
        // Link-local (fe80::/10)
        || (ip.segments()[0] & 0xFFC0) == 0xFE80
}

pub fn is_internal_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => is_internal_ipv4(v4),
        IpAddr::V6(v6) => is_internal_ipv6(v6),
    }
}

/// First hop of `X-Forwarded-For`, if it parses as an address.
pub fn forwarded_ip(headers: &HeaderMap) -> Option<String> {
    let value = headers.get("x-forwarded-for")?.to_str().ok()?;
    let first = value.split(',').next()?.trim();
    let ip: IpAddr = first.parse().ok()?;
    Some(ip.to_string())
}

/// Socket peer address, only when public.
pub fn peer_public_ip(peer: SocketAddr) -> Option<String> {
    let ip = peer.ip();
    if is_internal_ip(&ip) {
        None
    } else {
        Some(ip.to_string())
    }
}

/// Ask the echo service for our public address. Silent on failure.
pub async fn echo_public_ip(client: &reqwest::Client, echo_url: &str) -> Option<String> {
    let response = match client.get(echo_url).send().await {
        Ok(r) => r,
        Err(err) => {
            tracing::debug!(%err, "ip echo request failed");
            return None;
        }
    };
    let body = response.text().await.ok()?;
    let ip: IpAddr = body.trim().parse().ok()?;
    Some(ip.to_string())
}

/// Resolve the address a view event should be attributed to. Empty string
/// when every source fails.
pub async fn viewer_ip(
    headers: &HeaderMap,
    peer: SocketAddr,
    client: &reqwest::Client,
    echo_url: &str,
) -> String {
    if let Some(ip) = forwarded_ip(headers) {
        return ip;
    }
    if let Some(ip) = peer_public_ip(peer) {
        return ip;
    }
    echo_public_ip(client, echo_url).await.unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn test_internal_ipv4_ranges() {
        assert!(is_internal_ipv4(&Ipv4Addr::new(127, 0, 0, 1)));
        assert!(is_internal_ipv4(&Ipv4Addr::new(10, 0, 0, 1)));
        assert!(is_internal_ipv4(&Ipv4Addr::new(192, 168, 1, 1)));
        assert!(is_internal_ipv4(&Ipv4Addr::new(172, 16, 0, 1)));
        assert!(is_internal_ipv4(&Ipv4Addr::new(169, 254, 1, 1)));
        assert!(is_internal_ipv4(&Ipv4Addr::new(100, 64, 0, 1)));
        assert!(!is_internal_ipv4(&Ipv4Addr::new(8, 8, 8, 8)));
        assert!(!is_internal_ipv4(&Ipv4Addr::new(203, 0, 113, 9)));
    }

    #[test]
    fn test_internal_ipv6_ranges() {
        assert!(is_internal_ipv6(&Ipv6Addr::LOCALHOST));
        assert!(is_internal_ipv6(&Ipv6Addr::UNSPECIFIED));
        assert!(is_internal_ipv6(&"fe80::1".parse().unwrap()));
        assert!(is_internal_ipv6(&"fd00::1".parse().unwrap()));
        assert!(!is_internal_ipv6(&"2001:4860:4860::8888".parse().unwrap()));
    }

    #[test]
    fn test_forwarded_ip_first_hop() {
        let mut headers = HeaderMap::new();
        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("203.0.113.9, 10.0.0.1"),
        );
        assert_eq!(forwarded_ip(&headers), Some("203.0.113.9".to_string()));
    }

    #[test]
    fn test_forwarded_ip_rejects_garbage() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("not-an-ip"));
        assert_eq!(forwarded_ip(&headers), None);
        assert_eq!(forwarded_ip(&HeaderMap::new()), None);
    }

    #[test]
    fn test_peer_public_ip() {
        let public: SocketAddr = "203.0.113.9:443".parse().unwrap();
        let private: SocketAddr = "192.168.1.5:443".parse().unwrap();
        assert_eq!(peer_public_ip(public), Some("203.0.113.9".to_string()));
        assert_eq!(peer_public_ip(private), None);
    }

    #[tokio::test]
    async fn test_echo_failure_is_silent() {
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_millis(200))
            .build()
            .unwrap();
        // Unroutable documentation address; the lookup must fail quietly.
        let ip = echo_public_ip(&client, "http://192.0.2.1/").await;
        assert_eq!(ip, None);
    }

    #[tokio::test]
    async fn test_viewer_ip_prefers_forwarded_header() {
        let client = reqwest::Client::new();
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("203.0.113.9"));
        let peer: SocketAddr = "127.0.0.1:50000".parse().unwrap();
        let ip = viewer_ip(&headers, peer, &client, "http://192.0.2.1/").await;
        assert_eq!(ip, "203.0.113.9");
    }

    #[tokio::test]
    async fn test_viewer_ip_uses_public_peer() {
        let client = reqwest::Client::new();
        let peer: SocketAddr = "198.51.100.7:50000".parse().unwrap();
        let ip = viewer_ip(&HeaderMap::new(), peer, &client, "http://192.0.2.1/").await;
        assert_eq!(ip, "198.51.100.7");
    }
}
