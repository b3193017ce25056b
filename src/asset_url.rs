//! Validation of owner-supplied asset links.
//!
//! The saved URL becomes an iframe `src` (or a native video source) on the
//! public panel, so a link must parse, use HTTPS, and carry a host before it
//! is accepted. Resolution to an embeddable form stays permissive (see
//! `embed`); this check only guards what owners can store.

use url::Url;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AssetUrlError {
    /// URL is malformed or cannot be parsed
    InvalidUrl(String),
    /// URL uses a non-HTTPS scheme
    NotHttps,
    /// URL has no host component
    NoHost,
}

impl std::fmt::Display for AssetUrlError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AssetUrlError::InvalidUrl(msg) => write!(f, "Invalid URL: {}", msg),
            AssetUrlError::NotHttps => write!(f, "Only HTTPS links are allowed"),
            AssetUrlError::NoHost => write!(f, "URL has no host"),
        }
    }
}

impl std::error::Error for AssetUrlError {}

/// Validate a link before it is stored on a content item.
pub fn validate_asset_url(url_str: &str) -> Result<Url, AssetUrlError> {
    let url = Url::parse(url_str).map_err(|e| AssetUrlError::InvalidUrl(e.to_string()))?;

    if url.scheme() != "https" {
        return Err(AssetUrlError::NotHttps);
    }
    if url.host_str().is_none() {
        return Err(AssetUrlError::NoHost);
    }

    Ok(url)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_https_links() {
        assert!(validate_asset_url("https://drive.google.com/file/d/XYZ/view").is_ok());
        assert!(validate_asset_url("https://youtu.be/abc123").is_ok());
    }

    #[test]
    fn test_rejects_http() {
        assert_eq!(
            validate_asset_url("http://example.com/deck.pdf"),
            Err(AssetUrlError::NotHttps)
        );
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert_eq!(
            validate_asset_url("javascript:alert(1)"),
            Err(AssetUrlError::NotHttps)
        );
        assert_eq!(
            validate_asset_url("file:///etc/passwd"),
            Err(AssetUrlError::NotHttps)
        );
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(matches!(
            validate_asset_url("not a url"),
            Err(AssetUrlError::InvalidUrl(_))
        ));
        assert!(matches!(
            validate_asset_url(""),
            Err(AssetUrlError::InvalidUrl(_))
        ));
    }
}
