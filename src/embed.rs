//! Embed URL resolution for third-party document and video hosts.
//!
//! A raw link pasted by an owner is rewritten into the host's embeddable
//! (iframe-friendly) form. Resolution walks an ordered rule table and the
//! first rule whose host fragment appears in the URL wins; ordering matters
//! because a host name can show up inside another URL's path. Identifiers are
//! extracted by splitting on fixed path markers.
//!
//! Fallbacks: an unrecognized document URL is returned unchanged (assumed
//! already embeddable); an unrecognized video URL resolves to `None` and the
//! caller renders a native `<video>` element instead. A matched rule whose
//! marker is missing from the URL falls back the same way rather than
//! interpolating an empty identifier; no later rule is consulted.

type Resolver = fn(&str) -> Option<String>;

struct EmbedRule {
    host: &'static str,
    resolve: Resolver,
}

/// Identifier between `marker` and the next path/query delimiter.
fn segment_after<'a>(url: &'a str, marker: &str) -> Option<&'a str> {
    let (_, rest) = url.split_once(marker)?;
    let end = rest.find(['/', '?', '#', '&']).unwrap_or(rest.len());
    let segment = &rest[..end];
    if segment.is_empty() {
        None
    } else {
        Some(segment)
    }
}

/// Last non-empty path segment, query and fragment stripped.
fn last_segment(url: &str) -> Option<&str> {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    path.trim_end_matches('/').rsplit('/').next().filter(|s| !s.is_empty())
}

// ============================================================================
// Document Platforms
// ============================================================================

fn doc_drive(url: &str) -> Option<String> {
    let id = segment_after(url, "/file/d/")?;
    Some(format!("https://drive.google.com/file/d/{}/preview", id))
}

fn doc_dropbox(url: &str) -> Option<String> {
    // Direct-render flag instead of the download interstitial.
    if url.contains("dl=0") {
        Some(url.replace("dl=0", "raw=1"))
    } else if url.contains('?') {
        Some(format!("{}&raw=1", url))
    } else {
        Some(format!("{}?raw=1", url))
    }
}

fn doc_scribd(url: &str) -> Option<String> {
    let id = segment_after(url, "/document/")?;
    Some(format!("https://www.scribd.com/embeds/{}/content", id))
}

fn doc_issuu(url: &str) -> Option<String> {
    let user = segment_after(url, "issuu.com/")?;
    let doc = segment_after(url, "/docs/")?;
    Some(format!("https://e.issuu.com/embed.html?d={}&u={}", doc, user))
}

fn doc_slideshare(url: &str) -> Option<String> {
    let key = last_segment(url)?;
    Some(format!(
        "https://www.slideshare.net/slideshow/embed_code/key/{}",
        key
    ))
}

fn doc_box(url: &str) -> Option<String> {
    let id = segment_after(url, "/s/")?;
    Some(format!("https://app.box.com/embed/s/{}", id))
}

fn doc_calameo(url: &str) -> Option<String> {
    let id = segment_after(url, "/books/")?;
    Some(format!("https://v.calameo.com/?bkcode={}", id))
}

fn doc_yumpu(url: &str) -> Option<String> {
    let id = segment_after(url, "/view/")?;
    Some(format!("https://www.yumpu.com/en/embed/view/{}", id))
}

fn doc_pitch(url: &str) -> Option<String> {
    let id = segment_after(url, "/v/")?;
    Some(format!("https://pitch.com/embed/{}", id))
}

/// Hosts whose share links already render inside an iframe.
fn doc_identity(url: &str) -> Option<String> {
    Some(url.to_string())
}

const DOCUMENT_RULES: &[EmbedRule] = &[
    EmbedRule { host: "drive.google.com", resolve: doc_drive },
    EmbedRule { host: "dropbox.com", resolve: doc_dropbox },
    EmbedRule { host: "scribd.com", resolve: doc_scribd },
    EmbedRule { host: "docsend.com", resolve: doc_identity },
    EmbedRule { host: "issuu.com", resolve: doc_issuu },
    EmbedRule { host: "slideshare.net", resolve: doc_slideshare },
    EmbedRule { host: "box.com", resolve: doc_box },
    EmbedRule { host: "calameo.com", resolve: doc_calameo },
    EmbedRule { host: "yumpu.com", resolve: doc_yumpu },
    EmbedRule { host: "flipsnack.com", resolve: doc_identity },
    EmbedRule { host: "papermark.io", resolve: doc_identity },
    EmbedRule { host: "pitch.com", resolve: doc_pitch },
    EmbedRule { host: "publitas.com", resolve: doc_identity },
    EmbedRule { host: "flowpaper.com", resolve: doc_identity },
];

// ============================================================================
// Video Platforms
// ============================================================================

fn video_youtu_be(url: &str) -> Option<String> {
    let id = segment_after(url, "youtu.be/")?;
    Some(format!("https://www.youtube.com/embed/{}", id))
}

fn video_youtube(url: &str) -> Option<String> {
    let id = segment_after(url, "watch?v=")
        .or_else(|| segment_after(url, "/shorts/"))
        .or_else(|| segment_after(url, "/live/"))
        .or_else(|| segment_after(url, "/embed/"))?;
    Some(format!("https://www.youtube.com/embed/{}", id))
}

fn video_vimeo(url: &str) -> Option<String> {
    let id = segment_after(url, "vimeo.com/")?;
    Some(format!("https://player.vimeo.com/video/{}", id))
}

fn video_loom(url: &str) -> Option<String> {
    let id = segment_after(url, "/share/")?;
    Some(format!("https://www.loom.com/embed/{}", id))
}

fn video_dailymotion(url: &str) -> Option<String> {
    let id = segment_after(url, "/video/")?;
    Some(format!("https://www.dailymotion.com/embed/video/{}", id))
}

fn video_wistia(url: &str) -> Option<String> {
    let id = segment_after(url, "/medias/")?;
    Some(format!("https://fast.wistia.net/embed/iframe/{}", id))
}

fn video_facebook(url: &str) -> Option<String> {
    Some(format!(
        "https://www.facebook.com/plugins/video.php?href={}",
        urlencoding::encode(url)
    ))
}

fn video_twitch(url: &str) -> Option<String> {
    if let Some(id) = segment_after(url, "/videos/") {
        return Some(format!("https://player.twitch.tv/?video={}&autoplay=false", id));
    }
    let channel = last_segment(url)?;
    Some(format!(
        "https://player.twitch.tv/?channel={}&autoplay=false",
        channel
    ))
}

fn video_tiktok(url: &str) -> Option<String> {
    let id = segment_after(url, "/video/")?;
    Some(format!("https://www.tiktok.com/embed/v2/{}", id))
}

fn video_instagram(url: &str) -> Option<String> {
    let id = segment_after(url, "/reel/").or_else(|| segment_after(url, "/p/"))?;
    Some(format!("https://www.instagram.com/p/{}/embed", id))
}

fn video_twitter(url: &str) -> Option<String> {
    Some(format!(
        "https://twitframe.com/show?url={}",
        urlencoding::encode(url)
    ))
}

/// Hosted players that embed directly.
fn video_identity(url: &str) -> Option<String> {
    Some(url.to_string())
}

const VIDEO_RULES: &[EmbedRule] = &[
    EmbedRule { host: "youtu.be", resolve: video_youtu_be },
    EmbedRule { host: "youtube.com", resolve: video_youtube },
    EmbedRule { host: "vimeo.com", resolve: video_vimeo },
    EmbedRule { host: "loom.com", resolve: video_loom },
    EmbedRule { host: "dailymotion.com", resolve: video_dailymotion },
    EmbedRule { host: "wistia.com", resolve: video_wistia },
    EmbedRule { host: "facebook.com", resolve: video_facebook },
    EmbedRule { host: "twitch.tv", resolve: video_twitch },
    EmbedRule { host: "tiktok.com", resolve: video_tiktok },
    EmbedRule { host: "instagram.com", resolve: video_instagram },
    EmbedRule { host: "twitter.com", resolve: video_twitter },
    EmbedRule { host: "x.com", resolve: video_twitter },
    EmbedRule { host: "brightcove", resolve: video_identity },
    EmbedRule { host: "jwplayer.com", resolve: video_identity },
];

// ============================================================================
// Public API
// ============================================================================

/// Resolve a pitch-deck link. Unrecognized hosts (and recognized hosts with
/// an unextractable identifier) pass through unchanged.
pub fn resolve_deck_embed(raw_url: &str) -> String {
    for rule in DOCUMENT_RULES {
        if raw_url.contains(rule.host) {
            return (rule.resolve)(raw_url).unwrap_or_else(|| raw_url.to_string());
        }
    }
    raw_url.to_string()
}

/// Resolve a demo-video link. `None` means "no iframe form known": the panel
/// falls back to a native video element pointing at the raw URL.
pub fn resolve_demo_embed(raw_url: &str) -> Option<String> {
    for rule in VIDEO_RULES {
        if raw_url.contains(rule.host) {
            return (rule.resolve)(raw_url);
        }
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    // ---- Golden cases ----

    #[test]
    fn test_youtu_be_short_link() {
        let embed = resolve_demo_embed("https://youtu.be/abc123").unwrap();
        assert!(embed.contains("youtube.com/embed/abc123"));
    }

    #[test]
    fn test_drive_file_link() {
        let embed = resolve_deck_embed("https://drive.google.com/file/d/XYZ/view");
        assert!(embed.contains("drive.google.com/file/d/XYZ/preview"));
    }

    #[test]
    fn test_unknown_document_host_unchanged() {
        let raw = "https://cdn.example.com/decks/acme.pdf";
        assert_eq!(resolve_deck_embed(raw), raw);
    }

    #[test]
    fn test_unknown_video_host_is_none() {
        assert_eq!(resolve_demo_embed("https://cdn.example.com/demo.mp4"), None);
    }

    // ---- Documents ----

    #[test]
    fn test_drive_with_query_string() {
        let embed = resolve_deck_embed("https://drive.google.com/file/d/1a2B3c/view?usp=sharing");
        assert_eq!(embed, "https://drive.google.com/file/d/1a2B3c/preview");
    }

    #[test]
    fn test_drive_without_file_marker_falls_through_unchanged() {
        // Matched host, missing marker: same fallback as an unknown host.
        let raw = "https://drive.google.com/drive/folders/abc";
        assert_eq!(resolve_deck_embed(raw), raw);
    }

    #[test]
    fn test_dropbox_rewrites_dl_flag() {
        let embed = resolve_deck_embed("https://www.dropbox.com/s/abc/deck.pdf?dl=0");
        assert_eq!(embed, "https://www.dropbox.com/s/abc/deck.pdf?raw=1");
    }

    #[test]
    fn test_dropbox_appends_raw_flag() {
        let embed = resolve_deck_embed("https://www.dropbox.com/s/abc/deck.pdf");
        assert_eq!(embed, "https://www.dropbox.com/s/abc/deck.pdf?raw=1");
    }

    #[test]
    fn test_scribd_document() {
        let embed = resolve_deck_embed("https://www.scribd.com/document/123456/acme-deck");
        assert_eq!(embed, "https://www.scribd.com/embeds/123456/content");
    }

    #[test]
    fn test_docsend_passes_through() {
        let raw = "https://docsend.com/view/abcd1234";
        assert_eq!(resolve_deck_embed(raw), raw);
    }

    #[test]
    fn test_issuu_user_and_doc() {
        let embed = resolve_deck_embed("https://issuu.com/acme/docs/deck2026");
        assert_eq!(embed, "https://e.issuu.com/embed.html?d=deck2026&u=acme");
    }

    #[test]
    fn test_slideshare_key_from_last_segment() {
        let embed = resolve_deck_embed("https://www.slideshare.net/slideshow/acme-deck/271828");
        assert_eq!(
            embed,
            "https://www.slideshare.net/slideshow/embed_code/key/271828"
        );
    }

    #[test]
    fn test_box_shared_link() {
        let embed = resolve_deck_embed("https://app.box.com/s/q1w2e3r4");
        assert_eq!(embed, "https://app.box.com/embed/s/q1w2e3r4");
    }

    #[test]
    fn test_calameo_book() {
        let embed = resolve_deck_embed("https://www.calameo.com/books/00123456abcdef");
        assert_eq!(embed, "https://v.calameo.com/?bkcode=00123456abcdef");
    }

    #[test]
    fn test_yumpu_document() {
        let embed = resolve_deck_embed("https://www.yumpu.com/en/document/view/987654/acme");
        assert_eq!(embed, "https://www.yumpu.com/en/embed/view/987654");
    }

    #[test]
    fn test_pitch_share_link() {
        let embed = resolve_deck_embed("https://pitch.com/v/acme-seed-deck-xyz123");
        assert_eq!(embed, "https://pitch.com/embed/acme-seed-deck-xyz123");
    }

    #[test]
    fn test_identity_document_hosts() {
        for raw in [
            "https://www.flipsnack.com/acme/deck.html",
            "https://www.papermark.io/view/abc",
            "https://view.publitas.com/acme/deck",
            "https://online.flowpaper.com/acme/Deck",
        ] {
            assert_eq!(resolve_deck_embed(raw), raw);
        }
    }

    // ---- Videos ----

    #[test]
    fn test_youtube_watch_link() {
        let embed = resolve_demo_embed("https://www.youtube.com/watch?v=dQw4w9WgXcQ").unwrap();
        assert_eq!(embed, "https://www.youtube.com/embed/dQw4w9WgXcQ");
    }

    #[test]
    fn test_youtube_watch_link_with_timestamp() {
        let embed = resolve_demo_embed("https://www.youtube.com/watch?v=abc123&t=42s").unwrap();
        assert_eq!(embed, "https://www.youtube.com/embed/abc123");
    }

    #[test]
    fn test_youtube_shorts_link() {
        let embed = resolve_demo_embed("https://www.youtube.com/shorts/sh0rt1d").unwrap();
        assert_eq!(embed, "https://www.youtube.com/embed/sh0rt1d");
    }

    #[test]
    fn test_youtube_channel_page_falls_back() {
        assert_eq!(resolve_demo_embed("https://www.youtube.com/@acme"), None);
    }

    #[test]
    fn test_vimeo_video() {
        let embed = resolve_demo_embed("https://vimeo.com/123456789").unwrap();
        assert_eq!(embed, "https://player.vimeo.com/video/123456789");
    }

    #[test]
    fn test_loom_share() {
        let embed = resolve_demo_embed("https://www.loom.com/share/0abc123def").unwrap();
        assert_eq!(embed, "https://www.loom.com/embed/0abc123def");
    }

    #[test]
    fn test_dailymotion_video() {
        let embed = resolve_demo_embed("https://www.dailymotion.com/video/x7tgad0").unwrap();
        assert_eq!(embed, "https://www.dailymotion.com/embed/video/x7tgad0");
    }

    #[test]
    fn test_wistia_media() {
        let embed = resolve_demo_embed("https://acme.wistia.com/medias/j38ihh83m5").unwrap();
        assert_eq!(embed, "https://fast.wistia.net/embed/iframe/j38ihh83m5");
    }

    #[test]
    fn test_facebook_video_is_url_encoded() {
        let embed =
            resolve_demo_embed("https://www.facebook.com/acme/videos/1234567890").unwrap();
        assert!(embed.starts_with("https://www.facebook.com/plugins/video.php?href="));
        assert!(embed.contains("%3A%2F%2F"));
        assert!(!embed.contains("href=https://"));
    }

    #[test]
    fn test_twitch_vod() {
        let embed = resolve_demo_embed("https://www.twitch.tv/videos/1122334455").unwrap();
        assert_eq!(
            embed,
            "https://player.twitch.tv/?video=1122334455&autoplay=false"
        );
    }

    #[test]
    fn test_twitch_channel() {
        let embed = resolve_demo_embed("https://www.twitch.tv/acmedev").unwrap();
        assert_eq!(embed, "https://player.twitch.tv/?channel=acmedev&autoplay=false");
    }

    #[test]
    fn test_tiktok_video() {
        let embed =
            resolve_demo_embed("https://www.tiktok.com/@acme/video/7012345678901234567").unwrap();
        assert_eq!(embed, "https://www.tiktok.com/embed/v2/7012345678901234567");
    }

    #[test]
    fn test_instagram_reel() {
        let embed = resolve_demo_embed("https://www.instagram.com/reel/Cabc123/").unwrap();
        assert_eq!(embed, "https://www.instagram.com/p/Cabc123/embed");
    }

    #[test]
    fn test_instagram_post() {
        let embed = resolve_demo_embed("https://www.instagram.com/p/Cxyz789/").unwrap();
        assert_eq!(embed, "https://www.instagram.com/p/Cxyz789/embed");
    }

    #[test]
    fn test_twitter_and_x_use_twitframe() {
        for raw in [
            "https://twitter.com/acme/status/12345",
            "https://x.com/acme/status/12345",
        ] {
            let embed = resolve_demo_embed(raw).unwrap();
            assert!(embed.starts_with("https://twitframe.com/show?url="));
        }
    }

    #[test]
    fn test_identity_video_hosts() {
        for raw in [
            "https://players.brightcove.net/123/default_default/index.html?videoId=456",
            "https://cdn.jwplayer.com/players/aBcDeF-gHiJkLmN.html",
        ] {
            assert_eq!(resolve_demo_embed(raw).as_deref(), Some(raw));
        }
    }

    // ---- Ordering and extraction helpers ----

    #[test]
    fn test_first_match_wins_over_path_mention() {
        // A dropbox path mentioning another host still resolves as dropbox:
        // the rule table is walked in order and dropbox comes before scribd.
        let embed = resolve_deck_embed("https://www.dropbox.com/s/a/scribd.com-memo.pdf");
        assert_eq!(embed, "https://www.dropbox.com/s/a/scribd.com-memo.pdf?raw=1");
    }

    #[test]
    fn test_segment_after_stops_at_delimiters() {
        assert_eq!(segment_after("https://a/b/ID/c", "/b/"), Some("ID"));
        assert_eq!(segment_after("https://a/b/ID?x=1", "/b/"), Some("ID"));
        assert_eq!(segment_after("https://a/b/ID#frag", "/b/"), Some("ID"));
        assert_eq!(segment_after("https://a/b/", "/b/"), None);
        assert_eq!(segment_after("https://a/c/ID", "/b/"), None);
    }

    #[test]
    fn test_last_segment_strips_query_and_slash() {
        assert_eq!(last_segment("https://t.tv/acme/"), Some("acme"));
        assert_eq!(last_segment("https://t.tv/acme?x=1"), Some("acme"));
        assert_eq!(last_segment("https://t.tv"), Some("t.tv"));
    }
}
