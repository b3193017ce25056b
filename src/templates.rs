//! HTML templates and rendering.
//!
//! Server-rendered pages in one shell: a shared stylesheet, a nav bar, and
//! per-page content fragments built with format!. Gate panels render one of
//! four fragments depending on the viewer's state.

use crate::models::{ContentItem, ContentKind, Startup, ViewEvent, ViewerRole};

/// Escape HTML special characters for safe embedding in pages.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

pub const STYLE: &str = r#"
* { box-sizing: border-box; }
body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", sans-serif;
    max-width: 860px; margin: 0 auto; padding: 1rem 1.5rem 4rem;
    color: #222; background: #fdfdfc; line-height: 1.55;
}
nav { display: flex; gap: 1rem; align-items: center; padding: .6rem 0 1rem;
      border-bottom: 1px solid #e4e2dc; margin-bottom: 1.5rem; }
nav .brand { font-weight: 700; font-size: 1.1rem; }
nav a { color: #444; text-decoration: none; }
nav a:hover { color: #000; }
nav .spacer { flex: 1; }
h1 { font-size: 1.5rem; }
a { color: #0b63c4; }
.startup-list { list-style: none; padding: 0; }
.startup-item { display: flex; justify-content: space-between;
                padding: .55rem .3rem; border-bottom: 1px solid #eee; }
.startup-item .tagline { color: #666; }
.panel { border: 1px solid #ddd; border-radius: 8px; padding: 1.25rem;
         margin: 1rem 0; background: #fff; }
.panel iframe, .panel video { width: 100%; aspect-ratio: 16 / 10;
                              border: 0; border-radius: 4px; background: #111; }
.gate-form { max-width: 420px; }
.gate-form label { display: block; margin-top: .8rem; font-weight: 600; }
.gate-form input, .gate-form select {
    width: 100%; padding: .5rem; margin-top: .25rem;
    border: 1px solid #ccc; border-radius: 4px; font-size: 1rem;
}
.gate-form button { margin-top: 1rem; padding: .55rem 1.4rem; border: 0;
                    border-radius: 4px; background: #0b63c4; color: #fff;
                    font-size: 1rem; cursor: pointer; }
.message { padding: .6rem .9rem; border-radius: 4px; margin: .8rem 0; }
.message.error { background: #fbe9e7; color: #8e2417; }
.message.notice { background: #fff8e1; color: #6d5200; }
.message.ok { background: #e8f5e9; color: #1b5e20; }
.views-table { width: 100%; border-collapse: collapse; }
.views-table th, .views-table td { text-align: left; padding: .4rem .5rem;
                                   border-bottom: 1px solid #eee; }
.views-table th { color: #666; font-weight: 600; }
.dash-form label { display: block; margin-top: .7rem; font-weight: 600; }
.dash-form input[type=text], .dash-form input[type=url],
.dash-form input[type=email], .dash-form input[type=password] {
    width: 100%; padding: .45rem; border: 1px solid #ccc; border-radius: 4px;
}
.dash-form .check { font-weight: 400; }
.dash-form button { margin-top: .9rem; padding: .5rem 1.2rem; }
.danger { color: #8e2417; }
code { background: #f2f1ec; padding: .1rem .3rem; border-radius: 3px; }
"#;

// ============================================================================
// Page Shell
// ============================================================================

pub fn nav_bar(logged_in: bool) -> String {
    let right = if logged_in {
        r#"<a href="/dashboard">Dashboard</a> <a href="/logout">Logout</a>"#
    } else {
        r#"<a href="/login">Owner login</a>"#
    };
    format!(
        r#"<nav>
            <span class="brand"><a href="/">deckgate</a></span>
            <a href="/">Directory</a>
            <span class="spacer"></span>
            {right}
        </nav>"#
    )
}

pub fn base_html(title: &str, content: &str, logged_in: bool) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="utf-8">
    <meta name="viewport" content="width=device-width, initial-scale=1">
    <title>{title} - deckgate</title>
    <style>{style}</style>
</head>
<body>
{nav}
{content}
</body>
</html>"#,
        title = html_escape(title),
        style = STYLE,
        nav = nav_bar(logged_in),
        content = content,
    )
}

pub fn error_box(msg: &str) -> String {
    format!(r#"<div class="message error">{}</div>"#, html_escape(msg))
}

pub fn notice_box(msg: &str) -> String {
    format!(r#"<div class="message notice">{}</div>"#, html_escape(msg))
}

// ============================================================================
// Gate Panel Fragments
// ============================================================================

fn panel_heading(startup: &Startup, kind: ContentKind) -> String {
    let label = match kind {
        ContentKind::Deck => "Pitch deck",
        ContentKind::Demo => "Product demo",
    };
    format!(
        r#"<h1>{} — {}</h1><p><a href="/s/{}">&larr; back to listing</a></p>"#,
        html_escape(&startup.name),
        label,
        startup.id
    )
}

pub fn render_unpublished(startup: &Startup, kind: ContentKind, logged_in: bool) -> String {
    let content = format!(
        r#"{heading}
        <div class="panel">
            <p>This content is not available.</p>
        </div>"#,
        heading = panel_heading(startup, kind),
    );
    base_html(&startup.name, &content, logged_in)
}

/// Identity capture form: email + role from the fixed vocabulary.
pub fn render_identity_form(
    startup: &Startup,
    kind: ContentKind,
    error: Option<&str>,
    logged_in: bool,
) -> String {
    let error_html = error.map(error_box).unwrap_or_default();
    let mut options = String::new();
    for role in ViewerRole::ALL {
        options.push_str(&format!(
            r#"<option value="{}">{}</option>"#,
            role,
            role.label()
        ));
    }

    let content = format!(
        r#"{heading}
        <div class="panel">
            {error_html}
            <p>Leave your details to view this {kind}.</p>
            <form method="POST" action="/s/{id}/{kind}/identity" class="gate-form">
                <label for="email">Work email</label>
                <input type="email" id="email" name="email" placeholder="you@fund.com" autofocus required>
                <label for="role">I am a&hellip;</label>
                <select id="role" name="role">{options}</select>
                <button type="submit">View {kind}</button>
            </form>
        </div>"#,
        heading = panel_heading(startup, kind),
        id = startup.id,
        kind = kind,
        error_html = error_html,
        options = options,
    );
    base_html(&startup.name, &content, logged_in)
}

/// Password prompt shown after identity capture on locked items.
pub fn render_password_form(
    startup: &Startup,
    kind: ContentKind,
    error: Option<&str>,
    notice: Option<&str>,
    logged_in: bool,
) -> String {
    let error_html = error.map(error_box).unwrap_or_default();
    let notice_html = notice.map(notice_box).unwrap_or_default();

    let content = format!(
        r#"{heading}
        <div class="panel">
            {notice_html}
            {error_html}
            <p>This {kind} is password protected.</p>
            <form method="POST" action="/s/{id}/{kind}/password" class="gate-form">
                <label for="password">Password</label>
                <input type="password" id="password" name="password" autofocus required>
                <button type="submit">Unlock</button>
            </form>
        </div>"#,
        heading = panel_heading(startup, kind),
        id = startup.id,
        kind = kind,
        notice_html = notice_html,
        error_html = error_html,
    );
    base_html(&startup.name, &content, logged_in)
}

/// The unlocked panel: an iframe for resolvable embeds, a native video
/// element for unresolvable demo links.
pub fn render_unlocked(
    startup: &Startup,
    kind: ContentKind,
    item: &ContentItem,
    notice: Option<&str>,
    logged_in: bool,
) -> String {
    let notice_html = notice.map(notice_box).unwrap_or_default();

    let media = match kind {
        ContentKind::Deck => {
            let src = crate::embed::resolve_deck_embed(&item.asset_url);
            format!(
                r#"<iframe src="{}" allowfullscreen loading="lazy"></iframe>"#,
                html_escape(&src)
            )
        }
        ContentKind::Demo => match crate::embed::resolve_demo_embed(&item.asset_url) {
            Some(src) => format!(
                r#"<iframe src="{}" allowfullscreen loading="lazy"></iframe>"#,
                html_escape(&src)
            ),
            None => format!(
                r#"<video controls src="{}"></video>"#,
                html_escape(&item.asset_url)
            ),
        },
    };

    let content = format!(
        r#"{heading}
        <div class="panel">
            {notice_html}
            {media}
        </div>"#,
        heading = panel_heading(startup, kind),
        notice_html = notice_html,
        media = media,
    );
    base_html(&startup.name, &content, logged_in)
}

// ============================================================================
// Dashboard Fragments
// ============================================================================

/// Owner-side edit form for one content item. The saved password is shown
/// back in clear; owners expect to read it out to investors.
pub fn render_content_form(startup: &Startup, kind: ContentKind, view_count: usize) -> String {
    let item = startup.content(kind);
    let published = if item.is_published { "checked" } else { "" };
    let locked = if item.is_locked { "checked" } else { "" };
    let label = match kind {
        ContentKind::Deck => "Pitch deck",
        ContentKind::Demo => "Product demo",
    };

    format!(
        r#"<div class="panel">
            <h2>{label}</h2>
            <form method="POST" action="/api/startup/{id}/content/{kind}" class="dash-form">
                <label for="{kind}-url">Link</label>
                <input type="url" id="{kind}-url" name="asset_url" value="{url}"
                       placeholder="https://drive.google.com/file/d/...">
                <label class="check"><input type="checkbox" name="is_published" value="true" {published}> Published</label>
                <label class="check"><input type="checkbox" name="is_locked" value="true" {locked}> Password protected</label>
                <label for="{kind}-password">Password</label>
                <input type="text" id="{kind}-password" name="password" value="{password}"
                       placeholder="required when protected">
                <button type="submit">Save {kind}</button>
            </form>
            <p><a href="/dashboard/{id}/views/{kind}">{count} recorded views</a>
               &middot; <a href="/s/{id}/{kind}">public panel</a></p>
        </div>"#,
        label = label,
        id = startup.id,
        kind = kind,
        url = html_escape(&item.asset_url),
        published = published,
        locked = locked,
        password = html_escape(item.password_str()),
        count = view_count,
    )
}

pub fn render_views_table(events: &[ViewEvent]) -> String {
    if events.is_empty() {
        return "<p>No views recorded yet.</p>".to_string();
    }

    let mut rows = String::new();
    // Newest first for the readout.
    for event in events.iter().rev() {
        rows.push_str(&format!(
            r#"<tr>
                <td>{}</td>
                <td>{}</td>
                <td><code>{}</code></td>
                <td>{}</td>
            </tr>"#,
            html_escape(&event.email_address),
            event.viewer_title.label(),
            html_escape(&event.ip_address),
            event.timestamp.format("%Y-%m-%d %H:%M"),
        ));
    }

    format!(
        r#"<table class="views-table">
            <tr><th>Email</th><th>Role</th><th>IP</th><th>When</th></tr>
            {rows}
        </table>"#
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn sample_startup() -> Startup {
        Startup {
            id: "acme".to_string(),
            name: "Acme <Anvils>".to_string(),
            tagline: "Heavy things".to_string(),
            website: "https://acme.example".to_string(),
            founder_email: "f@acme.example".to_string(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
            deck: ContentItem {
                asset_url: "https://drive.google.com/file/d/XYZ/view".to_string(),
                is_published: true,
                is_locked: false,
                password: None,
            },
            demo: ContentItem::default(),
        }
    }

    #[test]
    fn test_html_escape() {
        assert_eq!(
            html_escape(r#"<b a="x">&'"#),
            "&lt;b a=&quot;x&quot;&gt;&amp;&#39;"
        );
    }

    #[test]
    fn test_base_html_escapes_title() {
        let html = base_html("<script>", "content", false);
        assert!(html.contains("&lt;script&gt;"));
        assert!(!html.contains("<script> - deckgate"));
    }

    #[test]
    fn test_identity_form_lists_all_roles() {
        let html = render_identity_form(&sample_startup(), ContentKind::Deck, None, false);
        for role in ViewerRole::ALL {
            assert!(html.contains(&format!(r#"value="{}""#, role)));
        }
        assert!(html.contains("/s/acme/deck/identity"));
    }

    #[test]
    fn test_identity_form_shows_error() {
        let html = render_identity_form(
            &sample_startup(),
            ContentKind::Deck,
            Some("Please enter your email address"),
            false,
        );
        assert!(html.contains("message error"));
        assert!(html.contains("Please enter your email address"));
    }

    #[test]
    fn test_unlocked_deck_uses_resolved_embed() {
        let html = render_unlocked(
            &sample_startup(),
            ContentKind::Deck,
            &sample_startup().deck,
            None,
            false,
        );
        assert!(html.contains("drive.google.com/file/d/XYZ/preview"));
        assert!(html.contains("<iframe"));
    }

    #[test]
    fn test_unlocked_demo_falls_back_to_native_video() {
        let startup = sample_startup();
        let item = ContentItem {
            asset_url: "https://cdn.example.com/demo.mp4".to_string(),
            is_published: true,
            is_locked: false,
            password: None,
        };
        let html = render_unlocked(&startup, ContentKind::Demo, &item, None, false);
        assert!(html.contains("<video controls"));
        assert!(html.contains("https://cdn.example.com/demo.mp4"));
    }

    #[test]
    fn test_views_table_newest_first() {
        let old = ViewEvent {
            email_address: "old@x.com".to_string(),
            viewer_title: ViewerRole::Investor,
            ip_address: String::new(),
            timestamp: "2026-01-01T00:00:00Z".parse().unwrap(),
        };
        let new = ViewEvent {
            email_address: "new@x.com".to_string(),
            viewer_title: ViewerRole::Founder,
            ip_address: "203.0.113.9".to_string(),
            timestamp: "2026-02-01T00:00:00Z".parse().unwrap(),
        };
        let html = render_views_table(&[old, new]);
        let new_pos = html.find("new@x.com").unwrap();
        let old_pos = html.find("old@x.com").unwrap();
        assert!(new_pos < old_pos);
    }

    #[test]
    fn test_views_table_empty() {
        assert!(render_views_table(&[]).contains("No views recorded"));
    }

    #[test]
    fn test_content_form_shows_saved_password() {
        let mut startup = sample_startup();
        startup.deck.is_locked = true;
        startup.deck.password = Some("hunter2".to_string());
        let html = render_content_form(&startup, ContentKind::Deck, 3);
        assert!(html.contains(r#"value="hunter2""#));
        assert!(html.contains("3 recorded views"));
    }
}
