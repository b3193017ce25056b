//! HTTP route handlers.
//!
//! Public pages (directory, startup listings, gate panels) live alongside the
//! owner dashboard. All gate failures are rendered back into the page as
//! inline notices; nothing here propagates past the handler.

use crate::asset_url::validate_asset_url;
use crate::auth::{create_session, is_logged_in, SESSION_COOKIE, SESSION_TTL_HOURS};
use crate::gate::{self, GateError, GateState};
use crate::history::{self, SledViewSink};
use crate::models::{
    ContentItem, ContentKind, ContentUpdateForm, IdentityForm, NewStartupForm, PasswordForm,
    Startup,
};
use crate::templates::{
    base_html, error_box, html_escape, render_content_form, render_identity_form,
    render_password_form, render_unlocked, render_unpublished, render_views_table,
};
use crate::{ip, store, AppState};
use axum::{
    extract::{ConnectInfo, Form, Path, Query, State},
    http::{header::SET_COOKIE, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use chrono::Utc;
use serde::Deserialize;
use std::net::SocketAddr;
use std::sync::Arc;
use subtle::ConstantTimeEq;

// ============================================================================
// Shared Helpers
// ============================================================================

fn not_found(what: &str) -> Response {
    (StatusCode::NOT_FOUND, format!("{} not found", what)).into_response()
}

fn load_startup_or_404(state: &AppState, id: &str) -> Result<Startup, Response> {
    store::load_startup(&state.db, id).ok_or_else(|| not_found("Startup"))
}

fn parse_kind_or_404(kind: &str) -> Result<ContentKind, Response> {
    ContentKind::parse(kind).ok_or_else(|| not_found("Content"))
}

async fn resolve_viewer_ip(state: &AppState, headers: &HeaderMap, peer: SocketAddr) -> String {
    ip::viewer_ip(headers, peer, &state.http, &state.ip_echo_url).await
}

// ============================================================================
// Directory Pages
// ============================================================================

pub async fn index(State(state): State<Arc<AppState>>, jar: CookieJar) -> Html<String> {
    let logged_in = is_logged_in(&jar);
    let startups = store::list_startups(&state.db);

    let mut list_html = String::from("<h1>Startup directory</h1><ul class=\"startup-list\">");
    let mut shown = 0;
    for startup in &startups {
        // Only listings with at least one published asset appear publicly.
        if !startup.deck.is_published && !startup.demo.is_published {
            continue;
        }
        shown += 1;
        list_html.push_str(&format!(
            r#"<li class="startup-item">
                <span><a href="/s/{id}">{name}</a></span>
                <span class="tagline">{tagline}</span>
            </li>"#,
            id = startup.id,
            name = html_escape(&startup.name),
            tagline = html_escape(&startup.tagline),
        ));
    }
    list_html.push_str("</ul>");
    if shown == 0 {
        list_html.push_str("<p>Nothing published yet.</p>");
    }

    Html(base_html("Directory", &list_html, logged_in))
}

/// GET /s/{id} - Public startup page with links to its gated panels.
pub async fn startup_page(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Response {
    let logged_in = is_logged_in(&jar);
    let startup = match load_startup_or_404(&state, &id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let mut content = format!(
        r#"<h1>{name}</h1>
        <p>{tagline}</p>
        <p><a href="{website}">{website}</a></p>"#,
        name = html_escape(&startup.name),
        tagline = html_escape(&startup.tagline),
        website = html_escape(&startup.website),
    );

    for kind in [ContentKind::Deck, ContentKind::Demo] {
        let label = match kind {
            ContentKind::Deck => "Pitch deck",
            ContentKind::Demo => "Product demo",
        };
        if startup.content(kind).is_published {
            content.push_str(&format!(
                r#"<p><a href="/s/{}/{}">{} &rarr;</a></p>"#,
                startup.id, kind, label
            ));
        }
    }

    Html(base_html(&startup.name, &content, logged_in)).into_response()
}

// ============================================================================
// Gate Panels
// ============================================================================

#[derive(Deserialize)]
pub struct PanelQuery {
    pub notice: Option<String>,
}

fn panel_notice(query: &PanelQuery) -> Option<&'static str> {
    match query.notice.as_deref() {
        Some("unrecorded") => Some("Unlocked, but we could not record your view."),
        _ => None,
    }
}

/// GET /s/{id}/{kind} - The gate panel. State is re-derived from the grant
/// cache on every open; nothing durable marks a panel unlocked.
pub async fn panel(
    Path((id, kind)): Path<(String, String)>,
    Query(query): Query<PanelQuery>,
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    jar: CookieJar,
) -> Response {
    let logged_in = is_logged_in(&jar);
    let startup = match load_startup_or_404(&state, &id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let kind = match parse_kind_or_404(&kind) {
        Ok(k) => k,
        Err(resp) => return resp,
    };

    let viewer = resolve_viewer_ip(&state, &headers, peer).await;
    let content_id = startup.content_id(kind);
    let item = startup.content(kind);
    let cache = state.grant_cache();
    let notice = panel_notice(&query);

    let html = match gate::evaluate(item, &content_id, &viewer, &cache, Utc::now()) {
        GateState::Unpublished => render_unpublished(&startup, kind, logged_in),
        GateState::NeedsIdentity => render_identity_form(&startup, kind, None, logged_in),
        GateState::NeedsPassword => render_password_form(&startup, kind, None, notice, logged_in),
        GateState::Unlocked => render_unlocked(&startup, kind, item, notice, logged_in),
    };
    Html(html).into_response()
}

/// POST /s/{id}/{kind}/identity - The identity gate.
pub async fn identity_submit(
    Path((id, kind)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    jar: CookieJar,
    Form(form): Form<IdentityForm>,
) -> Response {
    let logged_in = is_logged_in(&jar);
    let startup = match load_startup_or_404(&state, &id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let kind = match parse_kind_or_404(&kind) {
        Ok(k) => k,
        Err(resp) => return resp,
    };

    let viewer = resolve_viewer_ip(&state, &headers, peer).await;
    let content_id = startup.content_id(kind);
    let item = startup.content(kind);
    let cache = state.grant_cache();
    let sink = SledViewSink { db: &state.db };

    match gate::submit_identity(
        item, &content_id, &viewer, &form.email, &form.role, &cache, &sink, Utc::now(),
    ) {
        Ok(outcome) if outcome.view_recorded => {
            Redirect::to(&format!("/s/{}/{}", startup.id, kind)).into_response()
        }
        Ok(_) => {
            Redirect::to(&format!("/s/{}/{}?notice=unrecorded", startup.id, kind)).into_response()
        }
        Err(GateError::Unpublished) => {
            Html(render_unpublished(&startup, kind, logged_in)).into_response()
        }
        Err(err) => {
            Html(render_identity_form(&startup, kind, Some(&err.to_string()), logged_in))
                .into_response()
        }
    }
}

/// POST /s/{id}/{kind}/password - The password gate. Wrong guesses re-render
/// the prompt; there is no attempt limit here.
pub async fn password_submit(
    Path((id, kind)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    jar: CookieJar,
    Form(form): Form<PasswordForm>,
) -> Response {
    let logged_in = is_logged_in(&jar);
    let startup = match load_startup_or_404(&state, &id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let kind = match parse_kind_or_404(&kind) {
        Ok(k) => k,
        Err(resp) => return resp,
    };

    let viewer = resolve_viewer_ip(&state, &headers, peer).await;
    let content_id = startup.content_id(kind);
    let item = startup.content(kind);
    let cache = state.grant_cache();

    match gate::submit_password(item, &content_id, &viewer, &form.password, &cache, Utc::now()) {
        Ok(_) => Redirect::to(&format!("/s/{}/{}", startup.id, kind)).into_response(),
        Err(GateError::Unpublished) => {
            Html(render_unpublished(&startup, kind, logged_in)).into_response()
        }
        // The identity step was skipped or went stale; the panel shows it.
        Err(GateError::IdentityRequired) => {
            Redirect::to(&format!("/s/{}/{}", startup.id, kind)).into_response()
        }
        Err(err) => {
            Html(render_password_form(&startup, kind, Some(&err.to_string()), None, logged_in))
                .into_response()
        }
    }
}

// ============================================================================
// Authentication Handlers
// ============================================================================

pub async fn login_page(jar: CookieJar) -> Response {
    if is_logged_in(&jar) {
        return Redirect::to("/dashboard").into_response();
    }

    let html = r#"
        <div class="gate-form">
            <h1>Owner login</h1>
            <form method="POST" action="/login">
                <input type="password" name="password" placeholder="Password" autofocus required>
                <button type="submit">Login</button>
            </form>
        </div>
    "#;

    Html(base_html("Login", html, false)).into_response()
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub password: String,
}

pub async fn login_submit(
    State(state): State<Arc<AppState>>,
    Form(form): Form<LoginForm>,
) -> Response {
    if !crate::auth::is_auth_enabled() {
        let html = error_box("Authentication not configured. Set DECKGATE_PASSWORD.");
        return Html(base_html("Error", &html, false)).into_response();
    }

    {
        let limit = state.login_rate_limit.lock().unwrap();
        if limit.is_locked() {
            let html = error_box("Too many failed attempts. Try again shortly.");
            return Html(base_html("Login", &html, false)).into_response();
        }
    }

    let password = std::env::var("DECKGATE_PASSWORD").unwrap_or_default();
    let input_bytes = form.password.as_bytes();
    let expected_bytes = password.as_bytes();
    let password_matches = input_bytes.len() == expected_bytes.len()
        && input_bytes.ct_eq(expected_bytes).unwrap_u8() == 1;
    if !password_matches {
        state.login_rate_limit.lock().unwrap().record_failure();
        let html = format!(
            r#"<div class="gate-form">
                {error}
                <h1>Owner login</h1>
                <form method="POST" action="/login">
                    <input type="password" name="password" placeholder="Password" autofocus required>
                    <button type="submit">Login</button>
                </form>
            </div>"#,
            error = error_box("Invalid password."),
        );
        return Html(base_html("Login", &html, false)).into_response();
    }

    state.login_rate_limit.lock().unwrap().reset();

    let session_token = match create_session() {
        Some(t) => t,
        None => {
            let html = error_box("Failed to create session.");
            return Html(base_html("Error", &html, false)).into_response();
        }
    };

    let cookie = format!(
        "{}={}; Path=/; HttpOnly; Secure; SameSite=Strict; Max-Age={}",
        SESSION_COOKIE,
        session_token,
        SESSION_TTL_HOURS * 3600
    );

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie.parse().unwrap());

    (headers, Redirect::to("/dashboard")).into_response()
}

pub async fn logout() -> Response {
    let cookie = format!("{}=; Path=/; HttpOnly; Secure; Max-Age=0", SESSION_COOKIE);

    let mut headers = HeaderMap::new();
    headers.insert(SET_COOKIE, cookie.parse().unwrap());

    (headers, Redirect::to("/")).into_response()
}

// ============================================================================
// Owner Dashboard
// ============================================================================

pub async fn dashboard(State(state): State<Arc<AppState>>, jar: CookieJar) -> Response {
    if !is_logged_in(&jar) {
        return Redirect::to("/login").into_response();
    }

    let startups = store::list_startups(&state.db);
    let mut html = String::from(
        r#"<h1>Dashboard</h1><p><a href="/new">+ New listing</a></p><ul class="startup-list">"#,
    );
    for startup in &startups {
        let deck_views = history::view_count(&state.db, &startup.content_id(ContentKind::Deck));
        let demo_views = history::view_count(&state.db, &startup.content_id(ContentKind::Demo));
        html.push_str(&format!(
            r#"<li class="startup-item">
                <span><a href="/dashboard/{id}">{name}</a></span>
                <span class="tagline">{deck_views} deck views &middot; {demo_views} demo views</span>
            </li>"#,
            id = startup.id,
            name = html_escape(&startup.name),
        ));
    }
    html.push_str("</ul>");

    Html(base_html("Dashboard", &html, true)).into_response()
}

pub async fn new_startup_page(jar: CookieJar) -> Response {
    if !is_logged_in(&jar) {
        return Redirect::to("/login").into_response();
    }

    let html = r#"
        <h1>New listing</h1>
        <form method="POST" action="/new" class="dash-form">
            <label for="name">Name</label>
            <input type="text" id="name" name="name" required autofocus>
            <label for="tagline">Tagline</label>
            <input type="text" id="tagline" name="tagline">
            <label for="website">Website</label>
            <input type="url" id="website" name="website" placeholder="https://">
            <label for="founder_email">Founder email</label>
            <input type="email" id="founder_email" name="founder_email">
            <button type="submit">Create</button>
        </form>
    "#;

    Html(base_html("New listing", html, true)).into_response()
}

pub async fn create_startup(
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<NewStartupForm>,
) -> Response {
    if !is_logged_in(&jar) {
        return Redirect::to("/login").into_response();
    }

    if form.name.trim().is_empty() {
        let html = error_box("Name is required.");
        return Html(base_html("New listing", &html, true)).into_response();
    }

    let startup = store::new_startup(
        &state.db,
        form.name.trim(),
        form.tagline.trim(),
        form.website.trim(),
        form.founder_email.trim(),
    );
    if let Err(err) = store::save_startup(&state.db, &startup) {
        tracing::error!(%err, "failed to save new startup");
        let html = error_box("Could not save the listing.");
        return Html(base_html("New listing", &html, true)).into_response();
    }

    Redirect::to(&format!("/dashboard/{}", startup.id)).into_response()
}

/// GET /dashboard/{id} - Edit page for one listing.
pub async fn edit_startup(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Response {
    if !is_logged_in(&jar) {
        return Redirect::to("/login").into_response();
    }
    let startup = match load_startup_or_404(&state, &id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };

    let deck_views = history::view_count(&state.db, &startup.content_id(ContentKind::Deck));
    let demo_views = history::view_count(&state.db, &startup.content_id(ContentKind::Demo));

    let html = format!(
        r#"<h1>{name}</h1>
        <p class="tagline">{tagline} &middot; <a href="/s/{id}">public page</a></p>
        {deck_form}
        {demo_form}
        <form method="POST" action="/api/startup/{id}/delete"
              onsubmit="return confirm('Delete this listing and its view history?')">
            <button type="submit" class="danger">Delete listing</button>
        </form>"#,
        name = html_escape(&startup.name),
        tagline = html_escape(&startup.tagline),
        id = startup.id,
        deck_form = render_content_form(&startup, ContentKind::Deck, deck_views),
        demo_form = render_content_form(&startup, ContentKind::Demo, demo_views),
    );

    Html(base_html(&startup.name, &html, true)).into_response()
}

/// Apply an owner's content update, enforcing the lock invariant: protection
/// cannot be enabled without a non-empty password.
pub fn apply_content_update(
    item: &ContentItem,
    form: &ContentUpdateForm,
) -> Result<ContentItem, String> {
    let asset_url = form.asset_url.trim().to_string();
    let password = form.password.trim().to_string();

    if form.is_locked && password.is_empty() {
        return Err("Set a password before enabling protection.".to_string());
    }
    if form.is_published && asset_url.is_empty() {
        return Err("Add a link before publishing.".to_string());
    }
    if !asset_url.is_empty() {
        if let Err(err) = validate_asset_url(&asset_url) {
            return Err(err.to_string());
        }
    }

    let mut updated = item.clone();
    updated.asset_url = asset_url;
    updated.is_published = form.is_published;
    updated.is_locked = form.is_locked;
    updated.password = if password.is_empty() { None } else { Some(password) };
    Ok(updated)
}

/// POST /api/startup/{id}/content/{kind} - Save one content item.
pub async fn update_content(
    Path((id, kind)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
    Form(form): Form<ContentUpdateForm>,
) -> Response {
    if !is_logged_in(&jar) {
        return Redirect::to("/login").into_response();
    }
    let mut startup = match load_startup_or_404(&state, &id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let kind = match parse_kind_or_404(&kind) {
        Ok(k) => k,
        Err(resp) => return resp,
    };

    let updated = match apply_content_update(startup.content(kind), &form) {
        Ok(item) => item,
        Err(msg) => {
            let html = error_box(&msg);
            return (
                StatusCode::UNPROCESSABLE_ENTITY,
                Html(base_html("Cannot save", &html, true)),
            )
                .into_response();
        }
    };

    *startup.content_mut(kind) = updated;
    startup.updated_at = Utc::now();
    if let Err(err) = store::save_startup(&state.db, &startup) {
        tracing::error!(%err, "failed to save content update");
        let html = error_box("Could not save changes.");
        return Html(base_html("Error", &html, true)).into_response();
    }

    Redirect::to(&format!("/dashboard/{}", startup.id)).into_response()
}

/// GET /dashboard/{id}/views/{kind} - Lead readout for one content item.
pub async fn views_page(
    Path((id, kind)): Path<(String, String)>,
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Response {
    if !is_logged_in(&jar) {
        return Redirect::to("/login").into_response();
    }
    let startup = match load_startup_or_404(&state, &id) {
        Ok(s) => s,
        Err(resp) => return resp,
    };
    let kind = match parse_kind_or_404(&kind) {
        Ok(k) => k,
        Err(resp) => return resp,
    };

    let events = history::list_views(&state.db, &startup.content_id(kind));
    let html = format!(
        r#"<h1>{name} — {kind} views</h1>
        <p><a href="/dashboard/{id}">&larr; back to listing</a></p>
        {table}"#,
        name = html_escape(&startup.name),
        kind = kind,
        id = startup.id,
        table = render_views_table(&events),
    );

    Html(base_html("Views", &html, true)).into_response()
}

/// POST /api/startup/{id}/delete - Remove a listing and its history.
pub async fn delete_startup(
    Path(id): Path<String>,
    State(state): State<Arc<AppState>>,
    jar: CookieJar,
) -> Response {
    if !is_logged_in(&jar) {
        return Redirect::to("/login").into_response();
    }
    if load_startup_or_404(&state, &id).is_err() {
        return not_found("Startup");
    }
    if let Err(err) = store::delete_startup(&state.db, &id) {
        tracing::error!(%err, "failed to delete startup");
        let html = error_box("Could not delete the listing.");
        return Html(base_html("Error", &html, true)).into_response();
    }
    Redirect::to("/dashboard").into_response()
}
