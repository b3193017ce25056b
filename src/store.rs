//! sled-backed persistence for startup listings.
//!
//! Startups are stored as JSON values in a single tree, keyed by their slug
//! id. View history lives in separate per-content trees (see `history`) so
//! that appends never rewrite the listing document.

use crate::models::Startup;
use chrono::Utc;
use rand::Rng;

fn startups_tree(db: &sled::Db) -> sled::Tree {
    db.open_tree("startups").expect("open startups tree")
}

pub fn save_startup(db: &sled::Db, startup: &Startup) -> sled::Result<()> {
    let tree = startups_tree(db);
    let json = serde_json::to_vec(startup).expect("serialize startup");
    tree.insert(startup.id.as_bytes(), json)?;
    Ok(())
}

pub fn load_startup(db: &sled::Db, id: &str) -> Option<Startup> {
    let tree = startups_tree(db);
    tree.get(id.as_bytes())
        .ok()
        .flatten()
        .and_then(|v| serde_json::from_slice(&v).ok())
}

/// All listings, newest first.
pub fn list_startups(db: &sled::Db) -> Vec<Startup> {
    let tree = startups_tree(db);
    let mut startups: Vec<Startup> = tree
        .iter()
        .filter_map(|entry| entry.ok())
        .filter_map(|(_, v)| serde_json::from_slice(&v).ok())
        .collect();
    startups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    startups
}

/// Owner-initiated removal of a listing and its view history.
pub fn delete_startup(db: &sled::Db, id: &str) -> sled::Result<()> {
    let tree = startups_tree(db);
    tree.remove(id.as_bytes())?;
    for kind in ["deck", "demo"] {
        db.drop_tree(format!("views:{}:{}", id, kind))?;
    }
    Ok(())
}

/// Create a fresh listing with both content items unpublished.
pub fn new_startup(
    db: &sled::Db,
    name: &str,
    tagline: &str,
    website: &str,
    founder_email: &str,
) -> Startup {
    let now = Utc::now();
    Startup {
        id: unique_id(db, name),
        name: name.to_string(),
        tagline: tagline.to_string(),
        website: website.to_string(),
        founder_email: founder_email.to_string(),
        created_at: now,
        updated_at: now,
        deck: Default::default(),
        demo: Default::default(),
    }
}

/// Lowercase the name, keep alphanumerics, collapse runs into single hyphens.
pub fn slugify(name: &str) -> String {
    let mut slug = String::new();
    let mut last_hyphen = true;
    for c in name.chars() {
        if c.is_ascii_alphanumeric() {
            slug.push(c.to_ascii_lowercase());
            last_hyphen = false;
        } else if !last_hyphen {
            slug.push('-');
            last_hyphen = true;
        }
    }
    while slug.ends_with('-') {
        slug.pop();
    }
    if slug.is_empty() {
        slug.push_str("startup");
    }
    slug
}

fn unique_id(db: &sled::Db, name: &str) -> String {
    let base = slugify(name);
    if load_startup(db, &base).is_none() {
        return base;
    }
    let suffix: [u8; 3] = rand::thread_rng().gen();
    let hex: String = suffix.iter().map(|b| format!("{:02x}", b)).collect();
    format!("{}-{}", base, hex)
}
