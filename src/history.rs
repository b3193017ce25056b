//! View attribution log.
//!
//! Every successful identity-gate pass appends one `ViewEvent` to the content
//! item's history. The log is additive: each event gets its own monotonically
//! increasing key in a per-content tree, so concurrent viewers append
//! independently and nothing is ever overwritten or truncated. There is no
//! server-side dedup; the same viewer appears again after a cache reset or
//! from another device.

use crate::models::ViewEvent;

fn views_tree(db: &sled::Db, content_id: &str) -> sled::Tree {
    db.open_tree(format!("views:{}", content_id))
        .expect("open views tree")
}

/// Append one event to the content item's history.
pub fn append_view(db: &sled::Db, content_id: &str, event: &ViewEvent) -> sled::Result<()> {
    let tree = views_tree(db, content_id);
    let seq = db.generate_id()?;
    let json = serde_json::to_vec(event).expect("serialize view event");
    tree.insert(seq.to_be_bytes(), json)?;
    Ok(())
}

/// All events for a content item, in append order.
pub fn list_views(db: &sled::Db, content_id: &str) -> Vec<ViewEvent> {
    let tree = views_tree(db, content_id);
    tree.iter()
        .filter_map(|entry| entry.ok())
        .filter_map(|(_, v)| serde_json::from_slice(&v).ok())
        .collect()
}

pub fn view_count(db: &sled::Db, content_id: &str) -> usize {
    views_tree(db, content_id).len()
}

/// Where the gate controller sends attribution records. Abstracted so the
/// controller can be exercised against a failing sink: an append failure must
/// never block content from unlocking.
pub trait ViewSink {
    fn append_view(&self, content_id: &str, event: &ViewEvent) -> sled::Result<()>;
}

pub struct SledViewSink<'a> {
    pub db: &'a sled::Db,
}

impl ViewSink for SledViewSink<'_> {
    fn append_view(&self, content_id: &str, event: &ViewEvent) -> sled::Result<()> {
        append_view(self.db, content_id, event)
    }
}
