//! Stored item records

use std::sync::Arc;

use chrono::{DateTime, SecondsFormat, Utc};
use storage_common::{Item, ItemType};

/// Immutable file content, shared between the store, download snapshots
/// and copies
pub type Content = Arc<[u8]>;

/// One item as the store keeps it
#[derive(Debug, Clone)]
pub(crate) struct ItemRecord {
    pub id: String,
    pub parent_id: String,
    pub name: String,
    pub etag: String,
    pub kind: ItemType,
    pub content_type: Option<String>,
    pub content: Content,
    pub created_at: DateTime<Utc>,
    pub modified_at: DateTime<Utc>,
}

impl ItemRecord {
    pub fn is_container(&self) -> bool {
        self.kind.is_container()
    }

    /// Wire representation
    pub fn to_item(&self) -> Item {
        let is_file = self.kind == ItemType::File;
        Item {
            item_id: self.id.clone(),
            parent_id: self.parent_id.clone(),
            name: self.name.clone(),
            etag: self.etag.clone(),
            item_type: self.kind,
            content_type: self.content_type.clone(),
            size: is_file.then_some(self.content.len() as u64),
            created_at: format_timestamp(&self.created_at),
            modified_at: format_timestamp(&self.modified_at),
        }
    }
}

fn format_timestamp(ts: &DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}
