//! Item metadata shared by every listing and lookup response

use serde::{Deserialize, Serialize};

/// Kind of entry in the storage hierarchy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemType {
    Root,
    Folder,
    File,
}

impl ItemType {
    /// Roots and folders can hold children
    #[must_use]
    pub fn is_container(self) -> bool {
        matches!(self, Self::Root | Self::Folder)
    }
}

/// Metadata for a single root, folder or file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Item {
    pub item_id: String,
    /// Empty for roots
    #[serde(default)]
    pub parent_id: String,
    pub name: String,
    pub etag: String,
    pub item_type: ItemType,
    /// MIME type, files only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
    /// Content length in bytes, files only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    /// RFC 3339 creation timestamp
    pub created_at: String,
    /// RFC 3339 timestamp of the last content or metadata change
    pub modified_at: String,
}

impl Item {
    #[must_use]
    pub fn is_file(&self) -> bool {
        self.item_type == ItemType::File
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn folder() -> Item {
        Item {
            item_id: "f1".to_string(),
            parent_id: "root".to_string(),
            name: "Documents".to_string(),
            etag: "0123456789abcdef".to_string(),
            item_type: ItemType::Folder,
            content_type: None,
            size: None,
            created_at: "2026-01-01T00:00:00Z".to_string(),
            modified_at: "2026-01-01T00:00:00Z".to_string(),
        }
    }

    #[test]
    fn test_item_type_serializes_snake_case() {
        let json = serde_json::to_string(&ItemType::Root).unwrap();
        assert_eq!(json, "\"root\"");
    }

    #[test]
    fn test_folder_omits_file_fields() {
        let json = serde_json::to_string(&folder()).unwrap();
        assert!(json.contains("\"item_type\":\"folder\""));
        assert!(!json.contains("content_type"));
        assert!(!json.contains("size"));
    }

    #[test]
    fn test_is_container() {
        assert!(ItemType::Root.is_container());
        assert!(ItemType::Folder.is_container());
        assert!(!ItemType::File.is_container());
        assert!(!folder().is_file());
    }
}
