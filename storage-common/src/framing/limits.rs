//! Per-type payload limits for protocol messages

use std::collections::HashMap;
use std::sync::LazyLock;

/// Apply 20% padding to a limit for safety margin
const fn pad_limit(base: u64) -> u64 {
    (base * 6) / 5
}

/// Maximum payload sizes for each message type
///
/// Enforced after parsing the frame header but before reading the payload.
/// Base limits match the largest JSON a validated message can serialize to
/// (names counted at twice their byte limit to cover escaping), padded 20%.
///
/// A limit of `0` means "unlimited". Responses that carry item listings are
/// unlimited; the client has already chosen to trust the server.
static MESSAGE_TYPE_LIMITS: LazyLock<HashMap<&'static str, u64>> = LazyLock::new(|| {
    let mut m = HashMap::new();

    // Client messages
    m.insert("Handshake", pad_limit(64)); // version (32) + overhead
    m.insert("Roots", pad_limit(16)); // {"type":"Roots"}
    m.insert("List", pad_limit(940)); // item_id (128) + page_token (768) + overhead
    m.insert("Lookup", pad_limit(680)); // parent_id (128) + name (255, escaped) + overhead
    m.insert("Metadata", pad_limit(160)); // item_id (128) + overhead
    m.insert("CreateFolder", pad_limit(690)); // parent_id + name + overhead
    m.insert("CreateFile", pad_limit(1330)); // parent_id + name + content_type (escaped) + flag + etag
    m.insert("Update", pad_limit(236)); // item_id (128) + old_etag (64) + overhead
    m.insert("CancelUpload", pad_limit(166)); // upload_id (128) + overhead
    m.insert("FinishUpload", pad_limit(166)); // upload_id (128) + overhead
    m.insert("Download", pad_limit(240)); // item_id (128) + match_etag (64) + overhead
    m.insert("FinishDownload", pad_limit(170)); // download_id (128) + overhead
    m.insert("Delete", pad_limit(158)); // item_id (128) + overhead
    m.insert("Move", pad_limit(830)); // item_id + new_parent_id + new_name + overhead
    m.insert("Copy", pad_limit(830)); // item_id + new_parent_id + new_name + overhead
    m.insert("TransferAttach", pad_limit(68)); // token (32) + overhead

    // Server messages
    m.insert("HandshakeResponse", pad_limit(2150)); // error (2048) + version (32) + overhead
    m.insert("RootsResponse", 0);
    m.insert("ListResponse", 0);
    m.insert("LookupResponse", 0);
    m.insert("MetadataResponse", 0);
    m.insert("CreateFolderResponse", 0);
    m.insert("CreateFileResponse", pad_limit(2400)); // error + error_kind + upload_id + endpoint
    m.insert("UpdateResponse", pad_limit(2400));
    m.insert("CancelUploadResponse", pad_limit(2200)); // error (2048) + error_kind + overhead
    m.insert("FinishUploadResponse", 0);
    m.insert("DownloadResponse", pad_limit(2400));
    m.insert("FinishDownloadResponse", pad_limit(2200));
    m.insert("DeleteResponse", pad_limit(2200));
    m.insert("MoveResponse", 0);
    m.insert("CopyResponse", 0);
    m.insert("TransferAttachResponse", pad_limit(2400)); // error + error_kind + session id
    m.insert("Error", pad_limit(2200)); // message (2048) + command (64) + overhead

    m
});

/// Get the maximum payload size for a message type
///
/// Unknown types are rejected by the reader before this is called; they
/// report `0` here.
#[must_use]
pub fn max_payload_for_type(message_type: &str) -> u64 {
    MESSAGE_TYPE_LIMITS
        .get(message_type)
        .copied()
        .unwrap_or_default()
}

/// Check if a message type is known
#[must_use]
pub fn is_known_message_type(message_type: &str) -> bool {
    MESSAGE_TYPE_LIMITS.contains_key(message_type)
}

/// Get all known message type names
#[must_use]
pub fn known_message_types() -> Vec<&'static str> {
    MESSAGE_TYPE_LIMITS.keys().copied().collect()
}
