//! Entity tag generation
//!
//! Etags are derived from the item id and a store-wide generation counter
//! that increases on every mutation, so a tag is never handed out twice.

use sha2::{Digest, Sha256};

use crate::constants::ETAG_HEX_LENGTH;

/// Etag for `item_id` at store generation `generation`
pub(crate) fn make_etag(item_id: &str, generation: u64) -> String {
    let mut hasher = Sha256::new();
    hasher.update(item_id.as_bytes());
    hasher.update(b":");
    hasher.update(generation.to_be_bytes());
    let mut tag = hex::encode(hasher.finalize());
    tag.truncate(ETAG_HEX_LENGTH);
    tag
}
