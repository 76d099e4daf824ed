//! Page tokens for child listings
//!
//! Children are ordered by `(name, item_id)`. A token is the hex encoding
//! of the last key returned, and the next page starts strictly after it.
//! Because the cursor is a key rather than an offset, it stays usable even
//! if the item it names has since been deleted.

use crate::error::{ProviderError, ProviderResult};

/// Sort key of a child within its parent
pub(crate) type ChildKey = (String, String);

const SEPARATOR: u8 = 0;

pub(crate) fn encode_token(key: &ChildKey) -> String {
    let mut raw = Vec::with_capacity(key.0.len() + key.1.len() + 1);
    raw.extend_from_slice(key.0.as_bytes());
    raw.push(SEPARATOR);
    raw.extend_from_slice(key.1.as_bytes());
    hex::encode(raw)
}

/// Decode a token; the empty token means "from the start"
pub(crate) fn decode_token(token: &str) -> ProviderResult<Option<ChildKey>> {
    if token.is_empty() {
        return Ok(None);
    }

    let invalid = || ProviderError::InvalidArgument("invalid page token".to_string());
    let raw = hex::decode(token).map_err(|_| invalid())?;
    let split = raw
        .iter()
        .position(|b| *b == SEPARATOR)
        .ok_or_else(invalid)?;
    let name = String::from_utf8(raw[..split].to_vec()).map_err(|_| invalid())?;
    let id = String::from_utf8(raw[split + 1..].to_vec()).map_err(|_| invalid())?;
    if name.is_empty() || id.is_empty() {
        return Err(invalid());
    }
    Ok(Some((name, id)))
}
