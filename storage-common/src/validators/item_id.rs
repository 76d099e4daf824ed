//! Item and session id validation

/// Maximum length for item, upload and download ids
pub const MAX_ITEM_ID_LENGTH: usize = 128;

/// Validation error for ids
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemIdError {
    /// Id is empty
    Empty,
    /// Id exceeds maximum length
    TooLong,
    /// Id contains whitespace or control characters
    InvalidCharacters,
}

/// Validate an opaque id
///
/// Ids are opaque to clients, but they are never empty, never longer than
/// 128 bytes, and contain only visible characters.
pub fn validate_item_id(id: &str) -> Result<(), ItemIdError> {
    if id.is_empty() {
        return Err(ItemIdError::Empty);
    }
    if id.len() > MAX_ITEM_ID_LENGTH {
        return Err(ItemIdError::TooLong);
    }
    if id.chars().any(|ch| ch.is_whitespace() || ch.is_control()) {
        return Err(ItemIdError::InvalidCharacters);
    }
    Ok(())
}
