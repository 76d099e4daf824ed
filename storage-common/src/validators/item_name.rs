//! Item name validation
//!
//! Validates folder and file names for create, move and copy.

/// Maximum length for item names in bytes
pub const MAX_ITEM_NAME_LENGTH: usize = 255;

/// Validation error for item names
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemNameError {
    /// Name is empty
    Empty,
    /// Name exceeds maximum length
    TooLong,
    /// Name is "." or ".."
    Reserved,
    /// Name contains a path separator (/ or \)
    ContainsPathSeparator,
    /// Name contains null bytes
    ContainsNull,
    /// Name contains other control characters
    InvalidCharacters,
}

/// Validate a name for a new or renamed item
///
/// Checks:
/// - Not empty, at most 255 bytes
/// - Not "." or ".."
/// - No path separators, null bytes or control characters
pub fn validate_item_name(name: &str) -> Result<(), ItemNameError> {
    if name.is_empty() {
        return Err(ItemNameError::Empty);
    }

    if name.len() > MAX_ITEM_NAME_LENGTH {
        return Err(ItemNameError::TooLong);
    }

    if name == "." || name == ".." {
        return Err(ItemNameError::Reserved);
    }

    for ch in name.chars() {
        if ch == '/' || ch == '\\' {
            return Err(ItemNameError::ContainsPathSeparator);
        }
        if ch == '\0' {
            return Err(ItemNameError::ContainsNull);
        }
        if ch.is_control() {
            return Err(ItemNameError::InvalidCharacters);
        }
    }

    Ok(())
}
