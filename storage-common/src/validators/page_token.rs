//! Page token validation
//!
//! Only the shape is checked here: lowercase hex, even length, bounded.
//! Whether a token decodes to a usable cursor is the server's call.

use super::{MAX_ITEM_ID_LENGTH, MAX_ITEM_NAME_LENGTH};

/// Hex of `name`, a separator byte and `item_id`
pub const MAX_PAGE_TOKEN_LENGTH: usize = 2 * (MAX_ITEM_NAME_LENGTH + 1 + MAX_ITEM_ID_LENGTH);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageTokenError {
    TooLong,
    InvalidEncoding,
}

/// Validate a page token (empty means "first page")
pub fn validate_page_token(token: &str) -> Result<(), PageTokenError> {
    if token.len() > MAX_PAGE_TOKEN_LENGTH {
        return Err(PageTokenError::TooLong);
    }
    if token.len() % 2 != 0
        || !token
            .chars()
            .all(|ch| ch.is_ascii_digit() || ('a'..='f').contains(&ch))
    {
        return Err(PageTokenError::InvalidEncoding);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_is_first_page() {
        assert!(validate_page_token("").is_ok());
    }

    #[test]
    fn test_hex_token() {
        assert!(validate_page_token("610062").is_ok());
    }

    #[test]
    fn test_invalid() {
        assert_eq!(
            validate_page_token("abc"),
            Err(PageTokenError::InvalidEncoding)
        );
        assert_eq!(
            validate_page_token("zz"),
            Err(PageTokenError::InvalidEncoding)
        );
        assert_eq!(
            validate_page_token(&"a".repeat(MAX_PAGE_TOKEN_LENGTH + 2)),
            Err(PageTokenError::TooLong)
        );
    }
}
