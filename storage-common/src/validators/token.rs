//! Transfer token validation
//!
//! Validates the single-use tokens redeemed on the transfer port.

/// Expected length for transfer tokens (32 hex characters = 128 bits)
pub const TOKEN_HEX_LENGTH: usize = 32;

/// Validation error for transfer tokens
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenError {
    /// Token string has wrong length (must be exactly 32 characters)
    InvalidLength,
    /// Token string contains non-hexadecimal or uppercase characters
    InvalidCharacters,
}

/// Validate a transfer token string
///
/// Checks:
/// - Exactly 32 characters long (128 bits)
/// - Only lowercase hexadecimal characters (0-9, a-f)
pub fn validate_token(token: &str) -> Result<(), TokenError> {
    if token.len() != TOKEN_HEX_LENGTH {
        return Err(TokenError::InvalidLength);
    }

    for ch in token.chars() {
        if !ch.is_ascii_hexdigit() || ch.is_ascii_uppercase() {
            return Err(TokenError::InvalidCharacters);
        }
    }

    Ok(())
}
