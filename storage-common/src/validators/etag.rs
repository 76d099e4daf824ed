//! Entity tag validation
//!
//! Etags are opaque to clients. An empty etag is always accepted and means
//! "no precondition".

/// Maximum length for etags
pub const MAX_ETAG_LENGTH: usize = 64;

/// Validation error for etags
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EtagError {
    TooLong,
    InvalidCharacters,
}

pub fn validate_etag(etag: &str) -> Result<(), EtagError> {
    if etag.len() > MAX_ETAG_LENGTH {
        return Err(EtagError::TooLong);
    }
    if !etag.chars().all(|ch| ch.is_ascii_graphic()) {
        return Err(EtagError::InvalidCharacters);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_means_unconditional() {
        assert!(validate_etag("").is_ok());
    }

    #[test]
    fn test_hex_etag() {
        assert!(validate_etag("0123456789abcdef").is_ok());
    }

    #[test]
    fn test_invalid() {
        assert_eq!(
            validate_etag(&"a".repeat(MAX_ETAG_LENGTH + 1)),
            Err(EtagError::TooLong)
        );
        assert_eq!(validate_etag("ab cd"), Err(EtagError::InvalidCharacters));
    }
}
