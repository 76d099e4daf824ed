//! Machine-readable error kinds for provider operations
//!
//! These error kinds are serialized to strings in protocol messages,
//! allowing clients to make decisions based on the error type
//! (e.g., re-reading metadata and retrying an `Update` after a conflict).

use std::fmt;

pub const ERROR_KIND_NOT_FOUND: &str = "not_found";
pub const ERROR_KIND_CONFLICT: &str = "conflict";
pub const ERROR_KIND_INVALID_ARGUMENT: &str = "invalid_argument";
pub const ERROR_KIND_INVALID_STATE: &str = "invalid_state";
pub const ERROR_KIND_PERMISSION_DENIED: &str = "permission_denied";
pub const ERROR_KIND_INTERNAL: &str = "internal";

/// Error kinds reported in every `*Response` with `success: false`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Unknown item id or name
    NotFound,

    /// Etag mismatch, duplicate sibling name, or a commit-time precondition failure
    ///
    /// Clients should re-read metadata before retrying.
    Conflict,

    /// Malformed input (empty ids, bad names, undecodable page tokens)
    InvalidArgument,

    /// Operation on a session that is not in the state it requires
    InvalidState,

    /// Operation not permitted on this item (e.g. deleting a root)
    PermissionDenied,

    /// Unexpected backing-store failure
    Internal,
}

impl ErrorKind {
    /// Convert to the string representation used in protocol messages
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NotFound => ERROR_KIND_NOT_FOUND,
            Self::Conflict => ERROR_KIND_CONFLICT,
            Self::InvalidArgument => ERROR_KIND_INVALID_ARGUMENT,
            Self::InvalidState => ERROR_KIND_INVALID_STATE,
            Self::PermissionDenied => ERROR_KIND_PERMISSION_DENIED,
            Self::Internal => ERROR_KIND_INTERNAL,
        }
    }

    /// Parse from string (for client-side handling)
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            ERROR_KIND_NOT_FOUND => Some(Self::NotFound),
            ERROR_KIND_CONFLICT => Some(Self::Conflict),
            ERROR_KIND_INVALID_ARGUMENT => Some(Self::InvalidArgument),
            ERROR_KIND_INVALID_STATE => Some(Self::InvalidState),
            ERROR_KIND_PERMISSION_DENIED => Some(Self::PermissionDenied),
            ERROR_KIND_INTERNAL => Some(Self::Internal),
            _ => None,
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<ErrorKind> for String {
    fn from(kind: ErrorKind) -> Self {
        kind.as_str().to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ErrorKind; 6] = [
        ErrorKind::NotFound,
        ErrorKind::Conflict,
        ErrorKind::InvalidArgument,
        ErrorKind::InvalidState,
        ErrorKind::PermissionDenied,
        ErrorKind::Internal,
    ];

    #[test]
    fn test_as_str() {
        assert_eq!(ErrorKind::NotFound.as_str(), "not_found");
        assert_eq!(ErrorKind::Conflict.as_str(), "conflict");
        assert_eq!(ErrorKind::InvalidState.as_str(), "invalid_state");
    }

    #[test]
    fn test_parse() {
        for kind in ALL {
            assert_eq!(ErrorKind::parse(kind.as_str()), Some(kind));
        }
        assert_eq!(ErrorKind::parse("exists"), None);
        assert_eq!(ErrorKind::parse(""), None);
    }

    #[test]
    fn test_display_and_into_string() {
        assert_eq!(format!("{}", ErrorKind::PermissionDenied), "permission_denied");
        let s: String = ErrorKind::Internal.into();
        assert_eq!(s, "internal");
    }
}
