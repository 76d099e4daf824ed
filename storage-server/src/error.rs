//! Provider error type
//!
//! Every operation in the store, session manager and facade reports one of
//! these. The variant decides the `error_kind` sent to clients; the message
//! becomes the human-readable `error`.

use std::io;

use storage_common::ErrorKind;
use thiserror::Error;

/// Result alias used throughout the server
pub type ProviderResult<T> = Result<T, ProviderError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProviderError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    InvalidArgument(String),
    #[error("{0}")]
    InvalidState(String),
    #[error("{0}")]
    PermissionDenied(String),
    #[error("{0}")]
    Internal(String),
}

impl ProviderError {
    /// Machine-readable kind for this error
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Conflict(_) => ErrorKind::Conflict,
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::InvalidState(_) => ErrorKind::InvalidState,
            Self::PermissionDenied(_) => ErrorKind::PermissionDenied,
            Self::Internal(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn item_not_found(item_id: &str) -> Self {
        Self::NotFound(format!("item '{item_id}' not found"))
    }

    pub(crate) fn not_a_folder(item_id: &str) -> Self {
        Self::NotFound(format!("'{item_id}' is not a folder"))
    }

    pub(crate) fn name_exists(name: &str) -> Self {
        Self::Conflict(format!("an item named '{name}' already exists"))
    }

    pub(crate) fn etag_mismatch(item_id: &str) -> Self {
        Self::Conflict(format!("etag of '{item_id}' does not match"))
    }

    pub(crate) fn unknown_session(session_id: &str) -> Self {
        Self::InvalidState(format!("no open session '{session_id}'"))
    }
}

impl From<io::Error> for ProviderError {
    fn from(err: io::Error) -> Self {
        Self::Internal(err.to_string())
    }
}
