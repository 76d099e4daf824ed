//! Protocol-level error messages
//!
//! Storage failures carry their own messages (see `ProviderError`); these
//! cover framing, handshake and transfer-port problems.

// ========================================================================
// Handshake Errors
// ========================================================================

pub fn err_handshake_already_completed() -> String {
    "Handshake already completed".to_string()
}

pub fn err_handshake_required() -> String {
    "Handshake required".to_string()
}

pub fn err_version_empty() -> String {
    "Version is empty".to_string()
}

pub fn err_version_too_long(max_length: usize) -> String {
    format!("Version exceeds {max_length} characters")
}

pub fn err_version_invalid_semver() -> String {
    "Version is not a valid semantic version".to_string()
}

pub fn err_version_incompatible(server_version: &str, client_version: &str) -> String {
    format!("Client version {client_version} is not compatible with server version {server_version}")
}

// ========================================================================
// Message Errors
// ========================================================================

pub fn err_invalid_message_format() -> String {
    "Invalid message format".to_string()
}

pub fn err_message_not_supported() -> String {
    "Message not supported on this port".to_string()
}

// ========================================================================
// Transfer Port Errors
// ========================================================================

pub fn err_expected_transfer_attach() -> String {
    "Expected TransferAttach".to_string()
}

pub fn err_transfer_token_invalid() -> String {
    "Transfer token is malformed".to_string()
}

pub fn err_transfer_token_unknown() -> String {
    "Transfer token is unknown or already used".to_string()
}
