//! Protocol definitions for the storage provider
//!
//! Control-plane messages are JSON payloads carried in frames (see
//! [`crate::framing`]). Every request gets exactly one `*Response` echoing
//! its message id. Failed responses carry `success: false`, a human-readable
//! `error`, and a machine-readable `error_kind` (see [`crate::ErrorKind`]).
//!
//! ## Byte-stream endpoints
//!
//! `CreateFile`, `Update` and `Download` answer with a session id and a
//! [`TransferEndpoint`]. The client opens a second connection to the
//! endpoint's port, sends `TransferAttach { token }`, waits for a successful
//! `TransferAttachResponse`, and from then on the connection carries raw
//! content bytes in one direction. For uploads the client shuts down its
//! write half when done and then calls `FinishUpload` on the control
//! connection. For downloads the server closes the stream after the last byte.

use serde::{Deserialize, Serialize};

use crate::item::Item;

/// Client request messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ClientMessage {
    /// Handshake, must be sent first
    Handshake { version: String },
    /// List the top-level roots
    Roots,
    /// List one page of a folder's children
    List {
        item_id: String,
        /// Empty for the first page
        #[serde(default)]
        page_token: String,
    },
    /// Find children of `parent_id` named `name`
    Lookup { parent_id: String, name: String },
    /// Fetch one item's metadata
    Metadata { item_id: String },
    /// Create an empty folder
    CreateFolder { parent_id: String, name: String },
    /// Begin uploading a new file
    CreateFile {
        parent_id: String,
        name: String,
        /// Empty to infer from content
        #[serde(default)]
        content_type: String,
        #[serde(default)]
        allow_overwrite: bool,
        /// Non-empty to require an existing sibling with this etag
        #[serde(default)]
        expected_etag: String,
    },
    /// Begin replacing an existing file's content
    Update {
        item_id: String,
        /// Empty for an unconditional update
        #[serde(default)]
        old_etag: String,
    },
    /// Discard an upload session (idempotent)
    CancelUpload { upload_id: String },
    /// Commit an upload session
    FinishUpload { upload_id: String },
    /// Begin downloading a file
    Download {
        item_id: String,
        /// Non-empty to require the current etag to match
        #[serde(default)]
        match_etag: String,
    },
    /// Settle a download session
    FinishDownload { download_id: String },
    /// Delete an item and everything beneath it
    Delete { item_id: String },
    /// Move and/or rename an item
    Move {
        item_id: String,
        new_parent_id: String,
        new_name: String,
    },
    /// Copy an item (recursively for folders)
    Copy {
        item_id: String,
        new_parent_id: String,
        new_name: String,
    },
    /// First and only frame on a transfer connection
    TransferAttach { token: String },
}

/// Where and how to open the byte stream for a session
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferEndpoint {
    /// Transfer port on the same host as the control connection
    pub port: u16,
    /// Single-use token redeemed with `TransferAttach`
    pub token: String,
}

/// Server response messages
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ServerMessage {
    /// Protocol-level error not tied to a specific request kind
    Error {
        message: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        command: Option<String>,
    },
    HandshakeResponse {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        version: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
    },
    RootsResponse {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_kind: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        items: Option<Vec<Item>>,
    },
    ListResponse {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_kind: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        items: Option<Vec<Item>>,
        /// Empty when there are no more pages
        #[serde(skip_serializing_if = "Option::is_none")]
        next_page_token: Option<String>,
    },
    LookupResponse {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_kind: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        items: Option<Vec<Item>>,
    },
    MetadataResponse {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_kind: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        item: Option<Item>,
    },
    CreateFolderResponse {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_kind: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        item: Option<Item>,
    },
    CreateFileResponse {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_kind: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        upload_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        endpoint: Option<TransferEndpoint>,
    },
    UpdateResponse {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_kind: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        upload_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        endpoint: Option<TransferEndpoint>,
    },
    /// Always `success: true` unless the request itself was malformed
    CancelUploadResponse {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_kind: Option<String>,
    },
    FinishUploadResponse {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_kind: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        item: Option<Item>,
    },
    DownloadResponse {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_kind: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        download_id: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        endpoint: Option<TransferEndpoint>,
    },
    FinishDownloadResponse {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_kind: Option<String>,
    },
    DeleteResponse {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_kind: Option<String>,
    },
    MoveResponse {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_kind: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        item: Option<Item>,
    },
    CopyResponse {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_kind: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        item: Option<Item>,
    },
    /// After a successful attach the connection switches to raw bytes
    TransferAttachResponse {
        success: bool,
        #[serde(skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        #[serde(skip_serializing_if = "Option::is_none")]
        error_kind: Option<String>,
        /// The upload or download id the token belonged to
        #[serde(skip_serializing_if = "Option::is_none")]
        session_id: Option<String>,
    },
}
