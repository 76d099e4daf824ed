//! Storage Client Library
//!
//! Async client for the storage provider protocol: one method per control
//! request, plus [`open_transfer`] for claiming a session's byte stream on
//! the transfer port.

mod client;
mod error;
mod transfer;

pub use client::{DownloadTicket, StorageClient, UploadTicket};
pub use error::{ClientError, ClientResult};
pub use transfer::{TransferStream, open_transfer};

/// How long to wait for any single response
pub const RESPONSE_TIMEOUT: std::time::Duration = std::time::Duration::from_secs(60);
