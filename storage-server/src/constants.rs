//! Server-wide constants

use std::time::Duration;

/// Chunk size for pumping bytes between endpoints and staging buffers
pub const TRANSFER_CHUNK_SIZE: usize = 64 * 1024;

/// Capacity of the in-process pipe behind each session's byte stream
pub const BYTE_STREAM_CAPACITY: usize = 256 * 1024;

/// Default cap on a single upload (1 GiB)
pub const DEFAULT_MAX_UPLOAD_SIZE: u64 = 1024 * 1024 * 1024;

/// How long a transfer connection may sit before sending `TransferAttach`
pub const TRANSFER_ATTACH_TIMEOUT: Duration = Duration::from_secs(30);

/// Name of the root created when none is configured
pub const DEFAULT_ROOT_NAME: &str = "Home";

/// Length of generated etags in hex characters
pub const ETAG_HEX_LENGTH: usize = 16;

/// Control frames read ahead while a request is still being handled
pub const CONTROL_READ_AHEAD: usize = 8;
