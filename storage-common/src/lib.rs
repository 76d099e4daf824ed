//! Storage Common Library
//!
//! Shared types, wire framing, and validators for the storage provider
//! server and its clients.

mod error_kind;
pub mod framing;
pub mod io;
mod item;
pub mod protocol;
pub mod validators;
pub mod version;

pub use error_kind::{
    ERROR_KIND_CONFLICT, ERROR_KIND_INTERNAL, ERROR_KIND_INVALID_ARGUMENT,
    ERROR_KIND_INVALID_STATE, ERROR_KIND_NOT_FOUND, ERROR_KIND_PERMISSION_DENIED, ErrorKind,
};
pub use item::{Item, ItemType};

/// Version information for the storage provider protocol
pub const PROTOCOL_VERSION: &str = "0.1.0";

/// Default port for control-plane connections
pub const DEFAULT_PORT: u16 = 7600;

/// Default port for byte-stream transfer connections
pub const DEFAULT_TRANSFER_PORT: u16 = 7601;

/// Default number of children returned per `List` page
pub const DEFAULT_PAGE_SIZE: usize = 100;

/// Content type used when none is supplied and none can be inferred
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";
