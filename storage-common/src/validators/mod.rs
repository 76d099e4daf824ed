//! Input validation functions
//!
//! Shared between client and server: clients can pre-validate, the server
//! enforces. Each validator returns its own error enum so callers can map
//! failures to messages.

mod content_type;
mod etag;
mod item_id;
mod item_name;
mod page_token;
mod token;
mod version;

pub use content_type::{ContentTypeError, MAX_CONTENT_TYPE_LENGTH, validate_content_type};
pub use etag::{EtagError, MAX_ETAG_LENGTH, validate_etag};
pub use item_id::{ItemIdError, MAX_ITEM_ID_LENGTH, validate_item_id};
pub use item_name::{ItemNameError, MAX_ITEM_NAME_LENGTH, validate_item_name};
pub use page_token::{MAX_PAGE_TOKEN_LENGTH, PageTokenError, validate_page_token};
pub use token::{TOKEN_HEX_LENGTH, TokenError, validate_token};
pub use version::{MAX_VERSION_LENGTH, VersionError, validate_version};

/// Maximum length of error strings in responses
pub const MAX_ERROR_LENGTH: usize = 2048;
