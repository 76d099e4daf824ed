//! Wire framing for control-plane messages
//!
//! Every message travels as a single frame:
//!
//! ```text
//! SP|<type_len>|<type>|<msg_id>|<payload_len>|<payload>\n
//! ```
//!
//! `msg_id` is 12 lowercase hex characters; responses echo the id of the
//! request they answer. The payload is JSON. Payload length is checked
//! against a per-type limit before any payload bytes are read.

mod error;
mod frame;
pub mod limits;
mod message_id;
mod reader;
mod writer;

pub use error::FrameError;
pub use frame::RawFrame;
pub use message_id::MessageId;
pub use reader::{DEFAULT_FRAME_TIMEOUT, DEFAULT_IDLE_TIMEOUT, FrameHeader, FrameReader};
pub use writer::FrameWriter;

/// Frame magic prefix
pub const MAGIC: &[u8; 3] = b"SP|";

/// Field delimiter
pub const DELIMITER: u8 = b'|';

/// Frame terminator
pub const TERMINATOR: u8 = b'\n';

/// Length of a message id in hex characters
pub const MSG_ID_LENGTH: usize = 12;

/// Longest message type name accepted
pub const MAX_TYPE_LENGTH: usize = 64;

/// Digits allowed in the type length field
pub const MAX_TYPE_LENGTH_DIGITS: usize = 2;

/// Digits allowed in the payload length field
pub const MAX_PAYLOAD_LENGTH_DIGITS: usize = 20;
