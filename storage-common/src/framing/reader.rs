//! Frame reader for parsing protocol messages from a stream

use std::io;
use std::time::Duration;

use tokio::io::AsyncReadExt;
use tokio::time::timeout;

use super::error::FrameError;
use super::frame::RawFrame;
use super::limits::{is_known_message_type, max_payload_for_type};
use super::message_id::MessageId;
use super::{
    DELIMITER, MAGIC, MAX_PAYLOAD_LENGTH_DIGITS, MAX_TYPE_LENGTH, MAX_TYPE_LENGTH_DIGITS,
    MSG_ID_LENGTH, TERMINATOR,
};

/// Default timeout for completing a frame once the first byte is received
pub const DEFAULT_FRAME_TIMEOUT: Duration = Duration::from_secs(60);

/// Default idle timeout for transfer connections (waiting for the attach frame)
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(30);

/// Frame header information returned by `read_frame_header()`
#[derive(Debug, Clone)]
pub struct FrameHeader {
    /// The message type (e.g., "List", "CreateFileResponse")
    pub message_type: String,
    /// The message ID for request-response correlation
    pub message_id: MessageId,
    /// The payload length in bytes
    pub payload_length: u64,
}

/// Reads protocol frames from an async reader
pub struct FrameReader<R> {
    reader: R,
}

impl<R> FrameReader<R> {
    /// Create a new frame reader
    pub fn new(reader: R) -> Self {
        Self { reader }
    }

    /// Get a mutable reference to the underlying reader
    pub fn get_mut(&mut self) -> &mut R {
        &mut self.reader
    }

    /// Consume the frame reader and return the underlying reader
    ///
    /// Any bytes buffered by `R` past the last frame stay in `R`, which is
    /// what lets a transfer connection switch from framed to raw mode.
    pub fn into_inner(self) -> R {
        self.reader
    }
}

impl<R: AsyncReadExt + Unpin> FrameReader<R> {
    /// Read the next frame from the stream
    ///
    /// Returns `Ok(None)` if the connection is cleanly closed. Waits
    /// indefinitely; prefer [`read_frame_with_timeout`](Self::read_frame_with_timeout).
    pub async fn read_frame(&mut self) -> Result<Option<RawFrame>, FrameError> {
        let Some(first_byte) = self.read_byte_allow_eof().await? else {
            return Ok(None);
        };
        self.read_frame_after_first_byte(first_byte).await
    }

    /// Read the next frame, allowing an idle wait for the first byte
    ///
    /// Once the first byte arrives the rest of the frame must complete
    /// within `frame_timeout`.
    pub async fn read_frame_with_timeout(
        &mut self,
        frame_timeout: Duration,
    ) -> Result<Option<RawFrame>, FrameError> {
        let Some(first_byte) = self.read_byte_allow_eof().await? else {
            return Ok(None);
        };

        match timeout(frame_timeout, self.read_frame_after_first_byte(first_byte)).await {
            Ok(result) => result,
            Err(_) => Err(FrameError::FrameTimeout),
        }
    }

    /// Read the next frame with a timeout on the idle wait as well
    ///
    /// Used on the transfer port, where a connection that never sends its
    /// attach frame is dropped.
    pub async fn read_frame_with_full_timeout(
        &mut self,
        idle_timeout: Duration,
        frame_timeout: Duration,
    ) -> Result<Option<RawFrame>, FrameError> {
        let first_byte = match timeout(idle_timeout, self.read_byte_allow_eof()).await {
            Ok(Ok(Some(b))) => b,
            Ok(Ok(None)) => return Ok(None),
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(FrameError::IdleTimeout),
        };

        match timeout(frame_timeout, self.read_frame_after_first_byte(first_byte)).await {
            Ok(result) => result,
            Err(_) => Err(FrameError::FrameTimeout),
        }
    }

    /// Read just the frame header, leaving the payload unread
    pub async fn read_frame_header(&mut self) -> Result<Option<FrameHeader>, FrameError> {
        let Some(first_byte) = self.read_byte_allow_eof().await? else {
            return Ok(None);
        };
        self.read_frame_header_after_first_byte(first_byte)
            .await
            .map(Some)
    }

    /// Read the payload and terminator after `read_frame_header()`
    pub async fn read_payload_into_vec(
        &mut self,
        header: &FrameHeader,
    ) -> Result<Vec<u8>, FrameError> {
        let mut payload = vec![0u8; header.payload_length as usize];
        self.reader.read_exact(&mut payload).await?;

        if self.read_byte().await? != TERMINATOR {
            return Err(FrameError::MissingTerminator);
        }

        Ok(payload)
    }

    async fn read_frame_header_after_first_byte(
        &mut self,
        first_byte: u8,
    ) -> Result<FrameHeader, FrameError> {
        if first_byte != MAGIC[0] {
            return Err(FrameError::InvalidMagic);
        }
        let mut magic_rest = [0u8; 2];
        self.reader.read_exact(&mut magic_rest).await?;
        if magic_rest != MAGIC[1..] {
            return Err(FrameError::InvalidMagic);
        }

        let type_length = self
            .read_length_field(
                MAX_TYPE_LENGTH_DIGITS,
                FrameError::InvalidTypeLength,
                FrameError::TypeLengthTooManyDigits,
            )
            .await?;
        if type_length == 0 || type_length > MAX_TYPE_LENGTH as u64 {
            return Err(FrameError::TypeLengthOutOfRange);
        }

        let mut type_bytes = vec![0u8; type_length as usize];
        self.reader.read_exact(&mut type_bytes).await?;
        let message_type = String::from_utf8(type_bytes)
            .map_err(|_| FrameError::UnknownMessageType("<invalid utf8>".to_string()))?;

        // Reject unknown types before trusting the length field
        if !is_known_message_type(&message_type) {
            return Err(FrameError::UnknownMessageType(message_type));
        }

        if self.read_byte().await? != DELIMITER {
            return Err(FrameError::MissingDelimiter);
        }

        let mut msg_id_bytes = [0u8; MSG_ID_LENGTH];
        self.reader.read_exact(&mut msg_id_bytes).await?;
        let message_id = MessageId::from_bytes(&msg_id_bytes)?;

        if self.read_byte().await? != DELIMITER {
            return Err(FrameError::MissingDelimiter);
        }

        let payload_length = self
            .read_length_field(
                MAX_PAYLOAD_LENGTH_DIGITS,
                FrameError::InvalidPayloadLength,
                FrameError::PayloadLengthTooManyDigits,
            )
            .await?;
        // 0 = unlimited
        let max_for_type = max_payload_for_type(&message_type);
        if max_for_type > 0 && payload_length > max_for_type {
            return Err(FrameError::PayloadLengthExceedsTypeMax {
                message_type,
                length: payload_length,
                max: max_for_type,
            });
        }

        Ok(FrameHeader {
            message_type,
            message_id,
            payload_length,
        })
    }

    async fn read_frame_after_first_byte(
        &mut self,
        first_byte: u8,
    ) -> Result<Option<RawFrame>, FrameError> {
        let header = self.read_frame_header_after_first_byte(first_byte).await?;
        let payload = self.read_payload_into_vec(&header).await?;

        Ok(Some(RawFrame::new(
            header.message_id,
            header.message_type,
            payload,
        )))
    }

    /// Read a single byte, returning None on clean EOF
    async fn read_byte_allow_eof(&mut self) -> Result<Option<u8>, FrameError> {
        let mut buf = [0u8; 1];
        match self.reader.read_exact(&mut buf).await {
            Ok(_) => Ok(Some(buf[0])),
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    async fn read_byte(&mut self) -> Result<u8, FrameError> {
        let mut buf = [0u8; 1];
        self.reader.read_exact(&mut buf).await?;
        Ok(buf[0])
    }

    /// Read a length field (digits terminated by delimiter)
    async fn read_length_field(
        &mut self,
        max_digits: usize,
        invalid_err: FrameError,
        too_many_err: FrameError,
    ) -> Result<u64, FrameError> {
        let mut digits = Vec::with_capacity(max_digits);

        for _ in 0..=max_digits {
            let byte = self.read_byte().await?;

            if byte == DELIMITER {
                if digits.is_empty() {
                    return Err(invalid_err);
                }
                let s = std::str::from_utf8(&digits).map_err(|_| invalid_err.clone())?;
                return s.parse().map_err(|_| invalid_err.clone());
            }

            if !byte.is_ascii_digit() {
                return Err(invalid_err);
            }

            digits.push(byte);
        }

        Err(too_many_err)
    }
}
