//! Message handlers for control-port requests

mod cancel_upload;
mod copy;
mod create_file;
mod create_folder;
mod delete;
mod download;
pub mod errors;
mod finish_download;
mod finish_upload;
mod handshake;
mod list;
mod lookup;
mod metadata;
mod move_item;
mod roots;
mod update;

#[cfg(test)]
pub mod testing;

pub use cancel_upload::handle_cancel_upload;
pub use copy::handle_copy;
pub use create_file::{CreateFileRequest, handle_create_file};
pub use create_folder::handle_create_folder;
pub use delete::handle_delete;
pub use download::handle_download;
pub use errors::*;
pub use finish_download::handle_finish_download;
pub use finish_upload::handle_finish_upload;
pub use handshake::handle_handshake;
pub use list::handle_list;
pub use lookup::handle_lookup;
pub use metadata::handle_metadata;
pub use move_item::handle_move;
pub use roots::handle_roots;
pub use update::handle_update;

use std::io;
use std::net::SocketAddr;

use tokio::io::AsyncWrite;

use storage_common::framing::{FrameWriter, MessageId};
use storage_common::io::send_server_message_with_id;
use storage_common::protocol::{ServerMessage, TransferEndpoint};

use crate::error::ProviderError;
use crate::provider::Provider;
use crate::sessions::{ByteStream, ClientId};
use crate::transfers::EndpointBroker;

/// Context passed to all handlers with shared resources
pub struct HandlerContext<'a, W> {
    pub writer: &'a mut FrameWriter<W>,
    pub peer_addr: SocketAddr,
    pub provider: &'a Provider,
    pub broker: &'a EndpointBroker,
    /// Owner recorded on every session this connection opens
    pub client_id: ClientId,
    /// Message ID from the incoming request (for response correlation)
    pub message_id: MessageId,
    /// Port advertised in transfer endpoints
    pub transfer_port: u16,
}

impl<'a, W: AsyncWrite + Unpin> HandlerContext<'a, W> {
    /// Send a message to the client, echoing the request's message ID
    pub async fn send_message(&mut self, message: &ServerMessage) -> io::Result<()> {
        send_server_message_with_id(self.writer, message, self.message_id).await
    }

    /// Send an error message without disconnecting
    pub async fn send_error(&mut self, message: &str, command: Option<&str>) -> io::Result<()> {
        let error_msg = ServerMessage::Error {
            message: message.to_string(),
            command: command.map(|s| s.to_string()),
        };
        self.send_message(&error_msg).await
    }

    /// Send an error message and disconnect
    pub async fn send_error_and_disconnect(
        &mut self,
        message: &str,
        command: Option<&str>,
    ) -> io::Result<()> {
        self.send_error(message, command).await?;
        Err(io::Error::other(message.to_string()))
    }

    /// Park a session's stream with the broker and describe where to claim it
    pub fn publish_endpoint(&self, session_id: &str, stream: ByteStream) -> TransferEndpoint {
        let token = self.broker.park(session_id, self.client_id, stream);
        TransferEndpoint {
            port: self.transfer_port,
            token,
        }
    }
}

/// `error` and `error_kind` fields for a failed response
pub fn error_fields(err: &ProviderError) -> (Option<String>, Option<String>) {
    (Some(err.to_string()), Some(err.kind().to_string()))
}
