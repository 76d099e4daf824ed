//! Handshake message handler

use std::io;

use tokio::io::AsyncWrite;
use tracing::debug;

use storage_common::protocol::ServerMessage;
use storage_common::validators::{self, VersionError};
use storage_common::version::{is_compatible, protocol_version};

use super::{
    HandlerContext, err_handshake_already_completed, err_version_empty,
    err_version_incompatible, err_version_invalid_semver, err_version_too_long,
};

/// Handle a handshake request
///
/// Incompatible or malformed versions are answered and then the connection
/// is closed.
pub async fn handle_handshake<W>(
    version: String,
    handshake_complete: &mut bool,
    ctx: &mut HandlerContext<'_, W>,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    if *handshake_complete {
        return ctx
            .send_error_and_disconnect(&err_handshake_already_completed(), Some("Handshake"))
            .await;
    }

    let server_version = protocol_version().to_string();

    let client_version = match validators::validate_version(&version) {
        Ok(v) => v,
        Err(e) => {
            let error = match e {
                VersionError::Empty => err_version_empty(),
                VersionError::TooLong => err_version_too_long(validators::MAX_VERSION_LENGTH),
                VersionError::Invalid => err_version_invalid_semver(),
            };
            return reject(ctx, server_version, error).await;
        }
    };

    if !is_compatible(&client_version) {
        debug!(
            target: "storaged::conn",
            "{} offered incompatible version {}",
            ctx.peer_addr,
            client_version
        );
        let error = err_version_incompatible(&server_version, &client_version.to_string());
        return reject(ctx, server_version, error).await;
    }

    *handshake_complete = true;
    let response = ServerMessage::HandshakeResponse {
        success: true,
        version: Some(server_version),
        error: None,
    };
    ctx.send_message(&response).await
}

async fn reject<W>(
    ctx: &mut HandlerContext<'_, W>,
    server_version: String,
    error: String,
) -> io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let response = ServerMessage::HandshakeResponse {
        success: false,
        version: Some(server_version),
        error: Some(error.clone()),
    };
    ctx.send_message(&response).await?;
    Err(io::Error::other(error))
}
